use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this (in chars, before stemming) are dropped.
pub const MIN_TOKEN_CHARS: usize = 3;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"\b[a-z][a-z0-9+.\-]*://\S+|\bwww\.\S+").expect("valid regex");
    static ref MENTION_RE: Regex = Regex::new(r"@[\p{L}\p{N}_]+").expect("valid regex");
    // Hashtags go whole: marker and word.
    static ref HASHTAG_RE: Regex = Regex::new(r"#[\p{L}\p{N}_]+").expect("valid regex");
    static ref DIGITS_RE: Regex = Regex::new(r"\b\p{N}+\b").expect("valid regex");
    static ref APOSTROPHE_RE: Regex = Regex::new(r"['\u{2019}]").expect("valid regex");
    static ref PUNCT_RE: Regex = Regex::new(r"[^\p{L}\p{N}\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","also","am","amp","an","and","any","are","arent","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cant","cannot","could","couldnt",
            "did","didnt","do","does","doesnt","doing","dont","down","during",
            "each","few","for","from","further",
            "had","hadnt","has","hasnt","have","havent","having","he","hed","her","here","heres","hers","herself","him","himself","his","how","hows",
            "i","if","im","in","into","is","isnt","it","its","itself","ive",
            "just","lets","may","me","might","more","most","must","mustnt","my","myself",
            "no","nor","not","now","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","shall","she","shes","should","shouldnt","so","some","such",
            "than","that","thats","the","their","theirs","them","themselves","then","there","theres","these","they","theyd","theyll","theyre","theyve","this","those","through","to","too",
            "under","until","up","very","via",
            "was","wasnt","we","weve","were","werent","what","whats","when","whens","where","wheres","which","while","who","whos","whom","why","whys","will","with","wont","would","wouldnt",
            "you","youd","youll","youre","youve","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Normalize raw text into an ordered token sequence, duplicates kept.
///
/// Pipeline: NFKC + lowercase, strip URLs, @mentions, whole #hashtags and
/// standalone digit runs, delete apostrophes, turn remaining punctuation into
/// boundaries, split, drop short tokens and stop words, then stem.
/// Total over any input; an empty result is valid.
pub fn normalize(text: &str) -> Vec<String> {
    let folded = text.nfkc().collect::<String>().to_lowercase();
    let stripped = URL_RE.replace_all(&folded, " ");
    let stripped = MENTION_RE.replace_all(&stripped, " ");
    let stripped = HASHTAG_RE.replace_all(&stripped, " ");
    let stripped = DIGITS_RE.replace_all(&stripped, " ");
    let stripped = APOSTROPHE_RE.replace_all(&stripped, "");
    let stripped = PUNCT_RE.replace_all(&stripped, " ");

    let mut tokens = Vec::new();
    for word in stripped.split_whitespace() {
        if word.chars().count() < MIN_TOKEN_CHARS || is_stopword(word) { continue; }
        let lemma = STEMMER.stem(word);
        if lemma.trim().is_empty() || is_stopword(&lemma) { continue; }
        tokens.push(lemma.into_owned());
    }
    tokens
}

/// The normalized tokens joined by single spaces, for display next to a hit.
pub fn clean_text(text: &str) -> String {
    normalize(text).join(" ")
}
