use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::DocId;

pub const DEFAULT_TEXT_COLUMN: &str = "Tweet_Text";

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    /// CSV column holding the document text.
    pub text_column: String,
    /// Keep only the first `limit` documents.
    pub limit: Option<usize>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self { text_column: DEFAULT_TEXT_COLUMN.to_string(), limit: None }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDoc {
    Plain(String),
    Record {
        #[serde(alias = "body", alias = "tweet", alias = "Tweet_Text")]
        text: Option<String>,
    },
}

impl JsonDoc {
    fn into_text(self) -> Option<String> {
        match self {
            JsonDoc::Plain(s) => Some(s),
            JsonDoc::Record { text } => text,
        }
    }
}

/// Raw document texts in ingestion order. A document's id is its position.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    texts: Vec<String>,
}

impl Corpus {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { texts: texts.into_iter().map(Into::into).collect() }
    }

    /// Load from a `.csv`, `.json`, `.jsonl` or `.txt` file, or from a directory
    /// of such files visited in sorted path order.
    pub fn load<P: AsRef<Path>>(path: P, opts: &CorpusOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut files: Vec<PathBuf> = Vec::new();
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && supported_extension(p).is_some() {
                    files.push(p.to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            bail!("corpus path {} does not exist", path.display());
        }

        let mut texts = Vec::new();
        for file in &files {
            let ext = supported_extension(file)
                .ok_or_else(|| anyhow!("unsupported corpus file {}", file.display()))?;
            let before = texts.len();
            match ext {
                "csv" => read_csv(file, &opts.text_column, &mut texts)?,
                "jsonl" => read_jsonl(file, &mut texts)?,
                "json" => read_json(file, &mut texts)?,
                _ => read_lines(file, &mut texts)?,
            }
            tracing::debug!(file = %file.display(), docs = texts.len() - before, "read corpus file");
            if opts.limit.is_some_and(|l| texts.len() >= l) { break; }
        }
        if let Some(limit) = opts.limit {
            texts.truncate(limit);
        }
        tracing::info!(path = %path.display(), files = files.len(), num_docs = texts.len(), "corpus loaded");
        Ok(Self { texts })
    }

    pub fn len(&self) -> usize { self.texts.len() }
    pub fn is_empty(&self) -> bool { self.texts.is_empty() }
    pub fn texts(&self) -> &[String] { &self.texts }

    /// Raw text of a document.
    pub fn get(&self, doc_id: DocId) -> Option<&str> {
        self.texts.get(doc_id as usize).map(String::as_str)
    }
}

fn supported_extension(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => Some("csv"),
        Some("json") => Some("json"),
        Some("jsonl") => Some("jsonl"),
        Some("txt") => Some("txt"),
        _ => None,
    }
}

fn keep(text: String, texts: &mut Vec<String>) {
    if !text.trim().is_empty() {
        texts.push(text);
    }
}

fn read_csv(file: &Path, column: &str, texts: &mut Vec<String>) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(file)
        .with_context(|| format!("opening {}", file.display()))?;
    let headers = reader.headers().with_context(|| format!("reading header of {}", file.display()))?;
    let col = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| anyhow!("column {column:?} not found in {}", file.display()))?;
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{}: record {}", file.display(), line + 1))?;
        if let Some(text) = record.get(col) {
            keep(text.to_string(), texts);
        }
    }
    Ok(())
}

fn read_jsonl(file: &Path, texts: &mut Vec<String>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    for (n, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: JsonDoc = serde_json::from_str(&line).with_context(|| format!("{}: line {}", file.display(), n + 1))?;
        if let Some(text) = doc.into_text() {
            keep(text, texts);
        }
    }
    Ok(())
}

fn read_json(file: &Path, texts: &mut Vec<String>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", file.display()))?;
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        other => vec![other],
    };
    for v in values {
        let doc: JsonDoc = serde_json::from_value(v).with_context(|| format!("decoding document in {}", file.display()))?;
        if let Some(text) = doc.into_text() {
            keep(text, texts);
        }
    }
    Ok(())
}

fn read_lines(file: &Path, texts: &mut Vec<String>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    for line in BufReader::new(f).lines() {
        keep(line?, texts);
    }
    Ok(())
}
