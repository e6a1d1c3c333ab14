//! Reading documents from `.json` / `.jsonl` files.

use crate::error::BuildError;
use crate::RawDocument;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn is_corpus_file(p: &Path) -> bool {
    matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl"))
}

/// Corpus files under `input`: the file itself, or every `.json`/`.jsonl`
/// below a directory in path order.
pub fn corpus_files(input: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(BuildError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("corpus not found: {}", input.display()),
        )));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::Io(e.into()))?;
        let p = entry.path();
        if p.is_file() && is_corpus_file(p) {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

/// Read every document under `input`. Positions in errors count documents
/// across all files.
pub fn read_corpus(input: &Path) -> Result<Vec<RawDocument>, BuildError> {
    let mut docs = Vec::new();
    for file in corpus_files(input)? {
        if file.extension().and_then(|s| s.to_str()) == Some("json") {
            read_json(&file, &mut docs)?;
        } else {
            read_jsonl(&file, &mut docs)?;
        }
    }
    tracing::info!(input = %input.display(), documents = docs.len(), "corpus read");
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<RawDocument>) -> Result<(), BuildError> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: RawDocument = serde_json::from_str(&line)
            .map_err(|e| BuildError::malformed(docs.len(), format!("{}: {e}", file.display())))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<RawDocument>) -> Result<(), BuildError> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .map_err(|e| BuildError::malformed(docs.len(), format!("{}: {e}", file.display())))?;
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        other => vec![other],
    };
    for v in values {
        let doc: RawDocument = serde_json::from_value(v)
            .map_err(|e| BuildError::malformed(docs.len(), format!("{}: {e}", file.display())))?;
        docs.push(doc);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_jsonl_and_json() {
        let dir = tempdir().unwrap();
        let jsonl = "{\"id\":\"1\",\"text\":\"one\"}\n\n{\"id\":\"2\"}\n";
        fs::write(dir.path().join("a.jsonl"), jsonl).unwrap();
        fs::write(dir.path().join("b.json"), "[{\"id\":\"3\",\"text\":\"three\"}]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = read_corpus(dir.path()).unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].text.as_deref(), Some("one"));
        assert_eq!(docs[1].text, None);
        assert_eq!(docs[2].id.as_deref(), Some("3"));
    }

    #[test]
    fn bad_line_reports_position() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("c.jsonl");
        fs::write(&file, "{\"id\":\"1\",\"text\":\"x\"}\nnot json\n").unwrap();
        let err = read_corpus(&file).unwrap_err();
        assert!(matches!(err, BuildError::MalformedDocument { position: 1, .. }));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_corpus(&dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, BuildError::Io(_)));
    }
}
