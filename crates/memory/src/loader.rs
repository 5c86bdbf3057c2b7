//! Document loading for vector stores.
//!
//! A path may be a directory of text files, a single text file, or a JSONL
//! file where each line is a serialized `Document`. Text is split into one
//! document per blank-line separated paragraph.

use agentry_core::error::MemoryError;
use agentry_core::memory::Document;
use std::path::Path;
use tracing::{debug, warn};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "rst"];

/// Load every document found at `path`.
pub fn load_documents(path: &Path) -> Result<Vec<Document>, MemoryError> {
    let documents = if path.is_dir() {
        let mut files: Vec<_> = std::fs::read_dir(path)
            .map_err(|e| MemoryError::Storage(format!("{}: {e}", path.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_text_extension(p))
            .collect();
        files.sort();

        let mut documents = Vec::new();
        for file in files {
            documents.extend(load_file(&file)?);
        }
        documents
    } else {
        load_file(path)?
    };

    debug!(path = %path.display(), count = documents.len(), "Documents loaded");
    Ok(documents)
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn load_file(path: &Path) -> Result<Vec<Document>, MemoryError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| MemoryError::Storage(format!("{}: {e}", path.display())))?;

    if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
        return Ok(parse_jsonl(&content));
    }

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(split_paragraphs(&content)
        .into_iter()
        .map(|p| Document::new(p).with_source(source.clone()))
        .collect())
}

fn parse_jsonl(content: &str) -> Vec<Document> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<Document>(line) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(error = %e, "Skipping malformed document line");
                None
            }
        })
        .collect()
}

/// Paragraphs separated by one or more blank lines, trimmed.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let text = "first line\nstill first\n\n\nsecond\n  \nthird\n";
        assert_eq!(
            split_paragraphs(text),
            vec!["first line\nstill first", "second", "third"]
        );
    }

    #[test]
    fn directory_loads_text_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "beta one\n\nbeta two").unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("ignored.bin"), "zzz").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].source(), Some("a.txt"));
        assert_eq!(docs[2].content, "beta two");
    }

    #[test]
    fn jsonl_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");
        std::fs::write(
            &path,
            "{\"content\":\"one\",\"metadata\":{\"source\":\"s1\"}}\nnot json\n{\"content\":\"two\"}\n",
        )
        .unwrap();

        let docs = load_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source(), Some("s1"));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(load_documents(Path::new("/definitely/not/here.txt")).is_err());
    }
}
