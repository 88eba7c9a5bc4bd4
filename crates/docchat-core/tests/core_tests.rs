use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docchat_core::chunker::RecursiveChunker;
use docchat_core::config::ChunkingConfig;
use docchat_core::extract::{extract_corpus, load_documents};
use docchat_core::types::DocumentFormat;

#[test]
fn load_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let docs = load_documents(&[dir]).expect("load");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name, "a.txt");
    assert_eq!(docs[0].format, DocumentFormat::PlainText);

    let corpus = extract_corpus(docs);
    let chunks = RecursiveChunker::new(&ChunkingConfig::default()).unwrap().split(&corpus.text);
    assert_eq!(chunks.len(), 1, "one small paragraph becomes one chunk");
    assert_eq!(chunks[0].content.trim(), "Short text");
}

#[test]
fn directory_walk_is_recursive_sorted_and_filtered() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.txt"), "bravo ").unwrap();
    fs::write(dir.join("a.txt"), "alpha ").unwrap();
    fs::write(dir.join("nested/c.TXT"), "charlie").unwrap();
    fs::write(dir.join("ignored.md"), "markdown").unwrap();

    let docs = load_documents(&[dir]).expect("load");
    let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.TXT"]);
    assert_eq!(extract_corpus(docs).text, "alpha bravo charlie");
}

#[test]
fn explicit_unsupported_file_is_loaded_then_skipped() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("deck.pptx");
    fs::write(&path, "zip bytes").unwrap();

    let docs = load_documents(&[&path]).expect("load");
    assert_eq!(docs[0].format, DocumentFormat::Unsupported);
    let out = extract_corpus(docs);
    assert!(out.text.is_empty());
    assert_eq!(out.skipped, vec!["deck.pptx".to_string()]);
}

#[test]
fn missing_path_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = load_documents(&[tmp.path().join("nope.txt")]).unwrap_err();
    assert!(matches!(err, docchat_core::Error::Io(_)));
}
