//! Turns uploaded documents into one corpus string.
//!
//! PDF pages are concatenated in page order with nothing inserted between
//! them; a page that does not end in whitespace runs into the next one.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Document, DocumentFormat};

/// Result of extracting one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub extracted: usize,
    pub skipped: Vec<String>,
}

/// Extract and concatenate the text of every supported document.
///
/// Unsupported or unreadable documents are skipped. An empty `text` is the
/// caller's failure signal.
pub fn extract_corpus(documents: Vec<Document>) -> Extraction {
    let mut out = Extraction::default();
    for doc in documents {
        match extract_document(&doc) {
            Ok(text) => {
                debug!(name = %doc.name, chars = text.chars().count(), "extracted document");
                out.text.push_str(&text);
                out.extracted += 1;
            }
            Err(e) => {
                warn!(name = %doc.name, error = %e, "skipping document");
                out.skipped.push(doc.name);
            }
        }
    }
    out
}

pub fn extract_document(doc: &Document) -> Result<String> {
    match doc.format {
        DocumentFormat::PlainText => Ok(decode_utf8(&doc.bytes)),
        DocumentFormat::Pdf => extract_pdf_pages(&doc.bytes)
            .map_err(|e| Error::UnsupportedFormat(format!("{}: unreadable PDF ({e})", doc.name))),
        DocumentFormat::Unsupported => Err(Error::UnsupportedFormat(doc.name.clone())),
    }
}

fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn extract_pdf_pages(bytes: &[u8]) -> std::result::Result<String, lopdf::Error> {
    let pdf = lopdf::Document::load_mem(bytes)?;
    let mut text = String::new();
    // get_pages is keyed by 1-based page number, so iteration is page order.
    for page_number in pdf.get_pages().keys() {
        text.push_str(&pdf.extract_text(&[*page_number])?);
    }
    Ok(text)
}

/// Read files and directories into documents.
///
/// Directories are walked recursively and only `.pdf`/`.txt` files are kept,
/// sorted by path. Explicitly named files are kept whatever their suffix so
/// the extractor can report them as skipped.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            for file in list_supported_files(path) {
                docs.push(read_document(&file)?);
            }
        } else {
            docs.push(read_document(path)?);
        }
    }
    Ok(docs)
}

fn read_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    Ok(Document::new(name, bytes))
}

fn list_supported_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        let name = path.to_string_lossy();
        if DocumentFormat::from_name(&name) != DocumentFormat::Unsupported {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_documents_are_concatenated_in_order() {
        let docs = vec![
            Document::new("a.txt", b"first\n".to_vec()),
            Document::new("b.txt", b"second".to_vec()),
        ];
        let out = extract_corpus(docs);
        assert_eq!(out.text, "first\nsecond");
        assert_eq!(out.extracted, 2);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn unsupported_documents_are_skipped_silently() {
        let docs = vec![
            Document::new("slides.pptx", b"binary".to_vec()),
            Document::new("notes.txt", b"kept".to_vec()),
        ];
        let out = extract_corpus(docs);
        assert_eq!(out.text, "kept");
        assert_eq!(out.skipped, vec!["slides.pptx".to_string()]);
    }

    #[test]
    fn only_unsupported_documents_yield_empty_text() {
        let out = extract_corpus(vec![Document::new("x.docx", b"abc".to_vec())]);
        assert!(out.text.is_empty());
        assert_eq!(out.extracted, 0);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let out = extract_corpus(vec![Document::new("bad.txt", vec![b'o', b'k', 0xFF])]);
        assert!(out.text.starts_with("ok"));
        assert!(out.text.contains('\u{FFFD}'));
    }

    #[test]
    fn garbage_pdf_is_skipped() {
        let out = extract_corpus(vec![Document::new("broken.pdf", b"not a pdf".to_vec())]);
        assert!(out.text.is_empty());
        assert_eq!(out.skipped, vec!["broken.pdf".to_string()]);
    }

    /// Three pages with one line of text each, in page order.
    fn three_page_pdf() -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for text in ["PageOne", "PageTwo", "PageThree"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 3,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        pdf.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pdf_pages_come_back_in_page_order() {
        let text = extract_document(&Document::new("manual.pdf", three_page_pdf())).unwrap();
        // lopdf ends each extracted text line with '\n'; nothing is added between pages.
        assert_eq!(text, "PageOne\nPageTwo\nPageThree\n");
    }

    #[test]
    fn nothing_is_inserted_between_documents() {
        let docs = vec![
            Document::new("manual.pdf", three_page_pdf()),
            Document::new("notes.txt", b"tail".to_vec()),
        ];
        let out = extract_corpus(docs);
        assert_eq!(out.text, "PageOne\nPageTwo\nPageThree\ntail");
        assert_eq!(out.extracted, 2);
    }

    #[test]
    fn extract_document_reports_unsupported_format() {
        let err = extract_document(&Document::new("a.csv", vec![])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(name) if name == "a.csv"));
    }
}
