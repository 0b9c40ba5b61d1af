//! Context block assembly.
//!
//! Renders a fused result list into the text block the generation step
//! consumes, and extracts source lists for citation rendering.

use crate::document::Document;

/// Render documents into one context block: a `<document>` element per
/// chunk, blank-line separated. Stored page numbers are 0-based and are
/// rendered 1-based.
pub fn format_documents(documents: &[Document]) -> String {
    tracing::info!("Formatting {} retrieved documents", documents.len());
    documents
        .iter()
        .map(format_document)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_document(document: &Document) -> String {
    let source = document.source().unwrap_or("unknown");
    match document.page() {
        Some(page) => format!(
            "<document><content>{}</content><source>{}</source><page>{}</page></document>",
            document.content,
            source,
            page + 1
        ),
        None => format!(
            "<document><content>{}</content><source>{}</source></document>",
            document.content, source
        ),
    }
}

/// The distinct sources behind a result list, sorted, for citations.
pub fn sources(documents: &[Document]) -> Vec<String> {
    let mut sources: Vec<String> = documents
        .iter()
        .filter_map(|d| d.source().map(|s| s.to_string()))
        .collect();
    sources.sort();
    sources.dedup();
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn a_document_with_a_page_renders_it_one_based() {
        let doc = Document::new("intro text", json!({ "source": "guide.pdf", "page": 0 }));
        assert_eq!(
            format_documents(&[doc]),
            "<document><content>intro text</content><source>guide.pdf</source><page>1</page></document>"
        );
    }

    #[test]
    fn a_document_without_a_page_omits_the_element() {
        let doc = Document::new("intro text", json!({ "source": "guide.pdf" }));
        assert_eq!(
            format_documents(&[doc]),
            "<document><content>intro text</content><source>guide.pdf</source></document>"
        );
    }

    #[test]
    fn a_document_without_a_source_renders_unknown() {
        let doc = Document::new("orphan", json!({}));
        assert!(format_documents(&[doc]).contains("<source>unknown</source>"));
    }

    #[test]
    fn documents_are_joined_by_blank_lines() {
        let docs = vec![
            Document::new("one", json!({ "source": "a.pdf" })),
            Document::new("two", json!({ "source": "b.pdf" })),
        ];
        let block = format_documents(&docs);
        assert_eq!(block.matches("<document>").count(), 2);
        assert!(block.contains("</document>\n\n<document>"));
    }

    #[test]
    fn no_documents_render_an_empty_block() {
        assert_eq!(format_documents(&[]), "");
    }

    #[test]
    fn sources_are_sorted_and_de_duplicated() {
        let docs = vec![
            Document::new("1", json!({ "source": "b.pdf" })),
            Document::new("2", json!({ "source": "a.pdf" })),
            Document::new("3", json!({ "source": "b.pdf" })),
            Document::new("4", json!({})),
        ];
        assert_eq!(sources(&docs), vec!["a.pdf".to_string(), "b.pdf".to_string()]);
    }
}
