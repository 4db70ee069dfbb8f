//! Page content extraction
//!
//! Pulls the title and readable text out of a loaded document so they can be
//! stored with the page and searched later.

use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: Option<String>,
    /// Visible text, whitespace collapsed; `None` for an empty document
    pub full_text: Option<String>,
}

pub fn extract_content(html: &str) -> PageContent {
    let doc = Html::parse_document(html);

    PageContent {
        title: extract_title(&doc),
        full_text: extract_text(&doc),
    }
}

fn extract_title(doc: &Html) -> Option<String> {
    for selector in ["meta[property='og:title']", "title", "h1"] {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for el in doc.select(&sel) {
            let text = match el.value().attr("content") {
                Some(content) => collapse_whitespace(content),
                None => collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")),
            };
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

fn extract_text(doc: &Html) -> Option<String> {
    let sel = Selector::parse("body").ok()?;
    let body = doc.select(&sel).next()?;

    let mut parts = Vec::new();
    collect_text(body, &mut parts);

    let text = collapse_whitespace(&parts.join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of `el` and its descendants, skipping elements that never render.
fn collect_text<'a>(el: ElementRef<'a>, out: &mut Vec<&'a str>) {
    if matches!(
        el.value().name(),
        "script" | "style" | "noscript" | "template"
    ) {
        return;
    }

    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push(&**text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_title_and_text() {
        let content = extract_content(
            r#"<html><head><title> Example
                Domain </title><style>body { color: red }</style></head>
               <body><h1>Example</h1><p>This domain is for
               use in <a href="/">examples</a>.</p>
               <script>var hidden = 1;</script></body></html>"#,
        );

        assert_eq!(content.title.as_deref(), Some("Example Domain"));
        assert_eq!(
            content.full_text.as_deref(),
            Some("Example This domain is for use in examples .")
        );
    }

    #[test]
    fn test_open_graph_title_wins() {
        let content = extract_content(
            r#"<html><head><meta property="og:title" content="Shared Title">
               <title>Tab Title</title></head><body></body></html>"#,
        );
        assert_eq!(content.title.as_deref(), Some("Shared Title"));
        assert!(content.full_text.is_none());
    }

    #[test]
    fn test_heading_fallback() {
        let content = extract_content("<body><h1>Only Heading</h1></body>");
        assert_eq!(content.title.as_deref(), Some("Only Heading"));
    }
}
