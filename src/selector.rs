//! Generalized selector generation
//!
//! Turns a specific element into a structural CSS path that re-locates
//! equivalent elements across near-identical records. Positional
//! qualifiers are deliberately absent so the path survives reordering;
//! stability comes from ids, hand-written class names, and structural
//! data attributes.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::types::EngineError;

static STABLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

// Auto-generated class tokens: short letter+digit blobs ("a1", "xs92") and
// styled-components / css-in-js hashes ("css-1x2y3z", "sc-bdfBwQ")
static GENERATED_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-z]{1,2}\d+|(?:css|sc)-[a-zA-Z0-9]+)$").unwrap());

/// Produce a stable, generalized CSS selector for `element`.
///
/// Walks upward to (but not including) the document body, one segment per
/// ancestor, root-to-target. An id matching the strict identifier pattern
/// anchors the path and stops the walk. Fails when the element is the
/// body itself or does not sit under one.
pub fn generalize(element: ElementRef<'_>) -> Result<String, EngineError> {
    if element.value().name() == "body" {
        return Err(EngineError::InvalidElement("cannot generalize the document body"));
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = element;

    loop {
        let e = current.value();

        if let Some(id) = e.attr("id").filter(|id| STABLE_ID_RE.is_match(id)) {
            // id anchors are globally stable and sufficient on their own
            parts.push(format!("#{id}"));
            break;
        }

        let mut segment = e.name().to_lowercase();

        let stable: Vec<&str> = e
            .classes()
            .filter(|c| !GENERATED_CLASS_RE.is_match(c))
            .take(2)
            .collect();
        if !stable.is_empty() {
            segment.push('.');
            segment.push_str(&stable.join("."));
        }

        if let Some((name, _)) = e.attrs().find(|(name, _)| {
            name.starts_with("data-")
                && !name.contains("id")
                && !name.contains("index")
                && !name.contains("key")
        }) {
            segment.push('[');
            segment.push_str(name);
            segment.push(']');
        }

        parts.push(segment);

        let parent = current
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or(EngineError::InvalidElement("element is not attached under a document body"))?;
        if parent.value().name() == "body" {
            break;
        }
        current = parent;
    }

    parts.reverse();
    Ok(parts.join(" > "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, selector: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(selector).unwrap()).next().unwrap()
    }

    #[test]
    fn test_id_anchor_terminates_the_walk() {
        let doc = Html::parse_document(
            r#"<div><section id="results"><div class="card"><span class="price">$5</span></div></section></div>"#,
        );
        let span = first(&doc, "span");

        let selector = generalize(span).unwrap();
        assert_eq!(selector, "#results > div.card > span.price");
    }

    #[test]
    fn test_own_id_is_the_whole_path() {
        let doc = Html::parse_document(r#"<div><p id="tagline">hello</p></div>"#);
        let p = first(&doc, "p");

        assert_eq!(generalize(p).unwrap(), "#tagline");
    }

    #[test]
    fn test_generated_classes_are_filtered() {
        let doc = Html::parse_document(
            r#"<div class="css-1a2b3c sc-bdfBwQ card listing extra"><em>x</em></div>"#,
        );
        let div = first(&doc, "div");

        // only the first two surviving tokens qualify the tag
        assert_eq!(generalize(div).unwrap(), "div.card.listing");
    }

    #[test]
    fn test_structural_data_attribute_is_kept() {
        let doc = Html::parse_document(
            r#"<ul><li data-testid="row-3" data-role="entry" class="row">x</li></ul>"#,
        );
        let li = first(&doc, "li");

        // data-testid contains "id" and is skipped; data-role qualifies
        assert_eq!(generalize(li).unwrap(), "ul > li.row[data-role]");
    }

    #[test]
    fn test_numeric_id_is_not_an_anchor() {
        let doc = Html::parse_document(r#"<div id="123"><b class="k">x</b></div>"#);
        let b = first(&doc, "b");

        assert_eq!(generalize(b).unwrap(), "div > b.k");
    }

    #[test]
    fn test_top_segment_is_never_the_body() {
        let doc = Html::parse_document(r#"<body><div class="wrap"><i>x</i></div></body>"#);
        let i = first(&doc, "i");

        let selector = generalize(i).unwrap();
        assert!(!selector.starts_with("body"));
        assert_eq!(selector, "div.wrap > i");
    }

    #[test]
    fn test_body_itself_is_invalid() {
        let doc = Html::parse_document("<body><p>x</p></body>");
        let body = first(&doc, "body");

        assert!(generalize(body).is_err());
    }

    #[test]
    fn test_head_content_is_invalid() {
        let doc = Html::parse_document(
            r#"<html><head><meta name="author" content="x"></head><body></body></html>"#,
        );
        let meta = first(&doc, "meta");

        assert!(generalize(meta).is_err());
    }
}
