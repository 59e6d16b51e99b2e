//! Automatic field discovery inside a record
//!
//! Classifies every visible piece of text in a record subtree and keeps
//! the best hit per field type, each paired with a generalized selector.
//! The training UI uses these to propose field definitions.

use std::collections::HashSet;

use scraper::{ElementRef, Node};
use serde::Serialize;

use crate::classify;
use crate::selector::generalize;
use crate::types::FieldType;

/// One typed field proposal produced by auto-detection.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value: String,
    pub confidence: u8,
    pub selector: String,
}

/// Classifier hits at or below this confidence are discarded.
const CONFIDENCE_FLOOR: u8 = 40;

/// Walk `record` and classify its visible text, returning the highest
/// confidence hit per detected field type, in first-detected order.
pub fn detect_fields(record: ElementRef<'_>) -> Vec<DetectedField> {
    let mut found: Vec<DetectedField> = Vec::new();
    let mut seen = HashSet::new();
    visit(record, &mut found, &mut seen);

    let mut merged: Vec<DetectedField> = Vec::new();
    for field in found {
        match merged.iter_mut().find(|f| f.field_type == field.field_type) {
            Some(existing) => {
                if field.confidence > existing.confidence {
                    *existing = field;
                }
            }
            None => merged.push(field),
        }
    }
    merged
}

fn visit(el: ElementRef<'_>, found: &mut Vec<DetectedField>, seen: &mut HashSet<String>) {
    if is_hidden(el) {
        return;
    }

    let text = visible_text(el);
    let len = text.chars().count();

    // containers and overly long blobs fall through to their children;
    // duplicate values are classified once
    if (2..=300).contains(&len) && seen.insert(text.clone()) {
        let classification = classify::classify(&text, Some(&el));
        if classification.confidence > CONFIDENCE_FLOOR {
            let value = match classification.field_type {
                FieldType::Website | FieldType::Linkedin => el
                    .value()
                    .attr("href")
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone()),
                _ => text.clone(),
            };
            found.push(DetectedField {
                field_type: classification.field_type,
                value,
                confidence: classification.confidence,
                selector: generalize(el).unwrap_or_default(),
            });
        }
    }

    for child in el.children().filter_map(ElementRef::wrap) {
        visit(child, found, seen);
    }
}

/// Rendered-text approximation: the subtree's text with hidden elements
/// left out.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out.trim().to_string()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    if is_hidden(el) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Inline visibility check. Computed styles are unavailable on a static
/// snapshot, so only the `hidden` attribute and inline `style` rules
/// count.
fn is_hidden(el: ElementRef<'_>) -> bool {
    let e = el.value();
    if e.attr("hidden").is_some() {
        return true;
    }
    e.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}
