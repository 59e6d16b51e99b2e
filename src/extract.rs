//! Template-driven lead extraction
//!
//! Applies a template's field selectors to a document and emits one lead
//! per record root. Fields whose selector finds nothing fall back to a
//! type-targeted search over the record's subtree.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::classify;
use crate::patterns::detect_records;
use crate::types::{FieldType, LeadRecord, Template};

/// Hosts the website fallback refuses to treat as a company homepage.
const SOCIAL_DOMAINS: &[&str] = &["facebook.com", "twitter.com", "x.com"];

/// Extract lead records from `doc` according to `template`.
///
/// `page_url` is stamped on every lead under `_source`. Records that fill
/// no field at all are dropped; selector failures are swallowed per
/// field and never abort a record.
pub fn extract(template: &Template, doc: &Html, page_url: &str) -> Vec<LeadRecord> {
    let mut leads = Vec::new();
    if template.fields.is_empty() {
        return leads;
    }

    let records = record_roots(template, doc);
    debug!(
        records = records.len(),
        fields = template.fields.len(),
        "extracting leads"
    );

    for record in records {
        let mut lead = LeadRecord::new();
        lead.insert("_source".to_string(), Value::String(page_url.to_string()));
        let mut has_any_value = false;

        for field in &template.fields {
            let mut value = field
                .selector
                .as_deref()
                .filter(|s| !s.is_empty())
                .and_then(|s| Selector::parse(s).ok())
                .and_then(|sel| record.select(&sel).next())
                .and_then(element_value);

            if value.is_none() && field.auto_fallback {
                value = find_by_type(field.field_type, record, doc);
            }

            if let Some(value) = value {
                lead.insert(field.name.clone(), Value::String(value));
                lead.insert(
                    format!("{}_confidence", field.name),
                    Value::from(field.confidence.unwrap_or(80)),
                );
                has_any_value = true;
            }
        }

        if has_any_value {
            leads.push(lead);
        }
    }

    leads
}

/// Parse `html` and extract in one step.
pub fn extract_html(template: &Template, html: &str, page_url: &str) -> Vec<LeadRecord> {
    let doc = Html::parse_document(html);
    extract(template, &doc, page_url)
}

/// Resolve the elements to treat as record roots: the template's record
/// selector, else detected repeating patterns, else the body itself.
fn record_roots<'a>(template: &Template, doc: &'a Html) -> Vec<ElementRef<'a>> {
    if let Some(selector) = template.record_selector.as_deref().filter(|s| !s.is_empty()) {
        if let Ok(selector) = Selector::parse(selector) {
            let records: Vec<_> = doc.select(&selector).collect();
            if !records.is_empty() {
                return records;
            }
        }
    }

    let body = document_body(doc);
    let detected = detect_records(body);
    if !detected.is_empty() {
        return detected;
    }

    // single-record page
    vec![body]
}

fn document_body(doc: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element())
}

/// Value carried by an element: link targets for anchors (with mailto:
/// and tel: prefixes stripped), trimmed text otherwise.
fn element_value(el: ElementRef<'_>) -> Option<String> {
    let e = el.value();
    if e.name() == "a" {
        if let Some(href) = e.attr("href").filter(|h| !h.is_empty()) {
            let value = href
                .strip_prefix("mailto:")
                .or_else(|| href.strip_prefix("tel:"))
                .unwrap_or(href);
            return (!value.is_empty()).then(|| value.to_string());
        }
    }
    let text = el.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Type-targeted fallback: find the first value in the record subtree
/// that looks like `field_type`. Direct lookups (mailto:/tel:/external
/// links) run first; otherwise leaf text is scanned against the type's
/// value pattern.
fn find_by_type(field_type: FieldType, root: ElementRef<'_>, doc: &Html) -> Option<String> {
    match field_type {
        FieldType::Email => {
            if let Some(href) = first_href(root, |h| h.starts_with("mailto:")) {
                return Some(href.trim_start_matches("mailto:").to_string());
            }
            if let Some(email) = meta_email(doc) {
                return Some(email);
            }
        }
        FieldType::Phone => {
            if let Some(href) = first_href(root, |h| h.starts_with("tel:")) {
                return Some(href.trim_start_matches("tel:").to_string());
            }
        }
        FieldType::Website => {
            if let Some(href) = first_href(root, |h| h.starts_with("http") && !is_social_link(h)) {
                return Some(href);
            }
        }
        FieldType::Linkedin => {
            if let Some(href) = first_href(root, |h| h.contains("linkedin.com")) {
                return Some(href);
            }
        }
        _ => {}
    }

    let signature = classify::builtin().signature_for(field_type)?;
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.id() != root.id())
        .filter(|el| el.children().all(|c| c.value().as_element().is_none()))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| {
            let len = text.chars().count();
            len > 0 && len < 200
        })
        .find(|text| signature.pattern.is_match(text))
}

fn first_href(root: ElementRef<'_>, matches: impl Fn(&str) -> bool) -> Option<String> {
    let selector = Selector::parse("a[href]").ok()?;
    root.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .find(|&href| matches(href))
        .map(str::to_string)
}

fn meta_email(doc: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[itemprop="email"]"#).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

fn is_social_link(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => url.host_str().is_some_and(|host| {
            SOCIAL_DOMAINS
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        }),
        Err(_) => SOCIAL_DOMAINS.iter().any(|domain| href.contains(domain)),
    }
}
