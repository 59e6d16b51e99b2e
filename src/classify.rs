//! Field type classification
//!
//! Scores text plus its owning element against a table of semantic type
//! signatures: a value pattern, label keywords, and a base weight. Anchor
//! targets (mailto:, tel:, http, linkedin.com) override both signals.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::types::{Classification, FieldType};

/// Signature for one semantic field type.
pub struct TypeSignature {
    pub field_type: FieldType,
    /// Pattern the raw value must match.
    pub pattern: Regex,
    /// Keywords matched as substrings of the element's label string.
    pub keywords: &'static [&'static str],
    /// Confidence granted by a pattern hit.
    pub weight: u8,
}

/// Classifier over an ordered set of type signatures.
///
/// Signature order is the tie-break: the first type to reach the best
/// confidence wins. The built-in table is available through `Default`;
/// hosts with custom field sets construct their own.
pub struct Classifier {
    signatures: Vec<TypeSignature>,
}

fn signature(
    field_type: FieldType,
    pattern: &str,
    keywords: &'static [&'static str],
    weight: u8,
) -> TypeSignature {
    TypeSignature {
        field_type,
        pattern: Regex::new(pattern).expect("built-in signature pattern"),
        keywords,
        weight,
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(vec![
            signature(
                FieldType::Email,
                r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}",
                &["email", "e-mail", "mail", "contact"],
                95,
            ),
            signature(
                FieldType::Phone,
                r"\+?[\d\s\-().]{7,20}",
                &["phone", "tel", "mobile", "cell", "fax", "call"],
                85,
            ),
            signature(
                FieldType::Address,
                r"(?i)\d+\s+[\w\s]+(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|court|ct)",
                &["address", "location", "office", "headquarters", "hq", "addr"],
                80,
            ),
            signature(
                FieldType::Company,
                r"(?i)\b(?:inc|llc|ltd|corp|company|co\.|group|enterprises?)\b",
                &["company", "organization", "firm", "business", "employer", "brand"],
                75,
            ),
            signature(
                FieldType::Website,
                r#"https?://[^\s"'<>]+"#,
                &["website", "url", "site", "web", "homepage", "link"],
                90,
            ),
            signature(
                FieldType::Name,
                r"^[A-Z][a-z]+ [A-Z][a-z]+",
                &["name", "contact", "person", "owner", "ceo", "founder", "manager"],
                70,
            ),
            signature(
                FieldType::Title,
                r"(?i)\b(?:ceo|cto|cfo|director|manager|founder|president|vp|partner|associate)\b",
                &["title", "role", "position", "designation", "job"],
                72,
            ),
            signature(
                FieldType::Linkedin,
                r#"linkedin\.com/in/[^\s"'<>]+"#,
                &["linkedin"],
                92,
            ),
        ])
    }
}

impl Classifier {
    pub fn new(signatures: Vec<TypeSignature>) -> Self {
        Classifier { signatures }
    }

    pub fn signatures(&self) -> &[TypeSignature] {
        &self.signatures
    }

    pub fn signature_for(&self, field_type: FieldType) -> Option<&TypeSignature> {
        self.signatures.iter().find(|s| s.field_type == field_type)
    }

    /// Classify `text` plus the element that carried it.
    ///
    /// Empty text is always `{unknown, 0}`. Pure function of its inputs.
    pub fn classify(&self, text: &str, element: Option<&ElementRef>) -> Classification {
        if text.is_empty() {
            return Classification::UNKNOWN;
        }

        let label = element.map(label_string).unwrap_or_default();
        let href = element.and_then(link_target);

        let mut best = Classification::UNKNOWN;
        for sig in &self.signatures {
            let mut confidence: u32 = 0;

            if sig.pattern.is_match(text) {
                confidence += sig.weight as u32;
            }

            if sig.keywords.iter().any(|kw| label.contains(kw)) {
                confidence = confidence.max(65) + 15;
            }

            // Anchor targets are the strongest signal and take precedence
            if let Some(href) = href.as_deref() {
                confidence = match sig.field_type {
                    FieldType::Email if href.starts_with("mailto:") => 98,
                    FieldType::Phone if href.starts_with("tel:") => 97,
                    FieldType::Website if href.starts_with("http") => confidence.max(85),
                    FieldType::Linkedin if href.contains("linkedin.com") => 99,
                    _ => confidence,
                };
            }

            let confidence = confidence.min(99) as u8;
            if confidence > best.confidence {
                best = Classification {
                    field_type: sig.field_type,
                    confidence,
                };
            }
        }

        best
    }
}

/// Lowercased concatenation of the element's labelling attributes.
/// Used for keyword matching only, never for pattern matching.
fn label_string(el: &ElementRef) -> String {
    let e = el.value();
    let classes = e.classes().collect::<Vec<_>>().join(" ");
    [
        e.attr("aria-label").unwrap_or(""),
        e.attr("data-field").unwrap_or(""),
        e.attr("name").unwrap_or(""),
        e.attr("itemprop").unwrap_or(""),
        e.attr("id").unwrap_or(""),
        &classes,
    ]
    .join(" ")
    .to_lowercase()
}

/// The element's href when it is an anchor.
fn link_target(el: &ElementRef) -> Option<String> {
    let e = el.value();
    (e.name() == "a").then(|| e.attr("href").unwrap_or("").to_string())
}

static BUILTIN: LazyLock<Classifier> = LazyLock::new(Classifier::default);

/// Classify with the built-in signature table.
pub fn classify(text: &str, element: Option<&ElementRef>) -> Classification {
    BUILTIN.classify(text, element)
}

pub(crate) fn builtin() -> &'static Classifier {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, selector: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(selector).unwrap()).next().unwrap()
    }

    #[test]
    fn test_empty_text_is_unknown() {
        let result = classify("", None);
        assert_eq!(result, Classification::UNKNOWN);
    }

    #[test]
    fn test_plain_email_text() {
        let result = classify("reach me at jane.doe@acme.com", None);
        assert_eq!(result.field_type, FieldType::Email);
        assert!(result.confidence >= 95);
    }

    #[test]
    fn test_mailto_link_forces_email() {
        let doc = Html::parse_document(r#"<a href="mailto:x@y.com">Drop us a line</a>"#);
        let a = first(&doc, "a");

        let result = classify("Drop us a line", Some(&a));
        assert_eq!(result.field_type, FieldType::Email);
        assert_eq!(result.confidence, 98);
    }

    #[test]
    fn test_linkedin_link_beats_website() {
        let doc = Html::parse_document(
            r#"<a href="https://linkedin.com/in/jane-doe">Jane's profile</a>"#,
        );
        let a = first(&doc, "a");

        // http target raises website to 85, but linkedin.com forces 99
        let result = classify("Jane's profile", Some(&a));
        assert_eq!(result.field_type, FieldType::Linkedin);
        assert_eq!(result.confidence, 99);
    }

    #[test]
    fn test_keyword_label_stacks_with_pattern() {
        let doc = Html::parse_document(r#"<span id="phone-number">555 - 1234</span>"#);
        let span = first(&doc, "span");

        // pattern hit (85) stacked with the keyword bonus, clamped to 99
        let result = classify("555 - 1234", Some(&span));
        assert_eq!(result.field_type, FieldType::Phone);
        assert_eq!(result.confidence, 99);
    }

    #[test]
    fn test_keyword_only_hit() {
        let doc = Html::parse_document(r#"<span class="office-address">Somewhere</span>"#);
        let span = first(&doc, "span");

        let result = classify("Somewhere", Some(&span));
        assert_eq!(result.field_type, FieldType::Address);
        assert_eq!(result.confidence, 80);
    }

    #[test]
    fn test_tie_keeps_first_enumerated_type() {
        // "contact" is a keyword for both email and name; with no pattern
        // hit both score 80, and email is enumerated first
        let doc = Html::parse_document(r#"<span class="contact">n/a</span>"#);
        let span = first(&doc, "span");

        let result = classify("n/a", Some(&span));
        assert_eq!(result.field_type, FieldType::Email);
        assert_eq!(result.confidence, 80);
    }

    #[test]
    fn test_person_name_pattern() {
        let result = classify("Jane Smith", None);
        assert_eq!(result.field_type, FieldType::Name);
        assert_eq!(result.confidence, 70);
    }

    #[test]
    fn test_custom_signature_table() {
        let classifier = Classifier::new(vec![signature(
            FieldType::Company,
            r"(?i)\bgmbh\b",
            &["firma"],
            90,
        )]);
        let result = classifier.classify("Beispiel GmbH", None);
        assert_eq!(result.field_type, FieldType::Company);
        assert_eq!(result.confidence, 90);
    }
}
