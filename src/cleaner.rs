//! Lead record cleaning
//!
//! Post-extraction hygiene over extracted rows: normalization,
//! placeholder and duplicate removal, validity checks. Every rule
//! reports what it removed or altered so the host can show a cleaning
//! summary. Rule identifiers keep their historical camelCase names,
//! which the host's reporting UI matches on.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::types::LeadRecord;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").unwrap()
});
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:n/a|na|none|null|undefined|unknown|your name|company name|test|sample|example|-+|\.+)$")
        .unwrap()
});
static PERSON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+\s[A-Z][a-z]+$").unwrap());
static WS_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

const FAKE_EMAIL_PREFIXES: &[&str] = &[
    "test@",
    "example@",
    "noreply@",
    "no-reply@",
    "info@info",
    "placeholder",
    "user@user",
];
const IDENTIFIER_FIELDS: &[&str] = &["company", "name", "email", "linkedin", "website"];
const IGNORED_FIELDS: &[&str] = &["_source", "id", "_extractedAt"];

/// Which cleaning rules to run. All on by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleanOptions {
    pub normalize: bool,
    pub misclassified: bool,
    pub placeholders: bool,
    pub invalid_emails: bool,
    pub invalid_phones: bool,
    pub no_identifier: bool,
    pub thin_leads: bool,
    pub min_fields: usize,
    pub deduplication: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            normalize: true,
            misclassified: true,
            placeholders: true,
            invalid_emails: true,
            invalid_phones: true,
            no_identifier: true,
            thin_leads: true,
            min_fields: 2,
            deduplication: true,
        }
    }
}

/// A lead removed or altered by a rule, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct RemovedLead {
    pub lead: LeadRecord,
    pub reason: String,
}

/// Outcome of one cleaning rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub rule: &'static str,
    pub count: usize,
    pub removed: Vec<RemovedLead>,
}

/// Outcome of a full cleaning pass.
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome {
    pub cleaned: Vec<LeadRecord>,
    pub report: Vec<RuleReport>,
}

/// Run the enabled cleaning rules, in fixed order, over `leads`.
pub fn clean_leads(leads: Vec<LeadRecord>, options: &CleanOptions) -> CleanOutcome {
    let original = leads.len();
    let mut current = leads;
    let mut report = Vec::new();

    if options.normalize {
        let (kept, r) = normalize_fields(current);
        current = kept;
        report.push(r);
    }
    if options.misclassified {
        let (kept, r) = detect_misclassified_fields(current);
        current = kept;
        report.push(r);
    }
    if options.placeholders {
        let (kept, r) = remove_placeholders(current);
        current = kept;
        report.push(r);
    }
    if options.invalid_emails {
        let (kept, r) = remove_invalid_emails(current, false);
        current = kept;
        report.push(r);
    }
    if options.invalid_phones {
        let (kept, r) = remove_invalid_phones(current, false);
        current = kept;
        report.push(r);
    }
    if options.no_identifier {
        let (kept, r) = remove_no_identifier(current);
        current = kept;
        report.push(r);
    }
    if options.thin_leads {
        let (kept, r) = remove_thin_leads(current, options.min_fields);
        current = kept;
        report.push(r);
    }
    if options.deduplication {
        let (kept, r) = remove_duplicates(current);
        current = kept;
        report.push(r);
    }

    debug!(original, cleaned = current.len(), "lead cleaning finished");
    CleanOutcome {
        cleaned: current,
        report,
    }
}

/// Trim every value, lowercase emails, normalize phone punctuation,
/// collapse runs of whitespace. Never removes rows.
pub fn normalize_fields(leads: Vec<LeadRecord>) -> (Vec<LeadRecord>, RuleReport) {
    let cleaned = leads
        .into_iter()
        .map(|mut lead| {
            let keys: Vec<String> = lead.keys().cloned().collect();
            for key in keys {
                if key.starts_with('_') || key.ends_with("_confidence") {
                    continue;
                }
                let Some(Value::String(value)) = lead.get(&key) else {
                    continue;
                };
                let fixed = match key.as_str() {
                    "email" => normalize_email(value),
                    "phone" => normalize_phone(value),
                    _ => normalize_text(value),
                };
                lead.insert(key, Value::String(fixed));
            }
            lead
        })
        .collect();

    (
        cleaned,
        RuleReport {
            rule: "normalizeFields",
            count: 0,
            removed: Vec::new(),
        },
    )
}

/// A company value shaped like a person name with no name field present
/// is scrape residue: move it to `name`.
pub fn detect_misclassified_fields(leads: Vec<LeadRecord>) -> (Vec<LeadRecord>, RuleReport) {
    let cleaned = leads
        .into_iter()
        .map(|mut lead| {
            let company = get_str(&lead, "company").to_string();
            if !company.trim().is_empty()
                && get_str(&lead, "name").is_empty()
                && PERSON_NAME_RE.is_match(company.trim())
            {
                lead.insert("name".to_string(), Value::String(company));
                lead.remove("company");
            }
            lead
        })
        .collect();

    (
        cleaned,
        RuleReport {
            rule: "detectMisclassifiedFields",
            count: 0,
            removed: Vec::new(),
        },
    )
}

/// Clear placeholder values ("N/A", "null", "Company Name", ...); drop
/// rows left with nothing.
pub fn remove_placeholders(leads: Vec<LeadRecord>) -> (Vec<LeadRecord>, RuleReport) {
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for lead in leads {
        let mut fixed = lead.clone();
        let mut changed = false;
        let keys: Vec<String> = fixed
            .keys()
            .filter(|k| !k.starts_with('_') && !k.ends_with("_confidence"))
            .cloned()
            .collect();
        for key in keys {
            if fixed.get(&key).is_some_and(is_placeholder) {
                fixed.remove(&key);
                changed = true;
            }
        }

        if count_filled_fields(&fixed) < 1 {
            removed.push(RemovedLead {
                lead,
                reason: "All fields were placeholder values".to_string(),
            });
        } else {
            if changed {
                removed.push(RemovedLead {
                    lead: fixed.clone(),
                    reason: "Placeholder fields cleared".to_string(),
                });
            }
            kept.push(fixed);
        }
    }

    let count = removed.len();
    (
        kept,
        RuleReport {
            rule: "removePlaceholders",
            count,
            removed,
        },
    )
}

/// Clear (or with `remove_row`, drop) leads whose email fails the strict
/// format check or starts with a known fake prefix.
pub fn remove_invalid_emails(
    leads: Vec<LeadRecord>,
    remove_row: bool,
) -> (Vec<LeadRecord>, RuleReport) {
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for mut lead in leads {
        let email = get_str(&lead, "email").to_string();
        if email.is_empty() || is_valid_email(&email) {
            kept.push(lead);
            continue;
        }

        let reason = format!("Invalid email format: {email}");
        if remove_row {
            removed.push(RemovedLead { lead, reason });
        } else {
            removed.push(RemovedLead {
                lead: lead.clone(),
                reason: format!("{reason} (email field cleared)"),
            });
            lead.remove("email");
            lead.remove("email_confidence");
            kept.push(lead);
        }
    }

    let count = removed.len();
    (
        kept,
        RuleReport {
            rule: "removeInvalidEmails",
            count,
            removed,
        },
    )
}

/// Clear (or with `remove_row`, drop) leads whose phone has fewer than 6
/// or more than 15 digits.
pub fn remove_invalid_phones(
    leads: Vec<LeadRecord>,
    remove_row: bool,
) -> (Vec<LeadRecord>, RuleReport) {
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for mut lead in leads {
        let phone = get_str(&lead, "phone").to_string();
        if phone.is_empty() || is_valid_phone(&phone) {
            kept.push(lead);
            continue;
        }

        let reason = format!("Invalid phone: {phone}");
        if remove_row {
            removed.push(RemovedLead { lead, reason });
        } else {
            removed.push(RemovedLead {
                lead: lead.clone(),
                reason: format!("{reason} (phone field cleared)"),
            });
            lead.remove("phone");
            lead.remove("phone_confidence");
            kept.push(lead);
        }
    }

    let count = removed.len();
    (
        kept,
        RuleReport {
            rule: "removeInvalidPhones",
            count,
            removed,
        },
    )
}

/// Drop leads with no business identifier at all. A row that only has a
/// phone number is useless for outreach.
pub fn remove_no_identifier(leads: Vec<LeadRecord>) -> (Vec<LeadRecord>, RuleReport) {
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for lead in leads {
        let has_identifier = IDENTIFIER_FIELDS
            .iter()
            .any(|field| lead.get(*field).is_some_and(|v| !is_placeholder(v)));
        if has_identifier {
            kept.push(lead);
        } else {
            removed.push(RemovedLead {
                lead,
                reason: "No business identifier (no company/name/email/linkedin/website)"
                    .to_string(),
            });
        }
    }

    let count = removed.len();
    (
        kept,
        RuleReport {
            rule: "removeNoIdentifier",
            count,
            removed,
        },
    )
}

/// Drop leads with fewer than `min_fields` filled values.
pub fn remove_thin_leads(
    leads: Vec<LeadRecord>,
    min_fields: usize,
) -> (Vec<LeadRecord>, RuleReport) {
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for lead in leads {
        let filled = count_filled_fields(&lead);
        if filled < min_fields {
            removed.push(RemovedLead {
                reason: format!("Only {filled} field(s) populated (minimum: {min_fields})"),
                lead,
            });
        } else {
            kept.push(lead);
        }
    }

    let count = removed.len();
    (
        kept,
        RuleReport {
            rule: "removeThinLeads",
            count,
            removed,
        },
    )
}

/// Drop exact duplicates: same valid email, same phone digits + company,
/// or same linkedin URL. First occurrence wins.
pub fn remove_duplicates(leads: Vec<LeadRecord>) -> (Vec<LeadRecord>, RuleReport) {
    let mut seen_email = HashSet::new();
    let mut seen_phone_company = HashSet::new();
    let mut seen_linkedin = HashSet::new();
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for lead in leads {
        let email = get_str(&lead, "email").trim().to_lowercase();
        let phone_digits: String = get_str(&lead, "phone")
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let company = get_str(&lead, "company").trim().to_lowercase();
        let linkedin = {
            let l = get_str(&lead, "linkedin").trim().to_lowercase();
            l.strip_suffix('/').map(str::to_string).unwrap_or(l)
        };
        let phone_company = format!("{phone_digits}|{company}");

        let reason = if !email.is_empty() && is_valid_email(&email) && seen_email.contains(&email) {
            Some(format!("Duplicate email: {email}"))
        } else if phone_digits.len() >= 6
            && !company.is_empty()
            && seen_phone_company.contains(&phone_company)
        {
            Some(format!(
                "Duplicate phone+company: {} / {}",
                get_str(&lead, "phone"),
                get_str(&lead, "company")
            ))
        } else if !linkedin.is_empty() && seen_linkedin.contains(&linkedin) {
            Some(format!("Duplicate LinkedIn: {linkedin}"))
        } else {
            None
        };

        match reason {
            Some(reason) => removed.push(RemovedLead { lead, reason }),
            None => {
                if !email.is_empty() && is_valid_email(&email) {
                    seen_email.insert(email);
                }
                if phone_digits.len() >= 6 && !company.is_empty() {
                    seen_phone_company.insert(phone_company);
                }
                if !linkedin.is_empty() {
                    seen_linkedin.insert(linkedin);
                }
                kept.push(lead);
            }
        }
    }

    let count = removed.len();
    (
        kept,
        RuleReport {
            rule: "removeDuplicates",
            count,
            removed,
        },
    )
}

fn get_str<'a>(lead: &'a LeadRecord, key: &str) -> &'a str {
    lead.get(key).and_then(Value::as_str).unwrap_or("")
}

fn is_valid_email(email: &str) -> bool {
    let e = email.trim().to_lowercase();
    EMAIL_RE.is_match(&e) && !FAKE_EMAIL_PREFIXES.iter().any(|fake| e.starts_with(fake))
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    (6..=15).contains(&digits)
}

fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty() || PLACEHOLDER_RE.is_match(s.trim()),
        Value::Null => true,
        _ => false,
    }
}

fn count_filled_fields(lead: &LeadRecord) -> usize {
    lead.iter()
        .filter(|(key, value)| {
            !IGNORED_FIELDS.contains(&key.as_str())
                && !key.ends_with("_confidence")
                && !is_placeholder(value)
        })
        .count()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn normalize_phone(phone: &str) -> String {
    let dashed: String = phone
        .trim()
        .chars()
        .map(|c| match c {
            '\u{00AD}' | '\u{2010}'..='\u{2015}' => '-',
            c => c,
        })
        .collect();
    dashed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_text(value: &str) -> String {
    WS_RUN_RE.replace_all(value.trim(), " ").into_owned()
}
