//! Lead extraction engine for the LeadHarvest browser extension
//!
//! Pure, synchronous routines over a parsed HTML snapshot:
//! - Field type classification (value patterns, label keywords, link targets)
//! - Generalized selector generation for captured elements
//! - Repeating record pattern detection
//! - Template-driven lead extraction with type-targeted fallback
//! - Automatic field discovery for template training
//! - Post-extraction lead cleaning
//!
//! The surrounding extension (UI, storage, export, CRM sync) supplies
//! templates and page snapshots and consumes the extracted records.

pub mod autodetect;
pub mod classify;
pub mod cleaner;
pub mod extract;
pub mod patterns;
pub mod selector;
pub mod types;

pub use autodetect::{detect_fields, DetectedField};
pub use classify::{classify, Classifier, TypeSignature};
pub use cleaner::{clean_leads, CleanOptions, CleanOutcome, RemovedLead, RuleReport};
pub use extract::{extract, extract_html};
pub use patterns::detect_records;
pub use selector::generalize;
pub use types::{
    Classification, EngineError, FieldDefinition, FieldType, LeadRecord, Template,
};
