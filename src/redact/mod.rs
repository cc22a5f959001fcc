//! Secret and PII scrubbing

pub mod redactor;
pub mod rules;

pub use redactor::{RedactionOutcome, Redactor, ScrubReport};
pub use rules::ScrubKind;
