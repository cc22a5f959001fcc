//! Redactor implementation

use crate::redact::rules::{
    sensitive_key_kind, RedactionRule, ScrubKind, API_KEY_PLACEHOLDER, DEFAULT_RULES,
    PASSWORD_PLACEHOLDER,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Which rules fired, and how often.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrubReport {
    pub counts: BTreeMap<String, usize>,
    pub kinds: BTreeSet<ScrubKind>,
}

impl ScrubReport {
    fn record(&mut self, name: &str, kind: ScrubKind, times: usize) {
        if times == 0 {
            return;
        }
        *self.counts.entry(name.to_string()).or_insert(0) += times;
        self.kinds.insert(kind);
    }

    fn merge(&mut self, other: ScrubReport) {
        for (name, count) in other.counts {
            *self.counts.entry(name).or_insert(0) += count;
        }
        self.kinds.extend(other.kinds);
    }

    pub fn is_clean(&self) -> bool {
        self.kinds.is_empty()
    }
}

pub struct RedactionOutcome {
    pub content: String,
    pub report: ScrubReport,
}

pub struct Redactor {
    rules: Vec<RedactionRule>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Redactor {
    pub fn new() -> Self {
        Self { rules: DEFAULT_RULES.clone() }
    }

    /// Apply every rule in order to `text`.
    pub fn redact_report(&self, text: &str) -> RedactionOutcome {
        let mut report = ScrubReport::default();
        let mut output = text.to_string();
        for rule in &self.rules {
            let mut replaced = 0usize;
            let next = rule.pattern.replace_all(&output, |caps: &regex::Captures<'_>| {
                replaced += 1;
                let mut expanded = String::new();
                caps.expand(rule.replacement, &mut expanded);
                expanded
            });
            // Whitespace rules can "replace" a match with identical text; only count real edits.
            if replaced > 0 && next != output {
                report.record(rule.name, rule.kind, replaced);
                output = next.into_owned();
            }
        }
        RedactionOutcome { content: output, report }
    }

    /// Recursively scrub a JSON value. Mapping keys that name a secret have
    /// their scalar value replaced wholesale.
    pub fn redact_value(&self, value: &Value) -> (Value, ScrubReport) {
        let mut report = ScrubReport::default();
        let scrubbed = self.walk(value, &mut report);
        (scrubbed, report)
    }

    fn walk(&self, value: &Value, report: &mut ScrubReport) -> Value {
        match value {
            Value::String(s) => {
                let outcome = self.redact_report(s);
                report.merge(outcome.report);
                Value::String(outcome.content)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.walk(v, report)).collect()),
            Value::Object(map) => Value::Object(self.walk_map(map, report)),
            other => other.clone(),
        }
    }

    pub(crate) fn walk_map(&self, map: &Map<String, Value>, report: &mut ScrubReport) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in map {
            let replaced = sensitive_key_kind(key).and_then(|kind| redact_secret_scalar(value, kind));
            match replaced {
                Some((placeholder, kind)) => {
                    report.record("sensitive_key", kind, 1);
                    out.insert(key.clone(), placeholder);
                }
                None => {
                    out.insert(key.clone(), self.walk(value, report));
                }
            }
        }
        out
    }
}

fn redact_secret_scalar(value: &Value, kind: ScrubKind) -> Option<(Value, ScrubKind)> {
    let placeholder = match kind {
        ScrubKind::Password => PASSWORD_PLACEHOLDER,
        _ => API_KEY_PLACEHOLDER,
    };
    match value {
        Value::String(s) if !s.is_empty() && !s.starts_with('[') => {
            Some((Value::String(placeholder.to_string()), kind))
        }
        Value::Number(_) => Some((Value::String(placeholder.to_string()), kind)),
        _ => None,
    }
}
