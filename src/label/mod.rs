//! Domain, type, difficulty and tag labeling.

use crate::domain::{Difficulty, LabelStats, LabeledUnit, Labels, LabelingConfig, NormalizedUnit};
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeSet;

pub mod rules;

use rules::{
    LabelRule, ACRONYM, DIFFICULTY_HEURISTICS, DIFFICULTY_MARKERS, DOMAIN_RULES,
    DOMAIN_TAG_KEYWORDS, PLACEHOLDER, TYPE_RULES,
};

/// Fallback label when nothing matches.
pub const GENERAL: &str = "general";

/// Hard cap on tags per unit, whatever the config asks for.
pub const MAX_TAGS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct Labeler {
    config: LabelingConfig,
}

impl Labeler {
    pub fn new(config: LabelingConfig) -> Self {
        Self { config }
    }

    /// Label `content`. Everything but `labeled_at` depends only on the text.
    pub fn label(&self, content: &str) -> Labels {
        let domain = matched_labels(&DOMAIN_RULES, content);
        let types = matched_labels(&TYPE_RULES, content);
        let tags = self.tags(content, &domain);
        Labels {
            domain,
            types,
            difficulty: difficulty(content),
            tags,
            labeled_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn label_unit(&self, unit: NormalizedUnit) -> LabeledUnit {
        let labels = self.label(&unit.content);
        LabeledUnit { unit, labels }
    }

    /// Label every unit of every item in parallel, keeping the nesting.
    pub fn label_all(&self, items: Vec<Vec<NormalizedUnit>>) -> (Vec<Vec<LabeledUnit>>, LabelStats) {
        let labeled: Vec<Vec<LabeledUnit>> = items
            .into_par_iter()
            .map(|units| units.into_iter().map(|u| self.label_unit(u)).collect())
            .collect();

        let mut stats = LabelStats::default();
        for unit in labeled.iter().flatten() {
            stats.processed += 1;
            for domain in &unit.labels.domain {
                *stats.domains.entry(domain.clone()).or_insert(0) += 1;
            }
            for kind in &unit.labels.types {
                *stats.types.entry(kind.clone()).or_insert(0) += 1;
            }
            *stats.difficulty.entry(unit.labels.difficulty.as_str().to_string()).or_insert(0) += 1;
        }
        (labeled, stats)
    }

    fn tags(&self, content: &str, domains: &BTreeSet<String>) -> Vec<String> {
        let lowered = content.to_lowercase();
        let mut tags = BTreeSet::new();
        for (domain, keywords) in DOMAIN_TAG_KEYWORDS {
            if !domains.contains(*domain) {
                continue;
            }
            for keyword in *keywords {
                if contains_word(&lowered, keyword) {
                    tags.insert(keyword.to_string());
                }
            }
        }

        let unredacted = PLACEHOLDER.replace_all(content, " ");
        let mut acronyms = 0usize;
        for found in ACRONYM.find_iter(&unredacted) {
            if acronyms >= self.config.max_acronyms {
                break;
            }
            if tags.insert(found.as_str().to_string()) {
                acronyms += 1;
            }
        }

        tags.into_iter().take(self.config.max_tags.min(MAX_TAGS)).collect()
    }
}

fn matched_labels(table: &[LabelRule], content: &str) -> BTreeSet<String> {
    let mut labels: BTreeSet<String> =
        table.iter().filter(|rule| rule.matches(content)).map(|rule| rule.label.to_string()).collect();
    if labels.is_empty() {
        labels.insert(GENERAL.to_string());
    }
    labels
}

fn difficulty(content: &str) -> Difficulty {
    DIFFICULTY_MARKERS
        .iter()
        .chain(DIFFICULTY_HEURISTICS.iter())
        .find(|rule| rule.matches(content))
        .map_or(Difficulty::Intermediate, |rule| rule.level)
}

/// Whole-word containment on already-lowercased text.
fn contains_word(haystack: &str, word: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
