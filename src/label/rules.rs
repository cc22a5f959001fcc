//! Classification rule tables.
//!
//! Tables are ordered `(label, patterns)` data. Patterns are compiled
//! case-insensitive with fancy-regex, so look-around is allowed.

use crate::domain::Difficulty;
use fancy_regex::Regex;
use once_cell::sync::Lazy;

pub struct LabelRule {
    pub label: &'static str,
    pub patterns: Vec<Regex>,
}

impl LabelRule {
    fn new(label: &'static str, patterns: &[&str]) -> Self {
        Self { label, patterns: patterns.iter().map(|p| compile(p)).collect() }
    }

    pub fn matches(&self, content: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(content).unwrap_or(false))
    }
}

pub struct DifficultyRule {
    pub level: Difficulty,
    pub patterns: Vec<Regex>,
}

impl DifficultyRule {
    fn new(level: Difficulty, patterns: &[&str]) -> Self {
        Self { level, patterns: patterns.iter().map(|p| compile(p)).collect() }
    }

    pub fn matches(&self, content: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(content).unwrap_or(false))
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("valid regex")
}

pub static DOMAIN_RULES: Lazy<Vec<LabelRule>> = Lazy::new(|| {
    vec![
        LabelRule::new(
            "kubernetes",
            &[
                r"\bkubernetes\b",
                r"\bk8s\b",
                r"\bkubectl\b",
                r"\bpods?\b",
                r"\bhelm\b",
                r"\bcrashloopbackoff\b",
                r"\bkubelet\b",
                r"\bconfigmaps?\b",
                r"\bingress\b",
            ],
        ),
        LabelRule::new(
            "docker",
            &[r"\bdocker(file)?\b", r"\bcontainer images?\b", r"\bdocker-compose\b", r"\bpodman\b"],
        ),
        LabelRule::new(
            "cloud",
            &[r"\baws\b", r"\bazure\b", r"\bgcp\b", r"\bs3 buckets?\b", r"\bec2\b", r"\blambda functions?\b", r"\bcloudformation\b"],
        ),
        LabelRule::new(
            "security",
            &[
                r"\bvulnerabilit(y|ies)\b",
                r"\bcve-\d{4}-\d+\b",
                r"\bxss\b",
                r"\bsql injection\b",
                r"\bauthenticat(e|ion)\b",
                r"\bencrypt(ion|ed)?\b",
                r"\bbandit\b",
                r"\bsemgrep\b",
            ],
        ),
        LabelRule::new(
            "python",
            &[r"\bpython3?\b", r"\bpip install\b", r"\bdjango\b", r"\bflask\b", r"\bfastapi\b", r"\bpytest\b", r"\bdef \w+\("],
        ),
        LabelRule::new(
            "rust",
            &[r"\brust(c|up)?\b(?!y)", r"\bcargo\b", r"\bcrates?\.io\b", r"\bborrow checker\b", r"\bfn \w+\("],
        ),
        LabelRule::new(
            "javascript",
            &[r"\bjavascript\b", r"\btypescript\b", r"\bnode\.?js\b", r"\bnpm\b", r"\breact\b", r"\bwebpack\b"],
        ),
        LabelRule::new(
            "database",
            &[r"\bpostgres(ql)?\b", r"\bmysql\b", r"\bsqlite\b", r"\bmongodb\b", r"\bredis\b", r"\bselect .+ from\b", r"\bschema migrations?\b"],
        ),
        LabelRule::new(
            "networking",
            &[r"\bdns\b", r"\btcp\b", r"\bhttps?\b(?!://)", r"\bload balancers?\b", r"\bfirewall\b", r"\bproxy\b", r"\btls\b"],
        ),
        LabelRule::new(
            "devops",
            &[r"\bci/cd\b", r"\bpipelines?\b", r"\bterraform\b", r"\bansible\b", r"\bgithub actions\b", r"\bjenkins\b"],
        ),
        LabelRule::new(
            "monitoring",
            &[r"\bprometheus\b", r"\bgrafana\b", r"\bobservability\b", r"\bdashboards?\b", r"\balerting\b", r"\bopentelemetry\b"],
        ),
        LabelRule::new(
            "machine_learning",
            &[r"\bmachine learning\b", r"\bembeddings?\b", r"\bllms?\b", r"\bfine-?tun(e|ing)\b", r"\bneural network\b", r"\bvector stores?\b"],
        ),
    ]
});

pub static TYPE_RULES: Lazy<Vec<LabelRule>> = Lazy::new(|| {
    vec![
        LabelRule::new(
            "troubleshooting",
            &[
                r"\berror\b",
                r"\bcrash",
                r"\bhow to fix\b",
                r"\bexceptions?\b",
                r"\bstack ?trace\b",
                r"\btraceback\b",
                r"\bfail(ed|ing|ure)\b",
                r"\bworkaround\b",
                r"\broot cause\b",
            ],
        ),
        LabelRule::new(
            "tutorial",
            &[r"\bhow to\b(?! fix)", r"\btutorial\b", r"\bstep \d+\b", r"\bwalkthrough\b", r"\bguide\b"],
        ),
        LabelRule::new(
            "reference",
            &[r"\breference\b", r"\bparameters?\b", r"\bsyntax\b", r"\bcheat ?sheet\b", r"\bapi docs?\b"],
        ),
        LabelRule::new(
            "concept",
            &[r"\bwhat is\b", r"\boverview\b", r"\bconcepts?\b", r"\barchitecture\b", r"\bexplain(s|ed)?\b"],
        ),
        LabelRule::new(
            "best_practice",
            &[r"\bbest practices?\b", r"\brecommend(ed|ation)?\b", r"\banti-?patterns?\b", r"\bshould (always|never)\b"],
        ),
        LabelRule::new("code_example", &[r"```", r"\bexample:", r"\bsnippet\b"]),
        LabelRule::new(
            "finding",
            &[r"\bfindings?\b", r"\bseverity\b", r"\bcve-\d{4}-\d+\b", r"\bremediation\b"],
        ),
        LabelRule::new(
            "meeting_notes",
            &[r"\bmeeting\b", r"\baction items?\b", r"\battendees\b", r"\bminutes\b(?! ago)"],
        ),
    ]
});

/// Explicit markers, checked advanced, then beginner, then intermediate.
pub static DIFFICULTY_MARKERS: Lazy<Vec<DifficultyRule>> = Lazy::new(|| {
    vec![
        DifficultyRule::new(
            Difficulty::Advanced,
            &[r"\badvanced\b", r"\bexpert\b", r"\bdeep dive\b", r"\binternals\b", r"\bin-depth\b"],
        ),
        DifficultyRule::new(
            Difficulty::Beginner,
            &[r"\bbeginners?\b", r"\bbasics\b", r"\bnewcomers?\b", r"\bfor dummies\b", r"\beli5\b"],
        ),
        DifficultyRule::new(Difficulty::Intermediate, &[r"\bintermediate\b"]),
    ]
});

/// Fallback keyword buckets when no explicit marker is present.
pub static DIFFICULTY_HEURISTICS: Lazy<Vec<DifficultyRule>> = Lazy::new(|| {
    vec![
        DifficultyRule::new(
            Difficulty::Advanced,
            &[r"\bproduction\b", r"\benterprise\b", r"\bat scale\b", r"\bhigh availability\b", r"\bdistributed\b"],
        ),
        DifficultyRule::new(
            Difficulty::Beginner,
            &[r"\bgetting started\b", r"\bintroduction\b", r"\bhello world\b", r"\bfirst steps\b", r"\bquick ?start\b"],
        ),
    ]
});

/// Tag keywords per domain. Only consulted for domains that matched.
pub static DOMAIN_TAG_KEYWORDS: &[(&str, &[&str])] = &[
    ("kubernetes", &["pod", "deployment", "helm", "kubectl", "ingress", "namespace", "crashloopbackoff", "configmap"]),
    ("docker", &["dockerfile", "image", "volume", "compose", "registry"]),
    ("cloud", &["aws", "azure", "gcp", "s3", "ec2", "lambda", "iam"]),
    ("security", &["vulnerability", "cve", "xss", "injection", "encryption", "authentication"]),
    ("python", &["django", "flask", "fastapi", "pytest", "pip", "asyncio"]),
    ("rust", &["cargo", "tokio", "serde", "borrow", "lifetime"]),
    ("javascript", &["react", "node", "npm", "typescript", "webpack"]),
    ("database", &["postgres", "mysql", "sqlite", "redis", "index", "migration"]),
    ("networking", &["dns", "tcp", "tls", "proxy", "firewall"]),
    ("devops", &["terraform", "ansible", "jenkins", "pipeline"]),
    ("monitoring", &["prometheus", "grafana", "dashboard", "alerting"]),
    ("machine_learning", &["embedding", "llm", "fine-tuning", "model"]),
];

/// Verbatim all-caps acronyms, 2-6 letters. Case-sensitive.
pub static ACRONYM: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\b[A-Z]{2,6}\b").expect("valid regex"));

/// Bracketed redaction placeholders such as `[USER]` or `[EMAIL_REDACTED]`.
/// Never a source of acronym tags.
pub static PLACEHOLDER: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\[[A-Z][A-Z0-9_]*\]").expect("valid regex"));

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(table: &[LabelRule], content: &str) -> Vec<&'static str> {
        table.iter().filter(|r| r.matches(content)).map(|r| r.label).collect()
    }

    #[test]
    fn every_pattern_compiles() {
        assert!(!DOMAIN_RULES.is_empty());
        assert!(!TYPE_RULES.is_empty());
        assert_eq!(DIFFICULTY_MARKERS.len(), 3);
        assert_eq!(DIFFICULTY_HEURISTICS.len(), 2);
    }

    #[test]
    fn tutorial_lookahead_skips_how_to_fix() {
        assert_eq!(labels(&TYPE_RULES, "How to fix a broken build"), vec!["troubleshooting"]);
        assert_eq!(labels(&TYPE_RULES, "How to deploy the service"), vec!["tutorial"]);
    }

    #[test]
    fn domains_are_case_insensitive() {
        assert_eq!(labels(&DOMAIN_RULES, "Run KUBECTL get pods"), vec!["kubernetes"]);
        assert_eq!(labels(&DOMAIN_RULES, "bump the Cargo.lock"), vec!["rust"]);
        assert!(labels(&DOMAIN_RULES, "rusty hinges").is_empty());
    }

    #[test]
    fn every_domain_has_tag_keywords() {
        for rule in DOMAIN_RULES.iter() {
            assert!(
                DOMAIN_TAG_KEYWORDS.iter().any(|(domain, _)| *domain == rule.label),
                "no tag keywords for {}",
                rule.label
            );
        }
    }
}
