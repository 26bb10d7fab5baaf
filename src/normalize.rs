//! Canonicalization of the label and version parts of a site context.
//!
//! Two inputs a user would consider "the same" (different Unicode forms,
//! stray whitespace, case, punctuation) must reach the salt as the same
//! token, otherwise every password derived from it silently changes.

use crate::salt::SALT_DELIMITER;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Label normalization steps. Each toggles independently; the order in which
/// enabled steps run is fixed (see [`normalize_label`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    pub unicode: bool,
    pub trim: bool,
    pub collapse_whitespace: bool,
    pub lowercase: bool,
    pub restrict_charset: bool,
    pub collapse_dashes: bool,
    pub trim_dashes: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            unicode: true,
            trim: true,
            collapse_whitespace: true,
            lowercase: true,
            restrict_charset: true,
            collapse_dashes: true,
            trim_dashes: true,
        }
    }
}

/// One step that actually altered the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub step_key: &'static str,
    pub title: &'static str,
    pub detail: String,
    pub before: String,
    pub after: String,
}

enum Normalized {
    Plain(String),
    Explained {
        text: String,
        changes: Vec<ChangeRecord>,
    },
}

struct Step {
    key: &'static str,
    title: &'static str,
    enabled: fn(&NormalizationConfig) -> bool,
    apply: fn(&str) -> String,
    describe: fn(&str, &str) -> String,
}

const STEPS: &[Step] = &[
    Step {
        key: "unicode",
        title: "Unicode compatibility form (NFKC)",
        enabled: |c| c.unicode,
        apply: |s| s.nfkc().collect(),
        describe: |before, after| {
            format!(
                "Canonicalized Unicode: {} -> {} characters",
                before.chars().count(),
                after.chars().count()
            )
        },
    },
    Step {
        key: "trim",
        title: "Trim whitespace",
        enabled: |c| c.trim,
        apply: |s| s.trim().to_string(),
        describe: |before, _| {
            let (lead, trail) = edge_counts(before, char::is_whitespace);
            format!("Removed {lead} leading and {trail} trailing whitespace character(s)")
        },
    },
    Step {
        key: "collapse_whitespace",
        title: "Whitespace to dash",
        enabled: |c| c.collapse_whitespace,
        apply: |s| replace_runs(s, char::is_whitespace),
        describe: |before, _| {
            let runs = count_runs(before, char::is_whitespace, 1);
            format!("Replaced {runs} whitespace run(s) with '-'")
        },
    },
    Step {
        key: "lowercase",
        title: "Lowercase",
        enabled: |c| c.lowercase,
        apply: |s| s.to_lowercase(),
        describe: |before, _| {
            let upper = before.chars().filter(|c| c.is_uppercase()).count();
            format!("Lowercased {upper} character(s)")
        },
    },
    Step {
        key: "restrict_charset",
        title: "Restrict character set",
        enabled: |c| c.restrict_charset,
        apply: |s| s.chars().map(|c| if is_allowed(c) { c } else { '-' }).collect(),
        describe: |before, _| {
            let replaced = before.chars().filter(|c| !is_allowed(*c)).count();
            format!("Replaced {replaced} disallowed character(s) with '-'")
        },
    },
    // Runs in place of the charset step when that one is off.
    Step {
        key: "salt_delimiter",
        title: "Remove salt delimiter",
        enabled: |c| !c.restrict_charset,
        apply: |s| s.replace(SALT_DELIMITER, "-"),
        describe: |before, _| {
            let found = before.chars().filter(|c| *c == SALT_DELIMITER).count();
            format!("Replaced {found} reserved delimiter character(s) with '-'")
        },
    },
    Step {
        key: "collapse_dashes",
        title: "Collapse dashes",
        enabled: |c| c.collapse_dashes,
        apply: |s| replace_runs(s, |c| c == '-'),
        describe: |before, _| {
            let runs = count_runs(before, |c| c == '-', 2);
            format!("Collapsed {runs} run(s) of repeated dashes")
        },
    },
    Step {
        key: "trim_dashes",
        title: "Trim dashes",
        enabled: |c| c.trim_dashes,
        apply: |s| s.trim_matches('-').to_string(),
        describe: |before, _| {
            let (lead, trail) = edge_counts(before, |c| c == '-');
            format!("Removed {lead} leading and {trail} trailing dash(es)")
        },
    },
];

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-')
}

/// Replaces every maximal run of matching characters with a single `-`.
fn replace_runs(s: &str, pred: fn(char) -> bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if pred(c) {
            if !in_run {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

fn count_runs(s: &str, pred: fn(char) -> bool, min_len: usize) -> usize {
    let mut runs = 0;
    let mut len = 0;
    for c in s.chars() {
        if pred(c) {
            len += 1;
            if len == min_len {
                runs += 1;
            }
        } else {
            len = 0;
        }
    }
    runs
}

fn edge_counts(s: &str, pred: fn(char) -> bool) -> (usize, usize) {
    let total = s.chars().count();
    let lead = s.chars().take_while(|c| pred(*c)).count();
    if lead == total {
        return (lead, 0);
    }
    let trail = s.chars().rev().take_while(|c| pred(*c)).count();
    (lead, trail)
}

fn run_pipeline(label: &str, config: &NormalizationConfig, explain: bool) -> Normalized {
    let mut text = label.to_string();
    let mut changes = Vec::new();

    for step in STEPS.iter().filter(|step| (step.enabled)(config)) {
        let next = (step.apply)(&text);
        if next != text {
            tracing::trace!(step = step.key, "label normalization step applied");
            if explain {
                changes.push(ChangeRecord {
                    step_key: step.key,
                    title: step.title,
                    detail: (step.describe)(&text, &next),
                    before: text.clone(),
                    after: next.clone(),
                });
            }
        }
        text = next;
    }

    if explain {
        Normalized::Explained { text, changes }
    } else {
        Normalized::Plain(text)
    }
}

/// Canonicalizes a label.
///
/// Enabled steps run in this order: NFKC, trim, whitespace runs to `-`,
/// lowercase, charset restriction to `[A-Za-z0-9._@-]`, dash collapse, dash
/// trim. The salt delimiter never survives, whatever the configuration.
pub fn normalize_label(label: &str, config: &NormalizationConfig) -> String {
    match run_pipeline(label, config, false) {
        Normalized::Plain(text) | Normalized::Explained { text, .. } => text,
    }
}

/// Same as [`normalize_label`], also returning what each step changed.
pub fn normalize_label_explained(
    label: &str,
    config: &NormalizationConfig,
) -> (String, Vec<ChangeRecord>) {
    match run_pipeline(label, config, true) {
        Normalized::Explained { text, changes } => (text, changes),
        Normalized::Plain(text) => (text, Vec::new()),
    }
}

/// Reduces a version string to `v<n>` where `n` is the first decimal number
/// found, or 1 when there is none or it is zero.
pub fn normalize_version(version: &str) -> String {
    let n = version
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .fold(None, |acc: Option<u64>, d| {
            Some(acc.unwrap_or(0).saturating_mul(10).saturating_add(u64::from(d)))
        })
        .unwrap_or(1)
        .max(1);
    format!("v{n}")
}
