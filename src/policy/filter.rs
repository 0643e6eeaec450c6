//! Policy filter
//!
//! Pure predicate over candidate actions: relationship bounds (follower
//! ceiling), blocked terms, and per-kind enablement percentages. No side
//! effects and no failure modes; a missing optional target field simply
//! skips that check.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::action::{Action, ActionKind};

/// Filtering rules applied to candidate actions' targets.
///
/// Loaded once at session start and read-only for the duration of a run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Master switch; when false every action is allowed through.
    pub enabled: bool,
    /// Reject targets whose author has more followers than this.
    pub max_followers: Option<u32>,
    /// Reject targets whose text contains any of these terms
    /// (case-insensitive substring match).
    #[serde(default)]
    pub blocked_terms: HashSet<String>,
    /// Per-kind enablement percentage (0-100). A kind absent from the map
    /// is always enabled. The gate is a deterministic hash of the target id
    /// so repeated evaluation of the same action agrees.
    #[serde(default)]
    pub kind_percentages: HashMap<ActionKind, u8>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_followers: None,
            blocked_terms: HashSet::new(),
            kind_percentages: HashMap::new(),
        }
    }
}

impl Policy {
    /// Policy that admits everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enable filtering with a follower ceiling.
    pub fn with_max_followers(mut self, max: u32) -> Self {
        self.enabled = true;
        self.max_followers = Some(max);
        self
    }

    /// Enable filtering with blocked terms.
    pub fn with_blocked_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled = true;
        self.blocked_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Enable filtering with a per-kind enablement percentage.
    pub fn with_kind_percentage(mut self, kind: ActionKind, percent: u8) -> Self {
        self.enabled = true;
        self.kind_percentages.insert(kind, percent.min(100));
        self
    }

    /// Whether this policy permits the given action.
    pub fn allows(&self, action: &Action) -> bool {
        if !self.enabled {
            return true;
        }

        if let (Some(count), Some(max)) = (action.target.follower_count, self.max_followers) {
            if count > max {
                trace!(
                    target_id = %action.target.id,
                    follower_count = count,
                    max_followers = max,
                    "policy rejected: follower ceiling"
                );
                return false;
            }
        }

        if let Some(text) = &action.target.text_snippet {
            let lowered = text.to_lowercase();
            for term in &self.blocked_terms {
                if lowered.contains(&term.to_lowercase()) {
                    trace!(
                        target_id = %action.target.id,
                        term = %term,
                        "policy rejected: blocked term"
                    );
                    return false;
                }
            }
        }

        if let Some(&percent) = self.kind_percentages.get(&action.kind) {
            if !passes_percentage_gate(&action.target.id, percent) {
                trace!(
                    target_id = %action.target.id,
                    kind = %action.kind,
                    percent,
                    "policy rejected: percentage gate"
                );
                return false;
            }
        }

        true
    }
}

/// Deterministic percentage gate keyed on the target id.
///
/// Hashing instead of sampling keeps the filter pure: the same action always
/// evaluates the same way within and across runs.
fn passes_percentage_gate(target_id: &str, percent: u8) -> bool {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    if percent >= 100 {
        return true;
    }
    if percent == 0 {
        return false;
    }

    let mut hasher = DefaultHasher::new();
    target_id.hash(&mut hasher);
    (hasher.finish() % 100) < u64::from(percent)
}
