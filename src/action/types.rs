//! Core action types
//!
//! An `Action` is one discrete remote operation the scheduler may perform.
//! Actions are immutable once created: a stream source produces them and the
//! scheduler consumes each exactly once.

/// The kind of remote operation an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Like,
    Comment,
    Follow,
    Favorite,
    Post,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::Like => "like",
            ActionKind::Comment => "comment",
            ActionKind::Follow => "follow",
            ActionKind::Favorite => "favorite",
            ActionKind::Post => "post",
        };
        f.write_str(name)
    }
}

/// Minimal view of the entity an action targets.
///
/// Carries only the attributes the policy filter needs; the remote client
/// owns the full entity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    /// Remote identifier of the target (post id, username, tweet id, ...).
    pub id: String,
    /// Follower count of the target's author, when known.
    pub follower_count: Option<u32>,
    /// Text attached to the target (caption, tweet body), when known.
    pub text_snippet: Option<String>,
}

impl TargetRef {
    /// Create a target with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            follower_count: None,
            text_snippet: None,
        }
    }

    /// Attach a follower count.
    pub fn with_followers(mut self, count: u32) -> Self {
        self.follower_count = Some(count);
        self
    }

    /// Attach a text snippet.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_snippet = Some(text.into());
        self
    }
}

/// One candidate remote operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub kind: ActionKind,
    pub target: TargetRef,
    /// Text body for kinds that send content (comment, post).
    pub payload: Option<String>,
}

impl Action {
    /// Create an action with no payload.
    pub fn new(kind: ActionKind, target: TargetRef) -> Self {
        Self {
            kind,
            target,
            payload: None,
        }
    }

    pub fn like(target: TargetRef) -> Self {
        Self::new(ActionKind::Like, target)
    }

    pub fn comment(target: TargetRef, text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Comment,
            target,
            payload: Some(text.into()),
        }
    }

    pub fn follow(target: TargetRef) -> Self {
        Self::new(ActionKind::Follow, target)
    }

    pub fn favorite(target: TargetRef) -> Self {
        Self::new(ActionKind::Favorite, target)
    }

    pub fn post(target: TargetRef, text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Post,
            target,
            payload: Some(text.into()),
        }
    }
}
