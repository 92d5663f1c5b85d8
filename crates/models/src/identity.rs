use serde::{Deserialize, Serialize};

/// Identifier used when an identity carries neither email nor subject.
pub const ANONYMOUS: &str = "anonymous";

/// The authenticated user as returned by `/accesos/me`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Identity {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self { email: Some(email.into()), ..Self::default() }
    }

    pub fn with_sub(sub: impl Into<String>) -> Self {
        Self { sub: Some(sub.into()), ..Self::default() }
    }

    /// Stable identifier for storage partitioning: email, then sub, then `anonymous`.
    /// Empty strings count as absent.
    pub fn partition_id(&self) -> &str {
        non_empty(&self.email)
            .or_else(|| non_empty(&self.sub))
            .unwrap_or(ANONYMOUS)
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}
