//! Subscribed authors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of `authors`.
///
/// `id` is what runs carry as `tweet_author_id`; `platform_id` is the
/// account identifier on the source platform (a DID on Bluesky).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorRecord {
    pub id: String,
    /// Lowercase platform name, e.g. "bluesky".
    pub platform: String,
    pub platform_id: String,
    pub name: String,
    /// Free-form background handed to the analysis workflow.
    pub author_context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuthorRecord {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        platform: &str,
        platform_id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            platform: platform.trim().to_lowercase(),
            platform_id: platform_id.into(),
            name: name.into(),
            author_context: None,
            created_at,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.author_context = Some(context.into());
        self
    }
}
