//! Tag model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest tag name accepted by the input bounds.
pub const TAG_NAME_MAX_CHARS: usize = 50;

/// A unique identifier for a tag. Opaque; assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TagId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(Error::InvalidInput("tag id must not be empty".into()))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// A named label for organizing notes; independent lifecycle from the notes
/// that reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Unique identifier
    pub id: TagId,
    /// Display name
    pub name: String,
    /// Display color (hex string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Updated on every successful mutation where tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Input for creating a tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TagDraft {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_tag_name(&self.name)
    }
}

/// Partial update for a tag; unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TagPatch {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidInput("update contains no fields".into()));
        }
        if let Some(name) = self.name.as_deref() {
            validate_tag_name(name)?;
        }
        Ok(())
    }
}

fn validate_tag_name(name: &str) -> Result<()> {
    let length = name.trim().chars().count();
    if length == 0 || length > TAG_NAME_MAX_CHARS {
        return Err(Error::InvalidInput(format!(
            "tag name must be 1-{TAG_NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_draft_validation_enforces_bounds() {
        assert!(TagDraft::new("work").validate().is_ok());
        assert!(TagDraft::new("   ").validate().is_err());
        assert!(TagDraft::new("x".repeat(51)).validate().is_err());
    }

    #[test]
    fn empty_tag_patch_is_rejected() {
        assert!(TagPatch::default().validate().is_err());
        assert!(TagPatch::default().with_name("renamed").validate().is_ok());
    }

    #[test]
    fn tag_wire_shape_is_camel_case() {
        let json = r##"{"id":"t1","name":"work","color":"#336699","createdAt":"2024-01-15T10:30:00Z"}"##;
        let tag: Tag = serde_json::from_str(json).unwrap();
        assert_eq!(tag.id.as_str(), "t1");
        assert_eq!(tag.color.as_deref(), Some("#336699"));
        assert!(tag.modified_at.is_none());
    }
}
