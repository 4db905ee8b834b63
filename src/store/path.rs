use std::{fmt::Display, str::FromStr};

use crate::error::StoreError;

const FORBIDDEN: [char; 5] = ['.', '$', '#', '[', ']'];

/// A slash-separated key path into the store. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            validate_segment(path, segment)?;
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        let mut child = self.clone();
        for part in segment.split('/').filter(|s| !s.is_empty()) {
            validate_segment(segment, part)?;
            child.segments.push(part.to_string());
        }
        Ok(child)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Non-strict: a path is an ancestor of itself.
    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }
}

fn validate_segment(path: &str, segment: &str) -> Result<(), StoreError> {
    if segment.contains(FORBIDDEN) {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "keys may not contain '.', '$', '#', '[' or ']'",
        });
    }
    if segment.chars().any(char::is_control) {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "keys may not contain control characters",
        });
    }
    Ok(())
}

impl FromStr for StorePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for StorePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}
