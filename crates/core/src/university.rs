//! University context.

use serde::{Deserialize, Serialize};
use crate::id::UniversityId;

/// An institution surveys can be linked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    /// Unique identifier
    pub id: UniversityId,

    /// Name
    pub name: String,

    /// Region
    #[serde(default)]
    pub region: String,

    /// Member count
    #[serde(default, alias = "studentCount")]
    pub member_count: u32,

    /// UI decoration color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_color: Option<String>,

    /// Vision / mission statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
}

impl University {
    /// Create a university without a vision statement.
    pub fn new(name: impl Into<String>, region: impl Into<String>, member_count: u32) -> Self {
        Self {
            id: UniversityId::new(),
            name: name.into(),
            region: region.into(),
            member_count,
            logo_color: None,
            vision: None,
        }
    }

    /// Set the vision statement.
    pub fn with_vision(mut self, vision: impl Into<String>) -> Self {
        self.vision = Some(vision.into());
        self
    }

    /// The vision statement, if present and not blank.
    pub fn vision_statement(&self) -> Option<&str> {
        self.vision
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_vision_is_absent() {
        let u = University::new("Hanbit", "Seoul", 12000).with_vision("   ");
        assert_eq!(u.vision_statement(), None);

        let u = u.with_vision(" Global creative talent ");
        assert_eq!(u.vision_statement(), Some("Global creative talent"));
    }
}
