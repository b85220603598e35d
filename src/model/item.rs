//! The structured record of one user-drawn page region.

use bevy::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::region::{RegionType, Role};

/// A classified rectangle on a page, in page-logical coordinates.
///
/// `uuid` is the only stable key; `id` is user-facing and may collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationItem {
    /// `[min_x, min_y, max_x, max_y]`
    pub rect: [f32; 4],
    #[serde(rename = "type")]
    pub region: RegionType,
    pub id: u32,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "Uuid::new_v4", deserialize_with = "uuid_or_fresh")]
    pub uuid: Uuid,
}

impl AnnotationItem {
    /// Create an item with a fresh uuid from two arbitrary corners.
    pub fn new(region: RegionType, id: u32, role: Role, a: Vec2, b: Vec2) -> Self {
        Self {
            rect: normalized_rect(a, b),
            region,
            id,
            role,
            uuid: Uuid::new_v4(),
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.rect[0], self.rect[1])
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.rect[2], self.rect[3])
    }

    pub fn size(&self) -> Vec2 {
        self.max() - self.min()
    }

    pub fn center(&self) -> Vec2 {
        (self.min() + self.max()) / 2.0
    }

    pub fn set_corners(&mut self, a: Vec2, b: Vec2) {
        self.rect = normalized_rect(a, b);
    }

    /// Label text shown above the frame, e.g. `Figure 3 (Caption)`.
    pub fn label_text(&self) -> String {
        if self.region.supports_caption() && self.role == Role::Caption {
            format!("{} {} (Caption)", self.region.display_name(), self.id)
        } else {
            format!("{} {}", self.region.display_name(), self.id)
        }
    }
}

/// Normalize two corners into `[min_x, min_y, max_x, max_y]`.
pub fn normalized_rect(a: Vec2, b: Vec2) -> [f32; 4] {
    let min = a.min(b);
    let max = a.max(b);
    [min.x, min.y, max.x, max.y]
}

/// Legacy layouts carry no uuid (or an empty one); those get a fresh identity.
fn uuid_or_fresh<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityInputError {
    #[error("id must not be empty")]
    Empty,
    #[error("id must be a positive whole number, got {0:?}")]
    NotANumber(String),
    #[error("id must be greater than zero")]
    Zero,
}

/// Validate a user-typed id before it reaches the editor.
pub fn parse_identity_input(raw: &str) -> Result<u32, IdentityInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentityInputError::Empty);
    }
    let value: u32 = trimmed
        .parse()
        .map_err(|_| IdentityInputError::NotANumber(trimmed.to_string()))?;
    if value == 0 {
        return Err(IdentityInputError::Zero);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalized_regardless_of_drag_direction() {
        let item = AnnotationItem::new(
            RegionType::Table,
            2,
            Role::Body,
            Vec2::new(50.0, 40.0),
            Vec2::new(10.0, 10.0),
        );
        assert_eq!(item.rect, [10.0, 10.0, 50.0, 40.0]);
        assert_eq!(item.size(), Vec2::new(40.0, 30.0));
        assert_eq!(item.center(), Vec2::new(30.0, 25.0));
    }

    #[test]
    fn test_label_text() {
        let mut item = AnnotationItem::new(
            RegionType::Figure,
            3,
            Role::Body,
            Vec2::ZERO,
            Vec2::splat(10.0),
        );
        assert_eq!(item.label_text(), "Figure 3");
        item.role = Role::Caption;
        assert_eq!(item.label_text(), "Figure 3 (Caption)");

        let equation = AnnotationItem::new(
            RegionType::Equation,
            1,
            Role::Caption,
            Vec2::ZERO,
            Vec2::splat(10.0),
        );
        assert_eq!(equation.label_text(), "Equation 1");
    }

    #[test]
    fn test_legacy_item_without_uuid_gets_one() {
        let json = r#"{"rect":[1,2,30,40],"type":"Figure","id":4,"role":"Caption"}"#;
        let item: AnnotationItem = serde_json::from_str(json).unwrap();
        assert!(!item.uuid.is_nil());
        assert_eq!(item.role, Role::Caption);
        assert_eq!(item.rect, [1.0, 2.0, 30.0, 40.0]);

        let empty = r#"{"rect":[0,0,9,9],"type":"Mask","id":1,"uuid":""}"#;
        let item: AnnotationItem = serde_json::from_str(empty).unwrap();
        assert!(!item.uuid.is_nil());
        assert_eq!(item.role, Role::Body);
    }

    #[test]
    fn test_uuid_survives_serialization() {
        let item = AnnotationItem::new(
            RegionType::Title,
            1,
            Role::Body,
            Vec2::ZERO,
            Vec2::splat(20.0),
        );
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"Title\""));
        let parsed: AnnotationItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_parse_identity_input() {
        assert_eq!(parse_identity_input(" 7 "), Ok(7));
        assert_eq!(parse_identity_input(""), Err(IdentityInputError::Empty));
        assert_eq!(
            parse_identity_input("abc"),
            Err(IdentityInputError::NotANumber("abc".to_string()))
        );
        assert_eq!(parse_identity_input("0"), Err(IdentityInputError::Zero));
        assert!(parse_identity_input("-1").is_err());
    }
}
