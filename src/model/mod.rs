//! Annotation data model shared by the editor, the document and the pipeline.
//!
//! - [`region`] - Region categories and body/caption roles
//! - [`item`] - [`AnnotationItem`], rect normalization, id input validation
//! - [`layout`] - Per-page lists ([`PageLayouts`]), id allocation, collision checks

mod item;
mod layout;
mod region;

pub use item::{AnnotationItem, IdentityInputError, parse_identity_input};
pub use layout::{IdCollision, PageLayouts, find_id_collisions, next_free_id};
pub use region::{RegionType, Role};
