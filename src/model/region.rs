use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Category of a drawn page region. Fixed at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionType {
    Figure,
    Table,
    Equation,
    Algorithm,
    Title,
    Author,
    Mask,
    SectionHeader,
    ContentArea,
}

impl RegionType {
    /// Every region type in keyboard order (digit 1 selects the first).
    pub fn all() -> &'static [RegionType] {
        &[
            RegionType::Figure,
            RegionType::Table,
            RegionType::Equation,
            RegionType::Algorithm,
            RegionType::Title,
            RegionType::Author,
            RegionType::Mask,
            RegionType::SectionHeader,
            RegionType::ContentArea,
        ]
    }

    /// Region type bound to a 1-based shortcut index.
    pub fn from_shortcut_index(index: usize) -> Option<RegionType> {
        index.checked_sub(1).and_then(|i| Self::all().get(i).copied())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RegionType::Figure => "Figure",
            RegionType::Table => "Table",
            RegionType::Equation => "Equation",
            RegionType::Algorithm => "Algorithm",
            RegionType::Title => "Title",
            RegionType::Author => "Author",
            RegionType::Mask => "Mask",
            RegionType::SectionHeader => "Section",
            RegionType::ContentArea => "Content",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            RegionType::Figure => Color::srgb(0.90, 0.30, 0.24),
            RegionType::Table => Color::srgb(0.20, 0.60, 0.86),
            RegionType::Equation => Color::srgb(0.61, 0.35, 0.71),
            RegionType::Algorithm => Color::srgb(0.95, 0.61, 0.07),
            RegionType::Title => Color::srgb(0.15, 0.68, 0.38),
            RegionType::Author => Color::srgb(0.09, 0.63, 0.52),
            RegionType::Mask => Color::srgb(0.40, 0.40, 0.40),
            RegionType::SectionHeader => Color::srgb(0.83, 0.33, 0.55),
            RegionType::ContentArea => Color::srgb(0.16, 0.50, 0.73),
        }
    }

    /// Types that come as a body/caption pair.
    pub fn supports_caption(&self) -> bool {
        matches!(
            self,
            RegionType::Figure | RegionType::Table | RegionType::Algorithm
        )
    }

    /// At most one region of this type may exist per page.
    pub fn is_page_singleton(&self) -> bool {
        matches!(self, RegionType::ContentArea)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Role {
    #[default]
    Body,
    Caption,
}

impl Role {
    pub fn toggled(self) -> Role {
        match self {
            Role::Body => Role::Caption,
            Role::Caption => Role::Body,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Body => "Body",
            Role::Caption => "Caption",
        }
    }
}
