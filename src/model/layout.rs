//! Per-page authoritative annotation lists.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::item::AnnotationItem;
use super::region::{RegionType, Role};

/// Layout of one paper: page index to the regions drawn on it.
///
/// Serializes as the backend's layout document, an object keyed by the page
/// index as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageLayouts {
    pages: BTreeMap<usize, Vec<AnnotationItem>>,
}

impl PageLayouts {
    pub fn page(&self, page: usize) -> &[AnnotationItem] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn page_mut(&mut self, page: usize) -> &mut Vec<AnnotationItem> {
        self.pages.entry(page).or_default()
    }

    /// Replace a page's list wholesale (undo, reload).
    pub fn set_page(&mut self, page: usize, items: Vec<AnnotationItem>) {
        if items.is_empty() {
            self.pages.remove(&page);
        } else {
            self.pages.insert(page, items);
        }
    }

    pub fn total_items(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    pub fn pages(&self) -> impl Iterator<Item = (usize, &[AnnotationItem])> {
        self.pages.iter().map(|(page, items)| (*page, items.as_slice()))
    }
}

/// Smallest positive id not used by any item of `region` in `items`.
pub fn next_free_id<'a>(
    region: RegionType,
    items: impl IntoIterator<Item = &'a AnnotationItem>,
) -> u32 {
    let used: BTreeSet<u32> = items
        .into_iter()
        .filter(|item| item.region == region)
        .map(|item| item.id)
        .collect();
    (1..).find(|id| !used.contains(id)).unwrap_or(1)
}

/// Two or more items sharing (type, role, id) on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCollision {
    pub region: RegionType,
    pub role: Role,
    pub id: u32,
    pub uuids: Vec<Uuid>,
}

impl IdCollision {
    pub fn describe(&self) -> String {
        format!(
            "{} {} ({}) is used by {} regions",
            self.region.display_name(),
            self.id,
            self.role.display_name(),
            self.uuids.len()
        )
    }
}

/// Report id collisions. These are warnings; the layout stays valid.
pub fn find_id_collisions(items: &[AnnotationItem]) -> Vec<IdCollision> {
    let mut groups: BTreeMap<(RegionType, Role, u32), Vec<Uuid>> = BTreeMap::new();
    for item in items {
        groups
            .entry((item.region, item.role, item.id))
            .or_default()
            .push(item.uuid);
    }

    groups
        .into_iter()
        .filter(|(_, uuids)| uuids.len() > 1)
        .map(|((region, role, id), uuids)| IdCollision {
            region,
            role,
            id,
            uuids,
        })
        .collect()
}
