//! Tag normalization, the per-item tag editor, and the storage screen filter.

use std::collections::BTreeSet;

use crate::models::ClothingItem;

/// Trimmed and lowercased; `None` when nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Normalizes every tag and drops repeats, keeping first-seen order.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.into_iter().filter_map(|t| normalize_tag(t.as_ref())) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Editable tag list for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEditor {
    tags: Vec<String>,
}

impl TagEditor {
    pub fn new<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: normalize_tags(existing),
        }
    }

    /// Returns false when the tag was blank or already present.
    pub fn add(&mut self, raw: &str) -> bool {
        match normalize_tag(raw) {
            Some(tag) if !self.tags.contains(&tag) => {
                self.tags.push(tag);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, raw: &str) -> bool {
        let Some(tag) = normalize_tag(raw) else {
            return false;
        };
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        self.tags.len() != before
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn into_tags(self) -> Vec<String> {
        self.tags
    }
}

/// Every tag used across `items`, unique and sorted.
pub fn all_tags<'a>(items: impl IntoIterator<Item = &'a ClothingItem>) -> Vec<String> {
    items
        .into_iter()
        .flat_map(|item| item.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Selected tags on the storage screen; an item must carry all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    selected: BTreeSet<String>,
}

impl TagFilter {
    pub fn new<I, S>(selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            selected: normalize_tags(selected).into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn matches(&self, item: &ClothingItem) -> bool {
        self.selected.iter().all(|tag| item.tags.contains(tag))
    }
}
