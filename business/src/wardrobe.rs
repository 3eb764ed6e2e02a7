//! Wardrobe browsing: one circular index per garment type.
//!
//! Each index ranges over `{None} ∪ items`, with None at position 0. Every
//! navigation persists the selection as the user's last-viewed preference in
//! the background; restoring from preferences never writes back.

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::data::{DataError, DataService};
use crate::models::{ClothingItem, ClothingType, PreferencesUpdate, UserPreferences};

/// Position in `{None, item 1, …, item n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclingIndex {
    index: usize,
    items: usize,
}

impl CyclingIndex {
    pub fn new(items: usize) -> Self {
        Self { index: 0, items }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Options including None.
    pub fn option_count(&self) -> usize {
        self.items + 1
    }

    /// Selected item position, `None` when the None option is showing.
    pub fn item_position(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.option_count();
    }

    pub fn previous(&mut self) {
        let n = self.option_count();
        self.index = (self.index + n - 1) % n;
    }

    /// Uniform over every option, None included.
    pub fn random<R: Rng>(&mut self, rng: &mut R) {
        self.index = rng.random_range(0..self.option_count());
    }

    pub fn select(&mut self, position: Option<usize>) {
        self.index = match position {
            Some(p) if p < self.items => p + 1,
            _ => 0,
        };
    }
}

/// Index a stored preference maps to.
///
/// `stored` is `None` without a preferences row, `Some(None)` when the row
/// recorded the None option.
fn restored_index(items: &[ClothingItem], stored: Option<Option<Uuid>>) -> usize {
    let first = usize::from(!items.is_empty());
    match stored {
        Some(None) => 0,
        Some(Some(id)) => items
            .iter()
            .position(|item| item.id == id)
            .map_or(first, |p| p + 1),
        None => first,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Top,
    Bottom,
}

/// The wardrobe screen's state for one user.
pub struct Wardrobe<D> {
    data: D,
    user_id: Uuid,
    tops: Vec<ClothingItem>,
    bottoms: Vec<ClothingItem>,
    top: CyclingIndex,
    bottom: CyclingIndex,
    pending: Vec<JoinHandle<()>>,
}

impl<D: DataService> Wardrobe<D> {
    /// Loads both garment lists and restores the last-viewed selection.
    pub async fn load(data: D, user_id: Uuid) -> Result<Self, DataError> {
        let (tops, bottoms, prefs) = tokio::try_join!(
            data.list_clothing_items(user_id, Some(ClothingType::Top)),
            data.list_clothing_items(user_id, Some(ClothingType::Bottom)),
            data.get_preferences(user_id),
        )?;

        let mut wardrobe = Self {
            data,
            user_id,
            top: CyclingIndex::new(tops.len()),
            bottom: CyclingIndex::new(bottoms.len()),
            tops,
            bottoms,
            pending: Vec::new(),
        };
        wardrobe.restore(prefs.as_ref());
        Ok(wardrobe)
    }

    fn restore(&mut self, prefs: Option<&UserPreferences>) {
        self.top.index = restored_index(&self.tops, prefs.map(|p| p.last_viewed_top_id));
        self.bottom.index = restored_index(&self.bottoms, prefs.map(|p| p.last_viewed_bottom_id));
    }

    /// Re-reads both lists, keeping the current selections when they still exist.
    pub async fn reload(&mut self) -> Result<(), DataError> {
        let (top_id, bottom_id) = (self.current_top_id(), self.current_bottom_id());
        let (tops, bottoms) = tokio::try_join!(
            self.data
                .list_clothing_items(self.user_id, Some(ClothingType::Top)),
            self.data
                .list_clothing_items(self.user_id, Some(ClothingType::Bottom)),
        )?;
        self.top = CyclingIndex::new(tops.len());
        self.bottom = CyclingIndex::new(bottoms.len());
        self.top
            .select(top_id.and_then(|id| tops.iter().position(|i| i.id == id)));
        self.bottom
            .select(bottom_id.and_then(|id| bottoms.iter().position(|i| i.id == id)));
        self.tops = tops;
        self.bottoms = bottoms;
        Ok(())
    }

    pub fn tops(&self) -> &[ClothingItem] {
        &self.tops
    }

    pub fn bottoms(&self) -> &[ClothingItem] {
        &self.bottoms
    }

    pub fn index(&self, slot: Slot) -> CyclingIndex {
        match slot {
            Slot::Top => self.top,
            Slot::Bottom => self.bottom,
        }
    }

    pub fn current_top(&self) -> Option<&ClothingItem> {
        self.top.item_position().and_then(|p| self.tops.get(p))
    }

    pub fn current_bottom(&self) -> Option<&ClothingItem> {
        self.bottom.item_position().and_then(|p| self.bottoms.get(p))
    }

    pub fn current_top_id(&self) -> Option<Uuid> {
        self.current_top().map(|item| item.id)
    }

    pub fn current_bottom_id(&self) -> Option<Uuid> {
        self.current_bottom().map(|item| item.id)
    }

    pub fn has_items(&self) -> bool {
        !self.tops.is_empty() || !self.bottoms.is_empty()
    }

    pub fn has_both_types(&self) -> bool {
        !self.tops.is_empty() && !self.bottoms.is_empty()
    }

    pub fn next(&mut self, slot: Slot) {
        self.slot_mut(slot).next();
        self.persist();
    }

    pub fn previous(&mut self, slot: Slot) {
        self.slot_mut(slot).previous();
        self.persist();
    }

    pub fn randomize(&mut self) {
        let mut rng = rand::rng();
        self.top.random(&mut rng);
        self.bottom.random(&mut rng);
        self.persist();
    }

    /// Jumps to the given items, e.g. after a suggestion. Unknown ids show None.
    pub fn select(&mut self, top_id: Option<Uuid>, bottom_id: Option<Uuid>) {
        let top = top_id.and_then(|id| self.tops.iter().position(|i| i.id == id));
        let bottom = bottom_id.and_then(|id| self.bottoms.iter().position(|i| i.id == id));
        self.top.select(top);
        self.bottom.select(bottom);
        self.persist();
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut CyclingIndex {
        match slot {
            Slot::Top => &mut self.top,
            Slot::Bottom => &mut self.bottom,
        }
    }

    /// Fire-and-forget preference write; failures are only logged.
    fn persist(&mut self) {
        self.pending.retain(|handle| !handle.is_finished());

        let data = self.data.clone();
        let update = PreferencesUpdate {
            user_id: self.user_id,
            last_viewed_top_id: self.current_top_id(),
            last_viewed_bottom_id: self.current_bottom_id(),
            updated_at: Utc::now(),
        };
        self.pending.push(tokio::spawn(async move {
            if let Err(err) = data.upsert_preferences(update).await {
                log::warn!("Failed to save last viewed outfit: {err}");
            }
        }));
    }

    /// Waits for outstanding preference writes.
    pub async fn settle(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(err) = handle.await {
                log::warn!("Preference write task failed: {err}");
            }
        }
    }
}
