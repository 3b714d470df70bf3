use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::{PlayerId, Result};

/// Read-only view of what each player currently owns. The host keeps the
/// real state; rules only ask questions of it.
pub trait CollectionState {
    fn count(&self, item: &str, player: PlayerId) -> u32;

    fn has(&self, item: &str, player: PlayerId) -> bool {
        self.count(item, player) > 0
    }
}

/// Plain multiset of owned item names per player.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OwnedItems {
    counts: BTreeMap<PlayerId, HashMap<String, u32>>,
}

impl OwnedItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, player: PlayerId, item: &str) {
        *self
            .counts
            .entry(player)
            .or_default()
            .entry(item.to_string())
            .or_insert(0) += 1;
    }

    /// Returns false if the player did not own the item.
    pub fn remove(&mut self, player: PlayerId, item: &str) -> bool {
        let Some(items) = self.counts.get_mut(&player) else {
            return false;
        };
        match items.get_mut(item) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                items.remove(item);
                true
            }
            None => false,
        }
    }

    /// Owned-items file: JSON object of player number to item name list.
    pub fn load_lists(path: &Path) -> Result<BTreeMap<PlayerId, Vec<String>>> {
        let src = fs::read_to_string(path)?;
        let raw: BTreeMap<u32, Vec<String>> = serde_json::from_str(&src)?;
        Ok(raw
            .into_iter()
            .map(|(player, names)| (PlayerId(player), names))
            .collect())
    }
}

impl CollectionState for OwnedItems {
    fn count(&self, item: &str, player: PlayerId) -> u32 {
        self.counts
            .get(&player)
            .and_then(|items| items.get(item))
            .copied()
            .unwrap_or(0)
    }
}
