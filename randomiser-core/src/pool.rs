use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{Classification, ItemDefinition};
use crate::classes::ClassSet;
use crate::PlayerId;

/// Stable handle into an [`ItemPool`]. Stays valid (pointing at nothing)
/// after the entry is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EntryId(usize);

/// One item copy owned by one player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoolEntry {
    pub name: String,
    pub player: PlayerId,
    pub categories: Vec<String>,
    pub classes: ClassSet,
    pub classification: Classification,
}

impl PoolEntry {
    pub fn from_definition(def: &ItemDefinition, player: PlayerId) -> Self {
        Self {
            name: def.name.clone(),
            player,
            categories: def.categories.clone(),
            classes: def.classes,
            classification: def.classification,
        }
    }

    pub fn is_progression(&self) -> bool {
        self.classification.is_progression()
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Arena of pool entries for every player. Removal clears the slot, so any
/// list of [`EntryId`]s held elsewhere sees the removal immediately.
#[derive(Clone, Debug, Default)]
pub struct ItemPool {
    slots: Vec<Option<PoolEntry>>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PoolEntry) -> EntryId {
        self.slots.push(Some(entry));
        EntryId(self.slots.len() - 1)
    }

    pub fn get(&self, id: EntryId) -> Option<&PoolEntry> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: EntryId) -> Option<PoolEntry> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &PoolEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|entry| (EntryId(idx), entry)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntryId, &mut PoolEntry)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_mut().map(|entry| (EntryId(idx), entry)))
    }

    pub fn entries_for(&self, player: PlayerId) -> impl Iterator<Item = (EntryId, &PoolEntry)> {
        self.iter().filter(move |(_, entry)| entry.player == player)
    }

    /// First live entry of `player` with the given name.
    pub fn find(&self, player: PlayerId, name: &str) -> Option<EntryId> {
        self.entries_for(player)
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| id)
    }

    pub fn remove_named(&mut self, player: PlayerId, name: &str) -> Option<PoolEntry> {
        let id = self.find(player, name)?;
        self.remove(id)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn len_for(&self, player: PlayerId) -> usize {
        self.entries_for(player).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names_for(&self, player: PlayerId) -> Vec<&str> {
        self.entries_for(player)
            .map(|(_, entry)| entry.name.as_str())
            .collect()
    }
}

/// Items granted to each player before placement starts.
#[derive(Clone, Debug, Default)]
pub struct Precollected {
    by_player: BTreeMap<PlayerId, Vec<PoolEntry>>,
}

impl Precollected {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PoolEntry) {
        self.by_player.entry(entry.player).or_default().push(entry);
    }

    /// Move a live pool entry into the precollected list. Returns the item
    /// name, or `None` if the entry was already taken.
    pub fn take_from(&mut self, pool: &mut ItemPool, id: EntryId) -> Option<String> {
        let entry = pool.remove(id)?;
        let name = entry.name.clone();
        self.push(entry);
        Some(name)
    }

    pub fn for_player(&self, player: PlayerId) -> &[PoolEntry] {
        self.by_player
            .get(&player)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn names_for(&self, player: PlayerId) -> Vec<String> {
        self.for_player(player)
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_player.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
