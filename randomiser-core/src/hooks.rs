//! Lifecycle hooks, listed in the order the generator calls them.
//!
//! Every hook has a pass-through default. [`Tf2Hooks`] only overrides the
//! stages where this world does something.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;

use crate::adjust::adjust_classifications;
use crate::catalog::ItemConfig;
use crate::disabled::disabled_items;
use crate::pool::PoolEntry;
use crate::starting::{allocate_starting_items, Allocation};
use crate::state::OwnedItems;
use crate::{Multiworld, PlayerId, Result};

/// Per-player payload handed to the client after generation.
pub type SlotData = serde_json::Map<String, Value>;

/// Player -> location address -> extra hint text.
pub type HintData = BTreeMap<PlayerId, BTreeMap<u64, String>>;

pub trait WorldHooks {
    fn before_create_regions(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    /// Names of locations to drop from the player's regions.
    fn after_create_regions(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn before_create_items_all(
        &mut self,
        item_config: ItemConfig,
        _world: &Multiworld,
        _player: PlayerId,
    ) -> Result<ItemConfig> {
        Ok(item_config)
    }

    /// Runs with the full pool in place, before starting items are taken.
    fn before_create_items_starting(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    /// Item names to remove from the pool before filler is added. A name
    /// listed twice removes two copies.
    fn before_create_items_filler(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn after_create_items(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    fn before_set_rules(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    fn after_set_rules(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    fn before_create_item(&mut self, item_name: String, _world: &Multiworld, _player: PlayerId) -> Result<String> {
        Ok(item_name)
    }

    fn after_create_item(&mut self, item: PoolEntry, _world: &Multiworld, _player: PlayerId) -> Result<PoolEntry> {
        Ok(item)
    }

    fn before_generate_basic(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    fn after_generate_basic(&mut self, _world: &mut Multiworld, _player: PlayerId) -> Result<()> {
        Ok(())
    }

    /// Anything done here must be undone by `after_remove_item`.
    fn after_collect_item(&mut self, _state: &mut OwnedItems, _changed: bool, _item: &PoolEntry) {}

    fn after_remove_item(&mut self, _state: &mut OwnedItems, _changed: bool, _item: &PoolEntry) {}

    fn before_fill_slot_data(
        &mut self,
        slot_data: SlotData,
        _world: &Multiworld,
        _player: PlayerId,
    ) -> Result<SlotData> {
        Ok(slot_data)
    }

    fn after_fill_slot_data(
        &mut self,
        slot_data: SlotData,
        _world: &Multiworld,
        _player: PlayerId,
    ) -> Result<SlotData> {
        Ok(slot_data)
    }

    fn before_write_spoiler(&mut self, _world: &Multiworld, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn before_extend_hint_information(
        &mut self,
        _hint_data: &mut HintData,
        _world: &Multiworld,
        _player: PlayerId,
    ) {
    }

    fn after_extend_hint_information(
        &mut self,
        _hint_data: &mut HintData,
        _world: &Multiworld,
        _player: PlayerId,
    ) {
    }
}

/// Hooks for the TF2 world: demote disabled items, then draw the starting
/// inventory.
#[derive(Debug, Default)]
pub struct Tf2Hooks {
    allocations: BTreeMap<PlayerId, Allocation>,
}

impl Tf2Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocation(&self, player: PlayerId) -> Option<&Allocation> {
        self.allocations.get(&player)
    }
}

impl WorldHooks for Tf2Hooks {
    fn before_create_items_starting(&mut self, world: &mut Multiworld, player: PlayerId) -> Result<()> {
        let disabled = disabled_items(&world.options, player)?;
        adjust_classifications(&mut world.pool, player, &disabled);

        let allocation = allocate_starting_items(
            &mut world.pool,
            &mut world.precollected,
            &world.options,
            player,
            &mut world.rng,
        )?;
        self.allocations.insert(player, allocation);
        Ok(())
    }

    fn after_fill_slot_data(
        &mut self,
        mut slot_data: SlotData,
        _world: &Multiworld,
        player: PlayerId,
    ) -> Result<SlotData> {
        if let Some(allocation) = self.allocations.get(&player) {
            let classes: Vec<Value> = allocation
                .starting_classes
                .iter()
                .map(|class| Value::String(class.name().to_string()))
                .collect();
            slot_data.insert("starting_classes".to_string(), Value::Array(classes));
        }
        Ok(slot_data)
    }

    fn before_write_spoiler(&mut self, world: &Multiworld, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "Starting inventory:")?;
        for player in world.players() {
            writeln!(out, "  {} ({}):", world.slot_name(player), player)?;
            if let Some(allocation) = self.allocations.get(&player) {
                let classes: Vec<&str> = allocation.starting_classes.iter().map(|c| c.name()).collect();
                writeln!(out, "    Classes: {}", classes.join(", "))?;
            }
            for entry in world.precollected.for_player(player) {
                writeln!(out, "    {}", entry.name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::options::{OptionKey, Options, PlayerOptions};
    use crate::pool::tests::entry;

    struct Passthrough;
    impl WorldHooks for Passthrough {}

    fn world() -> Multiworld {
        let mut options = Options::new();
        let mut opts = PlayerOptions::new();
        opts.set_number(OptionKey::StartingClassCount, 2).unwrap();
        opts.set_toggle(OptionKey::GasPasser, false).unwrap();
        opts.set_slot_name("Blu");
        options.insert(PlayerId(1), opts);

        let mut world = Multiworld::new(Catalog::default(), options, 77);
        for class in crate::classes::ClassTag::ALL {
            let mut e = entry(class.name(), 1);
            e.categories = vec!["Class Unlock".to_string()];
            world.pool.push(e);
        }
        let mut gas = entry("Gas Passer", 1);
        gas.classification = crate::catalog::Classification::Progression;
        world.pool.push(gas);
        world
    }

    #[test]
    fn defaults_pass_everything_through() {
        let mut hooks = Passthrough;
        let mut world = world();
        let p = PlayerId(1);

        let config = vec![("Sandvich".to_string(), 2)];
        assert_eq!(hooks.before_create_items_all(config.clone(), &world, p).unwrap(), config);
        assert_eq!(hooks.before_create_item("Sandvich".into(), &world, p).unwrap(), "Sandvich");
        assert!(hooks.after_create_regions(&mut world, p).unwrap().is_empty());
        assert!(hooks.before_create_items_filler(&mut world, p).unwrap().is_empty());

        let before = world.pool.len();
        hooks.before_create_items_starting(&mut world, p).unwrap();
        assert_eq!(world.pool.len(), before);

        let mut slot = SlotData::new();
        slot.insert("x".into(), Value::Bool(true));
        assert_eq!(hooks.after_fill_slot_data(slot.clone(), &world, p).unwrap(), slot);
    }

    #[test]
    fn collect_and_remove_observers_are_inverse() {
        let mut hooks = Tf2Hooks::new();
        let mut state = OwnedItems::new();
        let item = entry("Jarate", 1);

        let snapshot = state.clone();
        hooks.after_collect_item(&mut state, true, &item);
        hooks.after_remove_item(&mut state, true, &item);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn tf2_starting_stage_demotes_then_allocates() {
        let mut hooks = Tf2Hooks::new();
        let mut world = world();
        let p = PlayerId(1);

        hooks.before_create_items_starting(&mut world, p).unwrap();

        let starting_classes = hooks.allocation(p).unwrap().starting_classes.clone();
        assert_eq!(starting_classes.len(), 2);
        assert_eq!(world.precollected.for_player(p).len(), 2);

        let gas = world.pool.find(p, "Gas Passer").and_then(|id| world.pool.get(id)).unwrap();
        assert_eq!(gas.classification, crate::catalog::Classification::Filler);

        let slot = hooks.after_fill_slot_data(SlotData::new(), &world, p).unwrap();
        assert_eq!(slot["starting_classes"].as_array().unwrap().len(), 2);

        let mut spoiler = Vec::new();
        hooks.before_write_spoiler(&world, &mut spoiler).unwrap();
        let text = String::from_utf8(spoiler).unwrap();
        assert!(text.contains("Blu (1):"));
        for class in &starting_classes {
            assert!(text.contains(class.name()));
        }
    }
}
