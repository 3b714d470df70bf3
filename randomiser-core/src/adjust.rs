use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::Classification;
use crate::pool::ItemPool;
use crate::PlayerId;

/// Consumables that drop all the way to filler when their checks are off.
pub const FILLER_WHEN_DISABLED: &[&str] = &["Gas Passer", "Red-Tape Recorder"];

/// Strip progression weight from the player's disabled items. Entries stay
/// in the pool in their original order; only the classification changes.
///
/// Must run before starting items are drawn, because the weapon buckets
/// read the live progression flag.
pub fn adjust_classifications(pool: &mut ItemPool, player: PlayerId, disabled: &BTreeSet<String>) -> usize {
    let mut changed = 0usize;

    for (_, entry) in pool.iter_mut() {
        if entry.player != player || !disabled.contains(&entry.name) {
            continue;
        }

        let demoted = if FILLER_WHEN_DISABLED.contains(&entry.name.as_str()) {
            Classification::Filler
        } else {
            Classification::Useful
        };
        if entry.classification != demoted {
            entry.classification = demoted;
            changed += 1;
        }
    }

    debug!(%player, changed, "demoted disabled items");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disabled::{disabled_items_for, DISABLED_ITEMS_BY_OPTION};
    use crate::options::PlayerOptions;
    use crate::pool::tests::entry;

    fn progression(name: &str, player: u32) -> crate::pool::PoolEntry {
        let mut e = entry(name, player);
        e.classification = Classification::Progression;
        e
    }

    #[test]
    fn every_disabled_item_is_demoted() {
        let mut pool = ItemPool::new();
        for (_, items) in DISABLED_ITEMS_BY_OPTION {
            for name in items.iter() {
                pool.push(progression(name, 1));
            }
        }
        pool.push(progression("Scattergun", 1));

        let mut opts = PlayerOptions::new();
        for (key, _) in DISABLED_ITEMS_BY_OPTION {
            opts.set_toggle(*key, false).unwrap();
        }
        let disabled = disabled_items_for(&opts);
        adjust_classifications(&mut pool, PlayerId(1), &disabled);

        for (_, e) in pool.iter() {
            if e.name == "Scattergun" {
                assert_eq!(e.classification, Classification::Progression);
            } else if e.name == "Gas Passer" || e.name == "Red-Tape Recorder" {
                assert_eq!(e.classification, Classification::Filler, "{}", e.name);
            } else {
                assert_eq!(e.classification, Classification::Useful, "{}", e.name);
            }
        }
    }

    #[test]
    fn other_players_and_order_are_untouched() {
        let mut pool = ItemPool::new();
        pool.push(progression("Jarate", 2));
        pool.push(progression("Jarate", 1));
        pool.push(progression("Huntsman", 1));

        let disabled: BTreeSet<String> = ["Jarate".to_string()].into_iter().collect();
        let changed = adjust_classifications(&mut pool, PlayerId(1), &disabled);
        assert_eq!(changed, 1);

        let seen: Vec<(u32, &str, Classification)> = pool
            .iter()
            .map(|(_, e)| (e.player.0, e.name.as_str(), e.classification))
            .collect();
        assert_eq!(
            seen,
            vec![
                (2, "Jarate", Classification::Progression),
                (1, "Jarate", Classification::Useful),
                (1, "Huntsman", Classification::Progression),
            ]
        );
    }
}
