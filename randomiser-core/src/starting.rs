use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::classes::{ClassSet, ClassTag};
use crate::options::{player_options_for, OptionKey, Options, PlayerOptions};
use crate::pool::{EntryId, ItemPool, Precollected};
use crate::{PlayerId, Result};

/// Category carried by the nine class unlock items.
pub const CLASS_UNLOCK_CATEGORY: &str = "Class Unlock";

/// What was granted to one player, bucket by bucket, in draw order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Allocation {
    pub starting_classes: Vec<ClassTag>,
    pub class_unlocks: Vec<String>,
    pub class_weapons: Vec<String>,
    pub class_items: Vec<String>,
    pub weapons: Vec<String>,
    pub items: Vec<String>,
}

impl Allocation {
    pub fn total(&self) -> usize {
        self.class_unlocks.len()
            + self.class_weapons.len()
            + self.class_items.len()
            + self.weapons.len()
            + self.items.len()
    }
}

#[derive(Copy, Clone, Debug)]
struct Quotas {
    classes: usize,
    class_weapons: usize,
    class_items: usize,
    weapons: usize,
    items: usize,
}

impl Quotas {
    fn read(options: &PlayerOptions) -> Self {
        // Range validation keeps these non-negative.
        let count = |key| usize::try_from(options.value(key)).unwrap_or(0);
        Self {
            classes: count(OptionKey::StartingClassCount).min(ClassTag::ALL.len()),
            class_weapons: count(OptionKey::StartingClassWeaponCount),
            class_items: count(OptionKey::StartingClassItemCount),
            weapons: count(OptionKey::StartingWeaponCount),
            items: count(OptionKey::StartingItemCount),
        }
    }
}

/// Candidates for each quota. A single entry can sit in several buckets.
#[derive(Debug, Default)]
struct Buckets {
    class_weapons: Vec<EntryId>,
    class_items: Vec<EntryId>,
    weapons: Vec<EntryId>,
    items: Vec<EntryId>,
}

impl Buckets {
    fn collect(pool: &ItemPool, player: PlayerId, starting: ClassSet, quotas: &Quotas) -> Self {
        let mut buckets = Buckets::default();

        for (id, entry) in pool.entries_for(player) {
            if quotas.items > 0 {
                buckets.items.push(id);
            }
            if entry.in_category(CLASS_UNLOCK_CATEGORY) {
                continue;
            }

            let weapon = entry.is_progression();
            let class_match = entry.classes.intersects(starting);

            if weapon && quotas.weapons > 0 {
                buckets.weapons.push(id);
            }
            if class_match && quotas.class_items > 0 {
                buckets.class_items.push(id);
            }
            if class_match && weapon && quotas.class_weapons > 0 {
                buckets.class_weapons.push(id);
            }
        }

        buckets
    }
}

/// Shuffle the still-live part of a bucket and grant the first `quota`.
fn draw<R: Rng + ?Sized>(
    bucket: &[EntryId],
    quota: usize,
    pool: &mut ItemPool,
    precollected: &mut Precollected,
    rng: &mut R,
) -> Vec<String> {
    if quota == 0 {
        return Vec::new();
    }

    let mut live: Vec<EntryId> = bucket.iter().copied().filter(|id| pool.contains(*id)).collect();
    live.shuffle(rng);
    live.into_iter()
        .take(quota)
        .filter_map(|id| precollected.take_from(pool, id))
        .collect()
}

/// Move the player's starting classes and starting items out of the pool.
///
/// Starting classes are drawn first and every copy of their unlock items
/// granted. The
/// remaining quotas are drawn in the fixed order class weapons, class items,
/// weapons, then any item. Taking an entry removes it from the arena, so a
/// later bucket can never hand it out again.
///
/// `rng` is the generation-wide stream; the caller decides the order in
/// which players draw from it.
pub fn allocate_starting_items<R: Rng + ?Sized>(
    pool: &mut ItemPool,
    precollected: &mut Precollected,
    options: &Options,
    player: PlayerId,
    rng: &mut R,
) -> Result<Allocation> {
    let quotas = Quotas::read(player_options_for(options, player)?);
    let mut allocation = Allocation::default();

    if quotas.classes == 0 {
        debug!(%player, "no starting classes configured, pool left as is");
        return Ok(allocation);
    }

    let mut classes = ClassTag::ALL;
    classes.shuffle(rng);
    allocation.starting_classes = classes[..quotas.classes].to_vec();
    let starting: ClassSet = allocation.starting_classes.iter().copied().collect();

    // Every copy of a starting class's unlock is granted.
    let unlocks: Vec<EntryId> = pool
        .entries_for(player)
        .filter(|(_, entry)| {
            allocation
                .starting_classes
                .iter()
                .any(|class| entry.name == class.name())
        })
        .map(|(id, _)| id)
        .collect();
    for id in unlocks {
        if let Some(name) = precollected.take_from(pool, id) {
            allocation.class_unlocks.push(name);
        }
    }

    let buckets = Buckets::collect(pool, player, starting, &quotas);
    debug!(
        %player,
        class_weapons = buckets.class_weapons.len(),
        class_items = buckets.class_items.len(),
        weapons = buckets.weapons.len(),
        items = buckets.items.len(),
        "starting item candidates"
    );

    allocation.class_weapons = draw(&buckets.class_weapons, quotas.class_weapons, pool, precollected, rng);
    allocation.class_items = draw(&buckets.class_items, quotas.class_items, pool, precollected, rng);
    allocation.weapons = draw(&buckets.weapons, quotas.weapons, pool, precollected, rng);
    allocation.items = draw(&buckets.items, quotas.items, pool, precollected, rng);

    info!(
        %player,
        classes = ?allocation.starting_classes,
        granted = allocation.total(),
        "starting inventory allocated"
    );
    Ok(allocation)
}
