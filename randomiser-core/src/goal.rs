use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::classes::{ClassSet, ClassTag};
use crate::disabled::disabled_items;
use crate::options::{get_option_value, is_option_enabled, OptionKey, Options};
use crate::state::CollectionState;
use crate::{PlayerId, RandomiserError, Result};

/// Never counted toward goal progress, whatever the options say.
pub const EXCLUDED_LOCATION: &str = "Grappling Hook";

/// Engineer always has one check available from the sentry gun.
const BASELINE: &[(ClassTag, u32)] = &[(ClassTag::Engineer, 1)];

/// Reachable checks per class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassProgress {
    counts: [u32; 9],
}

impl ClassProgress {
    fn baseline() -> Self {
        let mut counts = [0u32; 9];
        for (class, count) in BASELINE {
            counts[class.index()] = *count;
        }
        Self { counts }
    }

    fn credit(&mut self, classes: ClassSet) {
        for class in classes.iter() {
            self.counts[class.index()] += 1;
        }
    }

    pub fn count(&self, class: ClassTag) -> u32 {
        self.counts[class.index()]
    }

    pub fn by_class(&self) -> BTreeMap<ClassTag, u32> {
        ClassTag::ALL
            .into_iter()
            .map(|class| (class, self.count(class)))
            .collect()
    }
}

/// Walk the location table and count, per class, the checks the player can
/// currently reach.
pub fn class_progress<S>(
    catalog: &Catalog,
    options: &Options,
    state: &S,
    player: PlayerId,
) -> Result<ClassProgress>
where
    S: CollectionState + ?Sized,
{
    let mut progress = ClassProgress::baseline();
    let disabled = disabled_items(options, player)?;
    let stocksanity = is_option_enabled(options, player, OptionKey::Stocksanity)?;

    for location in catalog.locations() {
        if location.victory || location.name == EXCLUDED_LOCATION {
            continue;
        }

        let reachable = state.has(&location.name, player)
            || state.has(location.base_name(), player)
            || (stocksanity && location.is_stock_location());

        if reachable && !disabled.contains(&location.name) {
            progress.credit(location.classes);
        }
    }

    Ok(progress)
}

/// Whether every class has met its configured requirement.
pub fn goal_satisfied<S>(
    catalog: &Catalog,
    options: &Options,
    state: &S,
    player: PlayerId,
) -> Result<bool>
where
    S: CollectionState + ?Sized,
{
    let progress = class_progress(catalog, options, state, player)?;
    let unlock_classes = is_option_enabled(options, player, OptionKey::UnlockClasses)?;

    for class in ClassTag::ALL {
        let required = get_option_value(options, player, OptionKey::ClassThreshold(class))?;
        let reached = progress.count(class);

        if i64::from(reached) < required {
            debug!(%player, %class, reached, required, "goal blocked: not enough checks");
            return Ok(false);
        }
        if unlock_classes && !state.has(class.name(), player) {
            debug!(%player, %class, "goal blocked: class not unlocked");
            return Ok(false);
        }
    }

    info!(%player, "goal in logic");
    Ok(true)
}

pub type RuleFn = fn(&Catalog, &Options, &dyn CollectionState, PlayerId) -> Result<bool>;

fn goal_in_logic(
    catalog: &Catalog,
    options: &Options,
    state: &dyn CollectionState,
    player: PlayerId,
) -> Result<bool> {
    goal_satisfied(catalog, options, state, player)
}

/// Look up a function referenced from a requires string, e.g.
/// `{GoalInLogic()}`.
pub fn rule_function(name: &str) -> Result<RuleFn> {
    let name = name.trim().trim_start_matches('{').trim_end_matches('}');
    let name = name.strip_suffix("()").unwrap_or(name);
    match name {
        "GoalInLogic" => Ok(goal_in_logic),
        _ => Err(RandomiserError::UnknownRuleFunction(name.to_string())),
    }
}
