use std::collections::BTreeSet;

use tracing::warn;

use crate::catalog::Catalog;
use crate::options::{player_options_for, OptionError, OptionKey, Options, PlayerOptions};
use crate::PlayerId;

/// Items whose checks only exist while the matching option is on. With the
/// option off they give no goal credit and lose their progression weight.
pub const DISABLED_ITEMS_BY_OPTION: &[(OptionKey, &[&str])] = &[
    (OptionKey::GrappleKill, &["Grappling Hook"]),
    (OptionKey::MadMilkAssist, &["Mad Milk"]),
    (
        OptionKey::BannerAssists,
        &["Buff Banner", "Concheror", "Battalion's Backup"],
    ),
    (OptionKey::MantreadsKill, &["Mantreads"]),
    (OptionKey::ThermalThrusterKill, &["Thermal Thruster"]),
    (OptionKey::GasPasser, &["Gas Passer"]),
    (
        OptionKey::MediGunChecks,
        &["Medi Gun", "Kritzkrieg", "Quick-Fix", "Vaccinator"],
    ),
    (OptionKey::JarateAssist, &["Jarate"]),
    (OptionKey::SapperDestructions, &["Sapper", "Red-Tape Recorder"]),
];

pub fn disabled_items_for(options: &PlayerOptions) -> BTreeSet<String> {
    DISABLED_ITEMS_BY_OPTION
        .iter()
        .filter(|(key, _)| !options.enabled(*key))
        .flat_map(|(_, items)| items.iter().map(|name| name.to_string()))
        .collect()
}

pub fn disabled_items(options: &Options, player: PlayerId) -> Result<BTreeSet<String>, OptionError> {
    Ok(disabled_items_for(player_options_for(options, player)?))
}

/// Table entries that the loaded catalog does not know about. These would
/// silently never match anything, so they are reported once at load.
pub fn unknown_table_items(catalog: &Catalog) -> Vec<&'static str> {
    let missing: Vec<&'static str> = DISABLED_ITEMS_BY_OPTION
        .iter()
        .flat_map(|(_, items)| items.iter().copied())
        .filter(|name| !catalog.contains_item(name))
        .collect();
    for name in &missing {
        warn!(item = %name, "disabled-item table names an item missing from the catalog");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Classification, ItemDefinition};
    use crate::classes::ClassSet;

    #[test]
    fn defaults_disable_nothing() {
        assert!(disabled_items_for(&PlayerOptions::new()).is_empty());
    }

    #[test]
    fn every_item_of_a_disabled_option_is_listed() {
        let mut opts = PlayerOptions::new();
        opts.set_toggle(OptionKey::BannerAssists, false).unwrap();
        opts.set_toggle(OptionKey::SapperDestructions, false).unwrap();

        let disabled = disabled_items_for(&opts);
        let expected: BTreeSet<String> = [
            "Buff Banner",
            "Concheror",
            "Battalion's Backup",
            "Sapper",
            "Red-Tape Recorder",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(disabled, expected);
    }

    #[test]
    fn same_options_give_same_set() {
        let mut options = Options::new();
        let mut opts = PlayerOptions::new();
        opts.set_toggle(OptionKey::MediGunChecks, false).unwrap();
        options.insert(PlayerId(1), opts);

        let first = disabled_items(&options, PlayerId(1)).unwrap();
        let second = disabled_items(&options, PlayerId(1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert!(disabled_items(&options, PlayerId(2)).is_err());
    }

    #[test]
    fn reports_table_items_missing_from_catalog() {
        let items = DISABLED_ITEMS_BY_OPTION
            .iter()
            .flat_map(|(_, items)| items.iter())
            .filter(|name| **name != "Vaccinator")
            .map(|name| ItemDefinition {
                name: name.to_string(),
                categories: Vec::new(),
                count: 1,
                classification: Classification::Progression,
                classes: ClassSet::EMPTY,
            })
            .collect();
        let catalog = Catalog::new(items, Vec::new()).unwrap();
        assert_eq!(unknown_table_items(&catalog), vec!["Vaccinator"]);
    }
}
