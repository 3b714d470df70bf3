use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::classes::ClassTag;
use crate::{PlayerId, Result};

#[derive(Debug, Error)]
pub enum OptionError {
    #[error("unknown option '{0}'")]
    UnknownKey(String),

    #[error("no options configured for player {0}")]
    UnknownPlayer(PlayerId),

    #[error("option {key} expects a number, got {got}")]
    NotANumber { key: OptionKey, got: String },

    #[error("option {key} value {value} is out of range {min}..={max}")]
    OutOfRange {
        key: OptionKey,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("option {key} has no named value '{name}'")]
    UnknownRangeName { key: OptionKey, name: String },
}

/// Every option this world reads. Anything else in a player file is a
/// configuration error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum OptionKey {
    GrappleKill,
    MadMilkAssist,
    BannerAssists,
    MantreadsKill,
    ThermalThrusterKill,
    GasPasser,
    MediGunChecks,
    JarateAssist,
    SapperDestructions,
    Stocksanity,
    UnlockClasses,
    StartingClassCount,
    StartingClassWeaponCount,
    StartingClassItemCount,
    StartingItemCount,
    StartingWeaponCount,
    /// Reachable checks required for a class, keyed by the class name.
    ClassThreshold(ClassTag),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OptionKind {
    Toggle {
        default: bool,
    },
    Range {
        min: i64,
        max: i64,
        default: i64,
    },
    NamedRange {
        min: i64,
        max: i64,
        default: i64,
        names: &'static [(&'static str, i64)],
    },
}

const TOGGLE_NAMES: &[(&str, i64)] = &[("false", 0), ("true", 1), ("off", 0), ("on", 1)];
const CLASS_COUNT_NAMES: &[(&str, i64)] = &[("none", 0), ("all", 9)];
const THRESHOLD_NAMES: &[(&str, i64)] = &[("none", 0)];

const SIMPLE_KEYS: &[OptionKey] = &[
    OptionKey::GrappleKill,
    OptionKey::MadMilkAssist,
    OptionKey::BannerAssists,
    OptionKey::MantreadsKill,
    OptionKey::ThermalThrusterKill,
    OptionKey::GasPasser,
    OptionKey::MediGunChecks,
    OptionKey::JarateAssist,
    OptionKey::SapperDestructions,
    OptionKey::Stocksanity,
    OptionKey::UnlockClasses,
    OptionKey::StartingClassCount,
    OptionKey::StartingClassWeaponCount,
    OptionKey::StartingClassItemCount,
    OptionKey::StartingItemCount,
    OptionKey::StartingWeaponCount,
];

impl OptionKey {
    pub fn all() -> impl Iterator<Item = OptionKey> {
        SIMPLE_KEYS
            .iter()
            .copied()
            .chain(ClassTag::ALL.into_iter().map(OptionKey::ClassThreshold))
    }

    pub fn name(self) -> &'static str {
        match self {
            OptionKey::GrappleKill => "GrappleKill",
            OptionKey::MadMilkAssist => "MadMilkAssist",
            OptionKey::BannerAssists => "BannerAssists",
            OptionKey::MantreadsKill => "MantreadsKill",
            OptionKey::ThermalThrusterKill => "ThermalThrusterKill",
            OptionKey::GasPasser => "GasPasser",
            OptionKey::MediGunChecks => "MediGunChecks",
            OptionKey::JarateAssist => "JarateAssist",
            OptionKey::SapperDestructions => "SapperDestructions",
            OptionKey::Stocksanity => "Stocksanity",
            OptionKey::UnlockClasses => "UnlockClasses",
            OptionKey::StartingClassCount => "StartingClassCount",
            OptionKey::StartingClassWeaponCount => "StartingClassWeaponCount",
            OptionKey::StartingClassItemCount => "StartingClassItemCount",
            OptionKey::StartingItemCount => "StartingItemCount",
            OptionKey::StartingWeaponCount => "StartingWeaponCount",
            OptionKey::ClassThreshold(class) => class.name(),
        }
    }

    pub fn kind(self) -> OptionKind {
        match self {
            OptionKey::Stocksanity | OptionKey::UnlockClasses => {
                OptionKind::Toggle { default: false }
            }
            OptionKey::GrappleKill
            | OptionKey::MadMilkAssist
            | OptionKey::BannerAssists
            | OptionKey::MantreadsKill
            | OptionKey::ThermalThrusterKill
            | OptionKey::GasPasser
            | OptionKey::MediGunChecks
            | OptionKey::JarateAssist
            | OptionKey::SapperDestructions => OptionKind::Toggle { default: true },
            OptionKey::StartingClassCount => OptionKind::NamedRange {
                min: 0,
                max: ClassTag::ALL.len() as i64,
                default: 1,
                names: CLASS_COUNT_NAMES,
            },
            OptionKey::StartingClassWeaponCount => OptionKind::Range {
                min: 0,
                max: 50,
                default: 1,
            },
            OptionKey::StartingClassItemCount
            | OptionKey::StartingItemCount
            | OptionKey::StartingWeaponCount => OptionKind::Range {
                min: 0,
                max: 50,
                default: 0,
            },
            OptionKey::ClassThreshold(_) => OptionKind::NamedRange {
                min: 0,
                max: 100,
                default: 5,
                names: THRESHOLD_NAMES,
            },
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptionKey {
    type Err = OptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OptionKey::all()
            .find(|key| key.name() == s)
            .ok_or_else(|| OptionError::UnknownKey(s.to_string()))
    }
}

/// A value as written in a player options file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawOptionValue {
    Bool(bool),
    Int(i64),
    Name(String),
}

impl fmt::Display for RawOptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawOptionValue::Bool(b) => write!(f, "{b}"),
            RawOptionValue::Int(n) => write!(f, "{n}"),
            RawOptionValue::Name(s) => write!(f, "'{s}'"),
        }
    }
}

impl OptionKind {
    pub fn default_value(self) -> i64 {
        match self {
            OptionKind::Toggle { default } => default as i64,
            OptionKind::Range { default, .. } | OptionKind::NamedRange { default, .. } => default,
        }
    }

    fn bounds(self) -> (i64, i64, &'static [(&'static str, i64)]) {
        match self {
            OptionKind::Toggle { .. } => (0, 1, TOGGLE_NAMES),
            OptionKind::Range { min, max, .. } => (min, max, &[]),
            OptionKind::NamedRange {
                min, max, names, ..
            } => (min, max, names),
        }
    }

    fn resolve(self, key: OptionKey, raw: &RawOptionValue) -> std::result::Result<i64, OptionError> {
        let (min, max, names) = self.bounds();
        let value = match raw {
            RawOptionValue::Bool(b) => match self {
                OptionKind::Toggle { .. } => *b as i64,
                _ => {
                    return Err(OptionError::NotANumber {
                        key,
                        got: raw.to_string(),
                    })
                }
            },
            RawOptionValue::Int(n) => *n,
            RawOptionValue::Name(name) => names
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
                .map(|(_, value)| *value)
                .ok_or_else(|| OptionError::UnknownRangeName {
                    key,
                    name: name.clone(),
                })?,
        };

        if value < min || value > max {
            return Err(OptionError::OutOfRange {
                key,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }
}

/// One player's resolved configuration. Keys that were never set read as
/// their default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerOptions {
    slot_name: Option<String>,
    values: BTreeMap<OptionKey, i64>,
}

/// Configuration for every player in a generation.
pub type Options = BTreeMap<PlayerId, PlayerOptions>;

impl PlayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_name(&self) -> Option<&str> {
        self.slot_name.as_deref()
    }

    pub fn set_slot_name(&mut self, name: impl Into<String>) {
        self.slot_name = Some(name.into());
    }

    pub fn set(&mut self, key: OptionKey, raw: &RawOptionValue) -> std::result::Result<(), OptionError> {
        let value = key.kind().resolve(key, raw)?;
        self.values.insert(key, value);
        Ok(())
    }

    pub fn set_toggle(&mut self, key: OptionKey, enabled: bool) -> std::result::Result<(), OptionError> {
        self.set(key, &RawOptionValue::Bool(enabled))
    }

    pub fn set_number(&mut self, key: OptionKey, value: i64) -> std::result::Result<(), OptionError> {
        self.set(key, &RawOptionValue::Int(value))
    }

    pub fn value(&self, key: OptionKey) -> i64 {
        self.values
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.kind().default_value())
    }

    pub fn enabled(&self, key: OptionKey) -> bool {
        self.value(key) != 0
    }

    /// Parse a player options file: a JSON object of option name to value.
    ///
    /// `name` sets the slot name and `game` is ignored; every other key must
    /// be a known option.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(src)?;
        let mut options = PlayerOptions::new();

        for (key, value) in raw {
            match key.as_str() {
                "game" => continue,
                "name" => {
                    if let serde_json::Value::String(name) = value {
                        options.set_slot_name(name);
                    }
                    continue;
                }
                _ => {}
            }

            let option_key: OptionKey = key.parse()?;
            let got = value.to_string();
            let raw_value: RawOptionValue = serde_json::from_value(value)
                .map_err(|_| OptionError::NotANumber {
                    key: option_key,
                    got,
                })?;
            options.set(option_key, &raw_value)?;
        }

        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path)?;
        Self::from_json_str(&src)
    }
}

pub fn player_options_for(options: &Options, player: PlayerId) -> std::result::Result<&PlayerOptions, OptionError> {
    options
        .get(&player)
        .ok_or(OptionError::UnknownPlayer(player))
}

pub fn get_option_value(
    options: &Options,
    player: PlayerId,
    key: OptionKey,
) -> std::result::Result<i64, OptionError> {
    Ok(player_options_for(options, player)?.value(key))
}

pub fn is_option_enabled(
    options: &Options,
    player: PlayerId,
    key: OptionKey,
) -> std::result::Result<bool, OptionError> {
    Ok(player_options_for(options, player)?.enabled(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RandomiserError;

    #[test]
    fn unset_keys_use_defaults() {
        let opts = PlayerOptions::new();
        assert!(opts.enabled(OptionKey::GrappleKill));
        assert!(!opts.enabled(OptionKey::Stocksanity));
        assert_eq!(opts.value(OptionKey::StartingClassCount), 1);
        assert_eq!(opts.value(OptionKey::ClassThreshold(ClassTag::Pyro)), 5);
    }

    #[test]
    fn parses_player_file() {
        let src = r#"{
            "name": "Blu",
            "game": "Manual_TeamFortress2_apersoma",
            "GrappleKill": false,
            "Stocksanity": "on",
            "StartingClassCount": "all",
            "StartingItemCount": 3,
            "Engineer": 2,
            "Spy": "none"
        }"#;
        let opts = PlayerOptions::from_json_str(src).unwrap();
        assert_eq!(opts.slot_name(), Some("Blu"));
        assert!(!opts.enabled(OptionKey::GrappleKill));
        assert!(opts.enabled(OptionKey::Stocksanity));
        assert_eq!(opts.value(OptionKey::StartingClassCount), 9);
        assert_eq!(opts.value(OptionKey::StartingItemCount), 3);
        assert_eq!(opts.value(OptionKey::ClassThreshold(ClassTag::Engineer)), 2);
        assert_eq!(opts.value(OptionKey::ClassThreshold(ClassTag::Spy)), 0);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = PlayerOptions::from_json_str(r#"{ "Mad Milk": true }"#).unwrap_err();
        assert!(matches!(
            err,
            RandomiserError::Option(OptionError::UnknownKey(ref k)) if k == "Mad Milk"
        ));
        assert!("Civilian".parse::<OptionKey>().is_err());
    }

    #[test]
    fn values_are_range_checked() {
        let mut opts = PlayerOptions::new();
        assert!(matches!(
            opts.set_number(OptionKey::StartingClassCount, 10),
            Err(OptionError::OutOfRange { max: 9, .. })
        ));
        assert!(matches!(
            opts.set_toggle(OptionKey::StartingItemCount, true),
            Err(OptionError::NotANumber { .. })
        ));
        assert!(matches!(
            opts.set(OptionKey::StartingItemCount, &RawOptionValue::Name("all".into())),
            Err(OptionError::UnknownRangeName { .. })
        ));
        assert!(opts.set_number(OptionKey::GasPasser, 0).is_ok());
        assert!(!opts.enabled(OptionKey::GasPasser));
    }

    #[test]
    fn resolver_fails_for_unknown_player() {
        let mut options = Options::new();
        options.insert(PlayerId(1), PlayerOptions::new());
        assert!(is_option_enabled(&options, PlayerId(1), OptionKey::MediGunChecks).unwrap());
        assert_eq!(
            get_option_value(&options, PlayerId(1), OptionKey::StartingWeaponCount).unwrap(),
            0
        );
        assert!(matches!(
            get_option_value(&options, PlayerId(2), OptionKey::Stocksanity),
            Err(OptionError::UnknownPlayer(PlayerId(2)))
        ));
    }
}
