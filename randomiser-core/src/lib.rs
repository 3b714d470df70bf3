use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

pub mod adjust;
pub mod catalog;
pub mod classes;
pub mod disabled;
pub mod goal;
pub mod hooks;
pub mod options;
pub mod pool;
pub mod starting;
pub mod state;

use catalog::Catalog;
use classes::ClassTag;
use hooks::{HintData, SlotData, Tf2Hooks, WorldHooks};
use options::{OptionError, OptionKey, Options, PlayerOptions};
use pool::{ItemPool, PoolEntry, Precollected};
use state::OwnedItems;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomiserSettings {
    pub seed: u64,
    /// World directory or packed `.apworld`.
    pub catalog_path: PathBuf,
    /// One options file per player; player numbers follow this order from 1.
    pub player_option_paths: Vec<PathBuf>,
    pub owned_items_path: Option<PathBuf>,
    pub spoiler_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum RandomiserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("option error: {0}")]
    Option(#[from] OptionError),
    #[error("could not find an item with the name \"{0}\"")]
    ItemNotFound(String),
    #[error("could not find a location with the name \"{0}\"")]
    LocationNotFound(String),
    #[error("unknown rule function '{0}'")]
    UnknownRuleFunction(String),
}

pub type Result<T> = std::result::Result<T, RandomiserError>;

/// Slot number of a player within one generation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything one generation run mutates. The random stream is shared by
/// all players and consumed in player order.
pub struct Multiworld {
    pub seed: u64,
    pub catalog: Catalog,
    pub options: Options,
    pub pool: ItemPool,
    pub precollected: Precollected,
    pub rng: StdRng,
    locations: BTreeMap<PlayerId, Vec<String>>,
}

impl Multiworld {
    pub fn new(catalog: Catalog, options: Options, seed: u64) -> Self {
        Self {
            seed,
            catalog,
            options,
            pool: ItemPool::new(),
            precollected: Precollected::new(),
            rng: StdRng::seed_from_u64(seed),
            locations: BTreeMap::new(),
        }
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.options.keys().copied().collect()
    }

    pub fn slot_name(&self, player: PlayerId) -> String {
        self.options
            .get(&player)
            .and_then(PlayerOptions::slot_name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Player{}", player))
    }

    pub fn locations_for(&self, player: PlayerId) -> &[String] {
        self.locations
            .get(&player)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub player: PlayerId,
    pub slot_name: String,
    pub precollected: Vec<String>,
    pub pool_size: usize,
    pub location_count: usize,
    pub class_progress: BTreeMap<ClassTag, u32>,
    pub goal_in_logic: bool,
    pub slot_data: SlotData,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub players: Vec<PlayerReport>,
}

fn create_regions<H: WorldHooks>(world: &mut Multiworld, hooks: &mut H, player: PlayerId) -> Result<()> {
    hooks.before_create_regions(world, player)?;
    let names: Vec<String> = world
        .catalog
        .locations()
        .iter()
        .map(|location| location.name.clone())
        .collect();
    world.locations.insert(player, names);

    let remove = hooks.after_create_regions(world, player)?;
    if !remove.is_empty() {
        if let Some(names) = world.locations.get_mut(&player) {
            names.retain(|name| !remove.contains(name));
        }
    }
    Ok(())
}

fn create_items<H: WorldHooks>(world: &mut Multiworld, hooks: &mut H, player: PlayerId) -> Result<()> {
    let config = hooks.before_create_items_all(world.catalog.item_config(), world, player)?;

    for (name, count) in config {
        let name = hooks.before_create_item(name, world, player)?;
        let def = world.catalog.item(&name)?.clone();
        for _ in 0..count {
            let entry = hooks.after_create_item(PoolEntry::from_definition(&def, player), world, player)?;
            world.pool.push(entry);
        }
    }
    debug!(%player, items = world.pool.len_for(player), "item pool created");
    Ok(())
}

fn remove_named_items(world: &mut Multiworld, player: PlayerId, names: &[String]) -> Result<()> {
    for name in names {
        if world.pool.remove_named(player, name).is_none() {
            return Err(RandomiserError::ItemNotFound(name.clone()));
        }
    }
    Ok(())
}

/// Run every lifecycle stage for every player, in host order.
pub fn generate<H: WorldHooks>(
    world: &mut Multiworld,
    hooks: &mut H,
    owned_lists: &BTreeMap<PlayerId, Vec<String>>,
) -> Result<Vec<PlayerReport>> {
    let players = world.players();

    for &player in &players {
        create_regions(world, hooks, player)?;
    }

    for &player in &players {
        create_items(world, hooks, player)?;
    }
    for &player in &players {
        hooks.before_create_items_starting(world, player)?;
    }
    for &player in &players {
        let remove = hooks.before_create_items_filler(world, player)?;
        remove_named_items(world, player, &remove)?;
    }
    for &player in &players {
        hooks.after_create_items(world, player)?;
    }

    for &player in &players {
        hooks.before_set_rules(world, player)?;
        hooks.after_set_rules(world, player)?;
    }
    for &player in &players {
        hooks.before_generate_basic(world, player)?;
        hooks.after_generate_basic(world, player)?;
    }

    let mut state = OwnedItems::new();
    for &player in &players {
        let starting: Vec<PoolEntry> = world.precollected.for_player(player).to_vec();
        let owned = owned_lists.get(&player);
        let extra: Vec<PoolEntry> = match owned {
            Some(names) => names
                .iter()
                .map(|name| {
                    world
                        .catalog
                        .item(name)
                        .map(|def| PoolEntry::from_definition(def, player))
                })
                .collect::<Result<_>>()?,
            None => Vec::new(),
        };
        for item in starting.iter().chain(&extra) {
            state.collect(player, &item.name);
            hooks.after_collect_item(&mut state, true, item);
        }
    }

    let goal_rule = goal::rule_function("GoalInLogic")?;
    let mut reports = Vec::with_capacity(players.len());
    for &player in &players {
        let progress = goal::class_progress(&world.catalog, &world.options, &state, player)?;
        let goal_in_logic = goal_rule(&world.catalog, &world.options, &state, player)?;

        let slot_data = hooks.before_fill_slot_data(SlotData::new(), world, player)?;
        let slot_data = fill_slot_data(slot_data, world, player);
        let slot_data = hooks.after_fill_slot_data(slot_data, world, player)?;

        let mut hint_data = HintData::new();
        hooks.before_extend_hint_information(&mut hint_data, world, player);
        hooks.after_extend_hint_information(&mut hint_data, world, player);

        reports.push(PlayerReport {
            player,
            slot_name: world.slot_name(player),
            precollected: world.precollected.names_for(player),
            pool_size: world.pool.len_for(player),
            location_count: world.locations_for(player).len(),
            class_progress: progress.by_class(),
            goal_in_logic,
            slot_data,
        });
    }

    Ok(reports)
}

fn fill_slot_data(mut slot_data: SlotData, world: &Multiworld, player: PlayerId) -> SlotData {
    slot_data.insert(
        "player_name".to_string(),
        serde_json::Value::String(world.slot_name(player)),
    );
    if let Some(opts) = world.options.get(&player) {
        for key in OptionKey::all() {
            slot_data.insert(key.name().to_string(), serde_json::Value::from(opts.value(key)));
        }
    }
    slot_data
}

pub fn run(settings: RandomiserSettings) -> Result<GenerationReport> {
    if !settings.catalog_path.exists() {
        return Err(RandomiserError::Config(format!(
            "Catalog path does not exist: {}",
            settings.catalog_path.display()
        )));
    }
    if settings.player_option_paths.is_empty() {
        return Err(RandomiserError::Config(
            "At least one player options file is required".to_string(),
        ));
    }

    let catalog = Catalog::load(&settings.catalog_path)?;
    info!(
        items = catalog.items().len(),
        locations = catalog.locations().len(),
        "catalog loaded"
    );
    disabled::unknown_table_items(&catalog);

    let mut options = Options::new();
    for (idx, path) in settings.player_option_paths.iter().enumerate() {
        let player = PlayerId(idx as u32 + 1);
        options.insert(player, PlayerOptions::load(path)?);
    }

    let owned_lists = match &settings.owned_items_path {
        Some(path) => OwnedItems::load_lists(path)?,
        None => BTreeMap::new(),
    };

    let mut world = Multiworld::new(catalog, options, settings.seed);
    let mut hooks = Tf2Hooks::new();
    let players = generate(&mut world, &mut hooks, &owned_lists)?;

    if let Some(path) = &settings.spoiler_path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "Seed: {}", settings.seed)?;
        hooks.before_write_spoiler(&world, &mut out)?;
        out.flush()?;
        info!(path = %path.display(), "spoiler written");
    }

    Ok(GenerationReport {
        seed: settings.seed,
        players,
    })
}
