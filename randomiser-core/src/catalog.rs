use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::Path;

use crate::classes::ClassSet;
use crate::{RandomiserError, Result};

/// Locations carrying this category are reachable outright when
/// Stocksanity is on.
pub const STOCK_LOCATION_CATEGORY: &str = "StockLocation";

/// Names and copy counts that the item pool is created from.
pub type ItemConfig = Vec<(String, u32)>;

/// How the host's fill treats an item.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Progression,
    Useful,
    Filler,
    Trap,
}

impl Classification {
    pub fn is_progression(self) -> bool {
        self == Classification::Progression
    }
}

// Manual's items.json / locations.json come either as a bare array or
// wrapped in an object with a "data" array.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableFile<T> {
    List(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> TableFile<T> {
    fn into_rows(self) -> Vec<T> {
        match self {
            TableFile::List(rows) | TableFile::Wrapped { data: rows } => rows,
        }
    }
}

fn default_count() -> u32 {
    1
}

#[derive(Deserialize)]
struct ItemRow {
    name: String,
    #[serde(default)]
    category: Option<Vec<String>>,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default)]
    progression: bool,
    #[serde(default)]
    progression_skip_balancing: bool,
    #[serde(default)]
    useful: bool,
    #[serde(default)]
    trap: bool,
    #[serde(default)]
    classes: Option<ClassSet>,
}

#[derive(Deserialize)]
struct LocationRow {
    name: String,
    #[serde(default)]
    category: Option<Vec<String>>,
    #[serde(default)]
    victory: bool,
    #[serde(default)]
    classes: Option<ClassSet>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemDefinition {
    pub name: String,
    pub categories: Vec<String>,
    pub count: u32,
    pub classification: Classification,
    pub classes: ClassSet,
}

impl From<ItemRow> for ItemDefinition {
    fn from(row: ItemRow) -> Self {
        let classification = if row.progression || row.progression_skip_balancing {
            Classification::Progression
        } else if row.useful {
            Classification::Useful
        } else if row.trap {
            Classification::Trap
        } else {
            Classification::Filler
        };
        let categories = row.category.unwrap_or_default();
        let classes = row
            .classes
            .unwrap_or_else(|| ClassSet::from_categories(&categories));
        Self {
            name: row.name,
            categories,
            count: row.count,
            classification,
            classes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationDefinition {
    pub name: String,
    pub categories: Vec<String>,
    pub victory: bool,
    pub classes: ClassSet,
}

impl LocationDefinition {
    /// The location name with any parenthetical suffix dropped, e.g.
    /// "Sandman (Stun 5)" -> "Sandman".
    pub fn base_name(&self) -> &str {
        match self.name.split_once(" (") {
            Some((base, _)) => base,
            None => &self.name,
        }
    }

    pub fn is_stock_location(&self) -> bool {
        self.categories.iter().any(|c| c == STOCK_LOCATION_CATEGORY)
    }
}

impl From<LocationRow> for LocationDefinition {
    fn from(row: LocationRow) -> Self {
        let categories = row.category.unwrap_or_default();
        let classes = row
            .classes
            .unwrap_or_else(|| ClassSet::from_categories(&categories));
        Self {
            name: row.name,
            categories,
            victory: row.victory,
            classes,
        }
    }
}

/// The static item and location tables shared by every player.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: Vec<ItemDefinition>,
    locations: Vec<LocationDefinition>,
    item_index: HashMap<String, usize>,
    location_index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(items: Vec<ItemDefinition>, locations: Vec<LocationDefinition>) -> Result<Self> {
        let mut item_index = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if item_index.insert(item.name.clone(), idx).is_some() {
                return Err(RandomiserError::Config(format!(
                    "duplicate item name in catalog: {}",
                    item.name
                )));
            }
        }

        // Locations are not required to be unique by the Manual format; the
        // index keeps the first one.
        let mut location_index = HashMap::with_capacity(locations.len());
        for (idx, location) in locations.iter().enumerate() {
            location_index.entry(location.name.clone()).or_insert(idx);
        }

        Ok(Self {
            items,
            locations,
            item_index,
            location_index,
        })
    }

    pub fn from_json_strs(items_json: &str, locations_json: &str) -> Result<Self> {
        let items: TableFile<ItemRow> = serde_json::from_str(items_json)?;
        let locations: TableFile<LocationRow> = serde_json::from_str(locations_json)?;
        Self::new(
            items.into_rows().into_iter().map(ItemDefinition::from).collect(),
            locations
                .into_rows()
                .into_iter()
                .map(LocationDefinition::from)
                .collect(),
        )
    }

    /// Load from an unpacked world directory (either the world root or its
    /// `data` folder) or from a packed `.apworld` archive.
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_file() {
            return Self::from_apworld(File::open(path)?);
        }

        let data_dir = if path.join("items.json").exists() {
            path.to_path_buf()
        } else {
            path.join("data")
        };
        let items_path = data_dir.join("items.json");
        let locations_path = data_dir.join("locations.json");
        if !items_path.exists() || !locations_path.exists() {
            return Err(RandomiserError::Config(format!(
                "Could not find items.json and locations.json under {}",
                path.display()
            )));
        }

        let items_json = fs::read_to_string(items_path)?;
        let locations_json = fs::read_to_string(locations_path)?;
        Self::from_json_strs(&items_json, &locations_json)
    }

    /// Read `data/items.json` and `data/locations.json` out of an apworld
    /// zip. The world folder name inside the archive is not fixed.
    pub fn from_apworld<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut items_json: Option<String> = None;
        let mut locations_json: Option<String> = None;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().replace('\\', "/");
            let slot = if name.ends_with("data/items.json") {
                &mut items_json
            } else if name.ends_with("data/locations.json") {
                &mut locations_json
            } else {
                continue;
            };
            let mut buf = String::new();
            file.read_to_string(&mut buf)?;
            *slot = Some(buf);
        }

        match (items_json, locations_json) {
            (Some(items), Some(locations)) => Self::from_json_strs(&items, &locations),
            _ => Err(RandomiserError::Config(
                "apworld archive is missing data/items.json or data/locations.json".to_string(),
            )),
        }
    }

    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    pub fn locations(&self) -> &[LocationDefinition] {
        &self.locations
    }

    pub fn contains_item(&self, name: &str) -> bool {
        self.item_index.contains_key(name)
    }

    pub fn item(&self, name: &str) -> Result<&ItemDefinition> {
        self.item_index
            .get(name)
            .map(|&idx| &self.items[idx])
            .ok_or_else(|| RandomiserError::ItemNotFound(name.to_string()))
    }

    pub fn location(&self, name: &str) -> Result<&LocationDefinition> {
        self.location_index
            .get(name)
            .map(|&idx| &self.locations[idx])
            .ok_or_else(|| RandomiserError::LocationNotFound(name.to_string()))
    }

    /// Item name and copy count for every item, in catalog order.
    pub fn item_config(&self) -> ItemConfig {
        self.items
            .iter()
            .map(|item| (item.name.clone(), item.count))
            .collect()
    }
}
