use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The nine playable classes. Every item and location is bucketed by these.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ClassTag {
    Scout,
    Soldier,
    Pyro,
    Demoman,
    Heavy,
    Engineer,
    Medic,
    Sniper,
    Spy,
}

#[derive(Debug, Error)]
#[error("unknown class '{0}'")]
pub struct UnknownClassError(pub String);

impl ClassTag {
    pub const ALL: [ClassTag; 9] = [
        ClassTag::Scout,
        ClassTag::Soldier,
        ClassTag::Pyro,
        ClassTag::Demoman,
        ClassTag::Heavy,
        ClassTag::Engineer,
        ClassTag::Medic,
        ClassTag::Sniper,
        ClassTag::Spy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClassTag::Scout => "Scout",
            ClassTag::Soldier => "Soldier",
            ClassTag::Pyro => "Pyro",
            ClassTag::Demoman => "Demoman",
            ClassTag::Heavy => "Heavy",
            ClassTag::Engineer => "Engineer",
            ClassTag::Medic => "Medic",
            ClassTag::Sniper => "Sniper",
            ClassTag::Spy => "Spy",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u16 {
        1 << self.index()
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassTag {
    type Err = UnknownClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassTag::ALL
            .iter()
            .copied()
            .find(|class| class.name() == s)
            .ok_or_else(|| UnknownClassError(s.to_string()))
    }
}

/// Class affiliation of a single item or location.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ClassTag>", into = "Vec<ClassTag>")]
pub struct ClassSet(u16);

impl ClassSet {
    pub const EMPTY: ClassSet = ClassSet(0);

    /// Assign affiliation from free-text category names.
    ///
    /// A class is affiliated when any category contains its name, so
    /// "Engineers" and "SniperKills" both count. Catalogs that need to opt an
    /// entity out ("Spycicle") state `classes` explicitly instead. This runs
    /// once when a catalog is loaded; nothing downstream looks at category
    /// text to decide class membership.
    pub fn from_categories<I, S>(categories: I) -> ClassSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = ClassSet::EMPTY;
        for category in categories {
            let category = category.as_ref();
            for class in ClassTag::ALL {
                if category.contains(class.name()) {
                    set.insert(class);
                }
            }
        }
        set
    }

    pub fn insert(&mut self, class: ClassTag) {
        self.0 |= class.bit();
    }

    pub fn contains(self, class: ClassTag) -> bool {
        self.0 & class.bit() != 0
    }

    pub fn intersects(self, other: ClassSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = ClassTag> {
        ClassTag::ALL.into_iter().filter(move |class| self.contains(*class))
    }
}

impl FromIterator<ClassTag> for ClassSet {
    fn from_iter<T: IntoIterator<Item = ClassTag>>(iter: T) -> Self {
        let mut set = ClassSet::EMPTY;
        for class in iter {
            set.insert(class);
        }
        set
    }
}

impl From<Vec<ClassTag>> for ClassSet {
    fn from(classes: Vec<ClassTag>) -> Self {
        classes.into_iter().collect()
    }
}

impl From<ClassSet> for Vec<ClassTag> {
    fn from(set: ClassSet) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_class_name() {
        for class in ClassTag::ALL {
            assert_eq!(class.name().parse::<ClassTag>().unwrap(), class);
        }
        assert!("Civilian".parse::<ClassTag>().is_err());
    }

    #[test]
    fn categories_match_on_containment() {
        let set = ClassSet::from_categories(["Engineers", "SniperKills", "Medi Gun"]);
        assert!(set.contains(ClassTag::Engineer));
        assert!(set.contains(ClassTag::Sniper));
        assert!(!set.contains(ClassTag::Medic));
        assert_eq!(set.len(), 2);

        let set = ClassSet::from_categories(["Snipers - Melee"]);
        assert!(set.contains(ClassTag::Sniper));

        let set = ClassSet::from_categories(["spy kills"]);
        assert!(set.is_empty());
    }

    #[test]
    fn one_location_can_carry_several_classes() {
        let set = ClassSet::from_categories(["Soldier/Demoman Shared", "Engineer's Buildings"]);
        let classes: Vec<ClassTag> = set.iter().collect();
        assert_eq!(
            classes,
            vec![ClassTag::Soldier, ClassTag::Demoman, ClassTag::Engineer]
        );
    }

    #[test]
    fn serializes_as_class_list() {
        let set: ClassSet = [ClassTag::Heavy, ClassTag::Scout].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Scout","Heavy"]"#);
        let back: ClassSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
