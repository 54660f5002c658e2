//! Towns built by this spawner, keyed by name

use crate::core::types::Vec3;
use crate::spawn::orchestrator::BuildSummary;
use ahash::AHashMap;

/// A town currently standing in the world
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltTown {
    pub name: String,
    pub origin: Vec3,
    pub summary: BuildSummary,
}

/// Name-keyed storage for built towns
#[derive(Debug, Default)]
pub struct TownRegistry {
    towns: AHashMap<String, BuiltTown>,
}

impl TownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a town, replacing any entry of the same name
    pub fn insert(&mut self, town: BuiltTown) -> Option<BuiltTown> {
        self.towns.insert(town.name.clone(), town)
    }

    pub fn get(&self, name: &str) -> Option<&BuiltTown> {
        self.towns.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<BuiltTown> {
        self.towns.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.towns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.towns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.towns.is_empty()
    }

    /// Town names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.towns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuiltTown> {
        self.towns.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn town(name: &str, x: f32) -> BuiltTown {
        BuiltTown {
            name: name.into(),
            origin: Vec3::new(x, 0.0, 0.0),
            summary: BuildSummary::new(name),
        }
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut registry = TownRegistry::new();
        assert!(registry.insert(town("Tombstone", 0.0)).is_none());
        let old = registry.insert(town("Tombstone", 50.0)).unwrap();
        assert_eq!(old.origin.x, 0.0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Tombstone").unwrap().origin.x, 50.0);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = TownRegistry::new();
        registry.insert(town("Dodge", 0.0));
        registry.insert(town("Abilene", 0.0));
        assert_eq!(registry.names(), vec!["Abilene", "Dodge"]);
        assert!(registry.remove("Dodge").is_some());
        assert!(!registry.contains("Dodge"));
    }

    #[test]
    fn test_iter_visits_every_town() {
        let mut registry = TownRegistry::new();
        registry.insert(town("Dodge", 0.0));
        registry.insert(town("Abilene", 160.0));
        let mut origins: Vec<f32> = registry.iter().map(|t| t.origin.x).collect();
        origins.sort_by(f32::total_cmp);
        assert_eq!(origins, vec![0.0, 160.0]);
    }
}
