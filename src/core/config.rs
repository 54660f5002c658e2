//! Pipeline configuration with documented constants
//!
//! Everything a caller may want to tune about a spawner lives here: world
//! bounds, per-document resource caps, batch spacing and the extensions the
//! Auditor consumes. A config value is built once per spawner and threaded
//! through explicitly.

use crate::core::error::{Result, TownError};
use crate::town::zones::ZoneSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for repairing, auditing and spawning towns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TownConfig {
    // === WORLD BOUNDS ===
    /// Maximum horizontal distance from `world_center` at which anything
    /// may be placed (world units)
    ///
    /// Generators occasionally emit coordinates in the tens of thousands.
    /// Anything beyond this radius is treated as forbidden ground, both for
    /// the town origin and for individual entities.
    pub max_world_radius: f32,

    /// Centre of the playable world as `[x, z]`
    pub world_center: [f32; 2],

    // === RESOURCE CAPS ===
    /// Maximum streets accepted per document; extras are dropped silently
    pub max_streets: usize,

    /// Maximum buildings accepted per document
    ///
    /// Packing is O(n log n) per street side, but each building becomes a
    /// scene object downstream, which is where the real cost lies.
    pub max_buildings: usize,

    /// Maximum props accepted per document
    pub max_props: usize,

    /// Maximum wandering NPCs accepted per document
    pub max_npcs: usize,

    // === BATCHES ===
    /// X offset applied between consecutive towns of one response
    ///
    /// Each town's final origin plus this offset becomes the default origin
    /// of the next document, so sibling towns do not overlap.
    pub town_spacing: f32,

    // === AUDIT EXTENSIONS ===
    /// Zones accepted in addition to the built-in catalog
    pub extra_zones: Vec<ZoneSpec>,

    /// Allow-list of NPC prefab identifiers
    ///
    /// `None` disables the unknown-prefab check entirely.
    pub npc_prefabs: Option<Vec<String>>,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            max_world_radius: 2000.0,
            world_center: [0.0, 0.0],

            max_streets: 16,
            max_buildings: 64,
            max_props: 128,
            max_npcs: 32,

            town_spacing: 160.0,

            extra_zones: Vec::new(),
            npc_prefabs: None,
        }
    }
}

impl TownConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_world_radius <= 0.0 {
            return Err(format!(
                "max_world_radius ({}) must be positive",
                self.max_world_radius
            ));
        }

        // A town must fit inside the world with room for at least a neighbour
        if self.town_spacing < 0.0 || self.town_spacing > self.max_world_radius {
            return Err(format!(
                "town_spacing ({}) should be within 0..=max_world_radius ({})",
                self.town_spacing, self.max_world_radius
            ));
        }

        if self.max_streets == 0 || self.max_buildings == 0 {
            return Err("max_streets and max_buildings must be at least 1".into());
        }

        for zone in &self.extra_zones {
            if zone.key.trim().is_empty() {
                return Err("extra_zones entries need a non-empty key".into());
            }
            if zone.plot_width <= 0.0 || zone.plot_depth <= 0.0 {
                return Err(format!(
                    "zone '{}' needs positive plot_width and plot_depth",
                    zone.key
                ));
            }
        }

        Ok(())
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a config from a TOML string; absent keys keep their defaults
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: TownConfig =
            toml::from_str(content).map_err(|e| TownError::Config(e.to_string()))?;
        config.validate().map_err(TownError::Config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TownConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config = TownConfig::parse_toml(
            r#"
            max_world_radius = 500.0
            npc_prefabs = ["cowboy", "sheriff"]

            [[extra_zones]]
            key = "gold_mine"
            plot_width = 24.0
            plot_depth = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.max_world_radius, 500.0);
        assert_eq!(config.max_buildings, 64);
        assert_eq!(config.extra_zones.len(), 1);
        assert_eq!(config.extra_zones[0].key, "gold_mine");
        assert_eq!(
            config.npc_prefabs,
            Some(vec!["cowboy".to_string(), "sheriff".to_string()])
        );
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let result = TownConfig::parse_toml("max_world_radius = -1.0");
        assert!(matches!(result, Err(TownError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = TownConfig::parse_toml("max_streets = \"many\"");
        assert!(matches!(result, Err(TownError::Config(_))));
    }
}
