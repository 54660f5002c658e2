//! Zone, side and interior classifications
//!
//! Zones drive both plot size during packing and what the world builder
//! puts inside a building. The built-in catalog covers a frontier town;
//! callers extend it through `TownConfig::extra_zones`.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zone assigned when nothing else matches
pub const DEFAULT_ZONE: &str = "commercial";

/// Zone assigned to streets that do not declare one
pub const DEFAULT_STREET_ZONE: &str = "main_street";

/// Plot footprint a zone reserves along and across its street
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Canonical key, e.g. `general_store`
    pub key: String,
    /// Width reserved along the street
    pub plot_width: f32,
    /// Depth reserved away from the street
    pub plot_depth: f32,
}

impl ZoneSpec {
    pub fn new(key: &str, plot_width: f32, plot_depth: f32) -> Self {
        Self {
            key: canonical_zone_key(key),
            plot_width,
            plot_depth,
        }
    }
}

/// (key, plot width, plot depth)
const BUILTIN_ZONES: &[(&str, f32, f32)] = &[
    ("main_street", 13.0, 12.0),
    ("commercial", 13.0, 12.0),
    ("general_store", 13.0, 12.0),
    ("saloon", 15.0, 14.0),
    ("bank", 14.0, 14.0),
    ("hotel", 16.0, 14.0),
    ("sheriff", 13.0, 12.0),
    ("blacksmith", 13.0, 12.0),
    ("stable", 16.0, 16.0),
    ("residential", 11.0, 10.0),
    ("church", 18.0, 16.0),
    ("civic", 20.0, 16.0),
    ("landmark", 22.0, 18.0),
    ("wilderness", 13.0, 12.0),
];

/// Set of zones a document may use, with their plot sizes
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    zones: AHashMap<String, ZoneSpec>,
    /// Keys in insertion order, for stable error messages
    order: Vec<String>,
}

impl ZoneCatalog {
    /// The built-in frontier-town zones
    pub fn builtin() -> Self {
        let mut catalog = Self {
            zones: AHashMap::new(),
            order: Vec::new(),
        };
        for &(key, width, depth) in BUILTIN_ZONES {
            catalog.add(ZoneSpec::new(key, width, depth));
        }
        catalog
    }

    /// Built-in zones plus caller-supplied ones
    pub fn with_extra(extra: &[ZoneSpec]) -> Self {
        let mut catalog = Self::builtin();
        for zone in extra {
            catalog.add(ZoneSpec::new(&zone.key, zone.plot_width, zone.plot_depth));
        }
        catalog
    }

    /// Add or replace a zone
    pub fn add(&mut self, zone: ZoneSpec) {
        if !self.zones.contains_key(&zone.key) {
            self.order.push(zone.key.clone());
        }
        self.zones.insert(zone.key.clone(), zone);
    }

    /// Look up a zone by any spelling that canonicalises to its key
    pub fn resolve(&self, name: &str) -> Option<&ZoneSpec> {
        self.zones.get(&canonical_zone_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Plot size for a zone; unknown zones get the commercial plot
    pub fn plot(&self, name: &str) -> (f32, f32) {
        self.resolve(name)
            .or_else(|| self.zones.get(DEFAULT_ZONE))
            .map(|z| (z.plot_width, z.plot_depth))
            .unwrap_or((13.0, 12.0))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl Default for ZoneCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Canonical spelling of a zone name: trimmed, lower-case, `_`-separated
pub fn canonical_zone_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Which side of its street a building stands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    /// Beyond one end of the street, facing down it
    End,
}

impl Side {
    pub const ALL: [Side; 3] = [Side::Left, Side::Right, Side::End];

    /// Case-insensitive parse of the wire spelling
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            "end" => Some(Side::End),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
            Side::End => "End",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interior furnishing style of a building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteriorStyle {
    Empty,
    Saloon,
    Store,
    Bank,
    Hotel,
    Jail,
    Smithy,
    Stable,
    Church,
    House,
    Office,
}

impl InteriorStyle {
    pub const ALL: [InteriorStyle; 11] = [
        InteriorStyle::Empty,
        InteriorStyle::Saloon,
        InteriorStyle::Store,
        InteriorStyle::Bank,
        InteriorStyle::Hotel,
        InteriorStyle::Jail,
        InteriorStyle::Smithy,
        InteriorStyle::Stable,
        InteriorStyle::Church,
        InteriorStyle::House,
        InteriorStyle::Office,
    ];

    /// Case-insensitive parse of the wire spelling
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteriorStyle::Empty => "Empty",
            InteriorStyle::Saloon => "Saloon",
            InteriorStyle::Store => "Store",
            InteriorStyle::Bank => "Bank",
            InteriorStyle::Hotel => "Hotel",
            InteriorStyle::Jail => "Jail",
            InteriorStyle::Smithy => "Smithy",
            InteriorStyle::Stable => "Stable",
            InteriorStyle::Church => "Church",
            InteriorStyle::House => "House",
            InteriorStyle::Office => "Office",
        }
    }

    /// Zone implied by the furnishing, if any
    pub fn zone(&self) -> Option<&'static str> {
        match self {
            InteriorStyle::Empty => None,
            InteriorStyle::Saloon => Some("saloon"),
            InteriorStyle::Store => Some("general_store"),
            InteriorStyle::Bank => Some("bank"),
            InteriorStyle::Hotel => Some("hotel"),
            InteriorStyle::Jail => Some("sheriff"),
            InteriorStyle::Smithy => Some("blacksmith"),
            InteriorStyle::Stable => Some("stable"),
            InteriorStyle::Church => Some("church"),
            InteriorStyle::House => Some("residential"),
            InteriorStyle::Office => Some("civic"),
        }
    }
}

impl fmt::Display for InteriorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name fragments that imply a zone. First match wins, so more specific
/// words come before words they contain ("barn" before "bar").
const NAME_KEYWORDS: &[(&str, &str)] = &[
    ("sheriff", "sheriff"),
    ("jail", "sheriff"),
    ("marshal", "sheriff"),
    ("stable", "stable"),
    ("livery", "stable"),
    ("barn", "stable"),
    ("saloon", "saloon"),
    ("tavern", "saloon"),
    ("cantina", "saloon"),
    ("bar", "saloon"),
    ("bank", "bank"),
    ("church", "church"),
    ("chapel", "church"),
    ("hotel", "hotel"),
    ("inn", "hotel"),
    ("smith", "blacksmith"),
    ("forge", "blacksmith"),
    ("mercantile", "general_store"),
    ("store", "general_store"),
    ("shop", "general_store"),
    ("court", "civic"),
    ("hall", "civic"),
    ("office", "civic"),
    ("monument", "landmark"),
    ("statue", "landmark"),
    ("tower", "landmark"),
    ("house", "residential"),
    ("home", "residential"),
    ("cabin", "residential"),
];

/// Infer a zone for a building that did not declare one: interior style
/// first, then keywords in its name, then the generic commercial zone
pub fn infer_zone(interior: Option<&str>, name: &str) -> &'static str {
    if let Some(zone) = interior.and_then(InteriorStyle::parse).and_then(|s| s.zone()) {
        return zone;
    }
    let lowered = name.to_lowercase();
    NAME_KEYWORDS
        .iter()
        .find(|(word, _)| lowered.contains(word))
        .map(|&(_, zone)| zone)
        .unwrap_or(DEFAULT_ZONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_spelling_insensitive() {
        let catalog = ZoneCatalog::builtin();
        assert!(catalog.contains("General Store"));
        assert!(catalog.contains("general-store"));
        assert!(catalog.contains("SALOON"));
        assert!(!catalog.contains("spaceport"));
    }

    #[test]
    fn test_extra_zones_extend_catalog() {
        let catalog = ZoneCatalog::with_extra(&[ZoneSpec::new("Gold Mine", 24.0, 20.0)]);
        assert!(catalog.contains("gold_mine"));
        assert_eq!(catalog.plot("gold mine"), (24.0, 20.0));
        assert_eq!(catalog.keys().last(), Some("gold_mine"));
    }

    #[test]
    fn test_unknown_zone_gets_commercial_plot() {
        let catalog = ZoneCatalog::builtin();
        assert_eq!(catalog.plot("spaceport"), catalog.plot("commercial"));
        assert!(catalog.plot("civic").0 > catalog.plot("commercial").0);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("left"), Some(Side::Left));
        assert_eq!(Side::parse(" RIGHT "), Some(Side::Right));
        assert_eq!(Side::parse("End"), Some(Side::End));
        assert_eq!(Side::parse("middle"), None);
    }

    #[test]
    fn test_interior_parse() {
        assert_eq!(InteriorStyle::parse("saloon"), Some(InteriorStyle::Saloon));
        assert_eq!(InteriorStyle::parse("EMPTY"), Some(InteriorStyle::Empty));
        assert_eq!(InteriorStyle::parse("disco"), None);
    }

    #[test]
    fn test_infer_zone_prefers_interior() {
        assert_eq!(infer_zone(Some("Bank"), "Golden Saloon"), "bank");
    }

    #[test]
    fn test_infer_zone_from_name() {
        assert_eq!(infer_zone(None, "The Lucky Bar"), "saloon");
        assert_eq!(infer_zone(None, "Old Tavern"), "saloon");
        assert_eq!(infer_zone(None, "Red Barn"), "stable");
        assert_eq!(infer_zone(None, "Sheriff's Office"), "sheriff");
        assert_eq!(infer_zone(Some("Empty"), "Courthouse"), "civic");
    }

    #[test]
    fn test_infer_zone_default() {
        assert_eq!(infer_zone(None, "Building 7"), DEFAULT_ZONE);
        assert_eq!(infer_zone(Some("disco"), "Mystery"), DEFAULT_ZONE);
    }
}
