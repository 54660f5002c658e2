//! World-space placement of normalized, packed town entities
//!
//! Everything handed to a `WorldBuilder` is plain data computed here: world
//! position, yaw in degrees, footprint and classification. Coordinates in
//! a document are relative to the town origin; streets run along +Z.

use crate::core::types::{Vec3, YawDegrees};
use crate::town::layout::{SETBACK, STREET_WIDTH};
use crate::town::schema::{Building, Npc, Prop, Street};
use crate::town::zones::{InteriorStyle, Side, ZoneCatalog};
use serde::{Deserialize, Serialize};

/// Facade colour when a building does not specify one
pub const DEFAULT_COLOR: [f32; 3] = [0.55, 0.42, 0.30];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetPlacement {
    pub town: String,
    pub name: String,
    pub zone: String,
    /// Centre of the street surface
    pub center: Vec3,
    /// Extent along Z
    pub length: f32,
    /// Extent along X
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    pub town: String,
    pub name: String,
    pub street: String,
    pub zone: String,
    pub interior: InteriorStyle,
    pub side: Side,
    /// Centre of the footprint at ground level
    pub position: Vec3,
    /// Direction the facade faces
    pub yaw: YawDegrees,
    /// Width along the facade, height, depth away from the street
    pub size: Vec3,
    pub color: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Built-in prop shorthands; anything else passes through as `Custom`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    Lamp,
    Barrel,
    Crate,
    Well,
    Tree,
    Cactus,
    Bench,
    Fence,
    Cart,
    Trough,
    Sign,
    HitchingPost,
    Custom(String),
}

impl PropKind {
    /// Resolve a generator tag, accepting common spellings
    pub fn parse(tag: &str) -> Self {
        let key: String = tag
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "lamp" | "lamppost" | "streetlamp" | "lantern" => PropKind::Lamp,
            "barrel" | "barrels" | "keg" => PropKind::Barrel,
            "crate" | "crates" | "box" => PropKind::Crate,
            "well" | "waterwell" => PropKind::Well,
            "tree" => PropKind::Tree,
            "cactus" | "cacti" => PropKind::Cactus,
            "bench" => PropKind::Bench,
            "fence" => PropKind::Fence,
            "cart" | "wagon" => PropKind::Cart,
            "trough" | "watertrough" => PropKind::Trough,
            "sign" | "signpost" => PropKind::Sign,
            "hitchingpost" | "hitchingrail" | "hitch" => PropKind::HitchingPost,
            _ => PropKind::Custom(tag.trim().to_string()),
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, PropKind::Custom(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropPlacement {
    pub town: String,
    pub kind: PropKind,
    pub position: Vec3,
    pub yaw: YawDegrees,
    /// Explicit height override, if the document gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcPlacement {
    pub town: String,
    pub prefab: String,
    pub display_name: String,
    pub position: Vec3,
    pub speed: f32,
    pub wander_radius: f32,
}

/// Any placement, tagged for logs and JSON-lines output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Placement {
    Street(StreetPlacement),
    Building(BuildingPlacement),
    Prop(PropPlacement),
    Npc(NpcPlacement),
}

impl Placement {
    pub fn town(&self) -> &str {
        match self {
            Placement::Street(p) => &p.town,
            Placement::Building(p) => &p.town,
            Placement::Prop(p) => &p.town,
            Placement::Npc(p) => &p.town,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Placement::Street(p) => p.center,
            Placement::Building(p) => p.position,
            Placement::Prop(p) => p.position,
            Placement::Npc(p) => p.position,
        }
    }
}

pub fn street_center(origin: Vec3, street: &Street) -> Vec3 {
    origin + Vec3::new(street.center_x, 0.0, street.center_z)
}

pub fn place_street(town: &str, origin: Vec3, street: &Street) -> StreetPlacement {
    StreetPlacement {
        town: town.to_string(),
        name: street.name.clone(),
        zone: street.zone.clone(),
        center: street_center(origin, street),
        length: street.length,
        width: STREET_WIDTH,
    }
}

/// Place a building against its street.
///
/// Left/Right buildings sit beside the street at their packed offset,
/// facing it. End buildings sit beyond the end their offset points to
/// (zero counts as the far, +Z end), facing back down the street. The
/// facade width never exceeds the zone's plot width, so packed plots
/// cannot overlap.
pub fn place_building(
    town: &str,
    origin: Vec3,
    street: &Street,
    building: &Building,
    zones: &ZoneCatalog,
) -> BuildingPlacement {
    let zone = building.zone.clone().unwrap_or_default();
    let (plot_width, _) = zones.plot(&zone);
    let width = building.width.min(plot_width);
    let depth = building.depth;
    let center = street_center(origin, street);
    let side = building.layout_side();
    let offset = building.offset();

    let lateral = STREET_WIDTH / 2.0 + SETBACK + depth / 2.0;
    let (position, yaw) = match side {
        Side::Left => (center + Vec3::new(-lateral, 0.0, offset), 90.0),
        Side::Right => (center + Vec3::new(lateral, 0.0, offset), 270.0),
        Side::End => {
            let dir = if offset < 0.0 { -1.0 } else { 1.0 };
            let reach = street.length / 2.0 + SETBACK + depth / 2.0;
            let yaw = if dir > 0.0 { 180.0 } else { 0.0 };
            (center + Vec3::new(0.0, 0.0, dir * reach), yaw)
        }
    };

    BuildingPlacement {
        town: town.to_string(),
        name: building.name.clone(),
        street: street.name.clone(),
        zone,
        interior: building.parsed_interior().unwrap_or(InteriorStyle::Empty),
        side,
        position,
        yaw,
        size: Vec3::new(width, building.height, depth),
        color: building.color.unwrap_or(DEFAULT_COLOR),
        agent_id: building.agent_id.clone().filter(|id| !id.trim().is_empty()),
    }
}

pub fn place_prop(town: &str, origin: Vec3, prop: &Prop) -> PropPlacement {
    PropPlacement {
        town: town.to_string(),
        kind: PropKind::parse(&prop.kind),
        position: origin + Vec3::new(prop.x, 0.0, prop.z),
        yaw: prop.yaw,
        height: (prop.height > 0.0).then_some(prop.height),
        scale: prop.scale,
    }
}

pub fn place_npc(town: &str, origin: Vec3, npc: &Npc) -> NpcPlacement {
    NpcPlacement {
        town: town.to_string(),
        prefab: npc.prefab.clone(),
        display_name: npc.name.clone(),
        position: origin + Vec3::new(npc.x, 0.0, npc.z),
        speed: npc.speed,
        wander_radius: npc.wander_radius,
    }
}
