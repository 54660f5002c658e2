//! Wire schema for generator-authored town documents ("CityDef")
//!
//! These structs accept every encoding the generator is known to use.
//! Classifications (`zone`, `side`, `interior`) stay as strings so that the
//! Auditor can report exactly what was written; `normalize` rewrites them
//! into canonical spellings and typed accessors parse them.

use crate::core::error::Result;
use crate::core::lenient::{
    lenient_bool, lenient_f32, lenient_index, lenient_opt_f32, lenient_string, lenient_vec,
};
use crate::core::types::GroundPoint;
use crate::llm::{attempt_repair, extract_json, sanitize};
use crate::town::zones::{InteriorStyle, Side};
use serde::{Deserialize, Serialize};

/// Root of a town document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TownDocument {
    /// Identifier for idempotent rebuilds and persistence
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    /// Replace an existing same-named town in place instead of moving it
    #[serde(deserialize_with = "lenient_bool")]
    pub edit: bool,
    /// Absolute placement; overrides the caller's origin when present
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_f32")]
    pub world_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_f32")]
    pub world_z: Option<f32>,
    #[serde(deserialize_with = "lenient_vec")]
    pub streets: Vec<Street>,
    #[serde(deserialize_with = "lenient_vec")]
    pub buildings: Vec<Building>,
    #[serde(deserialize_with = "lenient_vec")]
    pub npcs: Vec<Npc>,
    #[serde(deserialize_with = "lenient_vec")]
    pub props: Vec<Prop>,
    /// Shorthand NPC list: prefabs only, positions chosen for them
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_vec")]
    pub wandering_npcs: Vec<WanderingNpc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Street {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub zone: String,
    #[serde(deserialize_with = "lenient_f32")]
    pub center_x: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub center_z: f32,
    /// Runs along Z, centred on `center_z`
    #[serde(deserialize_with = "lenient_f32")]
    pub length: f32,
    /// Alternate encoding: polyline collapsed to centre + length
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_vec")]
    pub points: Vec<GroundPoint>,
}

impl Street {
    /// Has an explicit centreline and length
    pub fn has_centerline(&self) -> bool {
        self.length > 0.0
    }

    pub fn has_polyline(&self) -> bool {
        self.points.len() >= 2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Building {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    /// Offset along the street from its centre
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "offset",
        deserialize_with = "lenient_opt_f32"
    )]
    pub z_pos: Option<f32>,
    #[serde(deserialize_with = "lenient_f32")]
    pub width: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub height: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub depth: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interior: Option<String>,
    #[serde(deserialize_with = "lenient_index", alias = "street")]
    pub street_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Alternate encoding: absolute town-space position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GroundPoint>,
}

impl Building {
    pub fn parsed_side(&self) -> Option<Side> {
        self.side.as_deref().and_then(Side::parse)
    }

    /// Side used for layout; an unreadable side falls back to `Left`
    pub fn layout_side(&self) -> Side {
        self.parsed_side().unwrap_or(Side::Left)
    }

    pub fn parsed_interior(&self) -> Option<InteriorStyle> {
        self.interior.as_deref().and_then(InteriorStyle::parse)
    }

    pub fn offset(&self) -> f32 {
        self.z_pos.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Npc {
    #[serde(deserialize_with = "lenient_string")]
    pub prefab: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub z: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub speed: f32,
    #[serde(rename = "radius", deserialize_with = "lenient_f32")]
    pub wander_radius: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GroundPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prop {
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub z: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub yaw: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub height: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GroundPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderingNpc {
    #[serde(deserialize_with = "lenient_string")]
    pub prefab: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A document that made it through syntax repair
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: TownDocument,
    /// The JSON text that actually deserialized
    pub text: String,
    /// Whether truncation repair was needed
    pub repaired: bool,
}

impl TownDocument {
    /// Extract, sanitize and deserialize generator output, falling back to
    /// truncation repair. Does not normalize and does not require a name.
    pub fn parse(raw: &str) -> Result<ParsedDocument> {
        let body = extract_json(raw).unwrap_or(raw);
        let cleaned = sanitize(body);

        match serde_json::from_str::<TownDocument>(&cleaned) {
            Ok(document) => Ok(ParsedDocument {
                document,
                text: cleaned,
                repaired: false,
            }),
            Err(direct) => {
                let text = attempt_repair(body).ok_or_else(|| {
                    crate::core::error::TownError::UnrecoverableSyntax(direct.to_string())
                })?;
                let document = serde_json::from_str(&text)?;
                tracing::info!("Recovered malformed town document after: {}", direct);
                Ok(ParsedDocument {
                    document,
                    text,
                    repaired: true,
                })
            }
        }
    }
}
