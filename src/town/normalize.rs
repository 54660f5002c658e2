//! Canonicalisation of equivalent town encodings
//!
//! Generators describe the same town several ways: polylines instead of
//! centrelines, absolute `position` objects instead of street-relative
//! offsets, a bare prefab list instead of placed NPCs. `normalize` rewrites
//! all of them into the single shape the packer and spawner consume.
//!
//! Every rule only fires on input it has not already rewritten, so running
//! `normalize` twice is the same as running it once.

use crate::core::types::{ground_bounds, GroundPoint};
use crate::town::schema::{Building, Npc, Street, TownDocument};
use crate::town::zones::{canonical_zone_key, infer_zone, InteriorStyle, Side, DEFAULT_STREET_ZONE};
use ahash::AHashSet;

/// Length given to streets that carry no usable geometry
pub const DEFAULT_STREET_LENGTH: f32 = 40.0;

/// Spacing between NPCs synthesized from the shorthand list
pub const NPC_SPREAD: f32 = 3.0;

pub const DEFAULT_NPC_SPEED: f32 = 1.5;
pub const DEFAULT_WANDER_RADIUS: f32 = 8.0;

/// (default, min, max)
const WIDTH_RANGE: (f32, f32, f32) = (10.0, 4.0, 24.0);
const HEIGHT_RANGE: (f32, f32, f32) = (6.0, 3.0, 20.0);
const DEPTH_RANGE: (f32, f32, f32) = (10.0, 4.0, 24.0);
const SPEED_RANGE: (f32, f32, f32) = (DEFAULT_NPC_SPEED, 0.1, 6.0);
const RADIUS_RANGE: (f32, f32, f32) = (DEFAULT_WANDER_RADIUS, 1.0, 40.0);
const SCALE_RANGE: (f32, f32, f32) = (1.0, 0.1, 10.0);

/// Rewrite a deserialized document into canonical form, in place
pub fn normalize(doc: &mut TownDocument) {
    doc.name = doc.name.trim().to_string();
    doc.world_x = doc.world_x.filter(|x| x.is_finite());
    doc.world_z = doc.world_z.filter(|z| z.is_finite());

    synthesize_npcs(doc);
    normalize_streets(doc);

    if doc.streets.is_empty() && !doc.buildings.is_empty() {
        tracing::debug!("Town '{}' has buildings but no streets; adding Main Street", doc.name);
        doc.streets.push(Street {
            name: "Main Street".into(),
            zone: DEFAULT_STREET_ZONE.into(),
            length: DEFAULT_STREET_LENGTH,
            ..Default::default()
        });
    }

    for building in &mut doc.buildings {
        normalize_classification(building);
        building.position = building.position.filter(GroundPoint::is_finite);
        building.z_pos = building.z_pos.filter(|z| z.is_finite());
    }
    for building in &mut doc.buildings {
        place_from_position(building, &doc.streets);
    }

    let last_street = doc.streets.len().saturating_sub(1);
    for building in &mut doc.buildings {
        building.street_index = building.street_index.min(last_street);
        building.z_pos.get_or_insert(0.0);
        building.width = sane(building.width, WIDTH_RANGE);
        building.height = sane(building.height, HEIGHT_RANGE);
        building.depth = sane(building.depth, DEPTH_RANGE);
        if let Some(color) = building.color.as_mut() {
            normalize_color(color);
        }
    }
    dedupe_building_names(&mut doc.buildings);

    for npc in &mut doc.npcs {
        npc.position = npc.position.filter(GroundPoint::is_finite);
        npc.x = finite_or_zero(npc.x);
        npc.z = finite_or_zero(npc.z);
        adopt_position(&mut npc.x, &mut npc.z, npc.position);
        npc.speed = sane(npc.speed, SPEED_RANGE);
        npc.wander_radius = sane(npc.wander_radius, RADIUS_RANGE);
    }
    for prop in &mut doc.props {
        prop.position = prop.position.filter(GroundPoint::is_finite);
        prop.x = finite_or_zero(prop.x);
        prop.z = finite_or_zero(prop.z);
        prop.yaw = finite_or_zero(prop.yaw);
        prop.height = finite_or_zero(prop.height);
        adopt_position(&mut prop.x, &mut prop.z, prop.position);
        prop.scale = sane(prop.scale, SCALE_RANGE);
        prop.kind = prop.kind.trim().to_string();
    }
}

/// Expand the shorthand prefab list when no placed NPCs exist
fn synthesize_npcs(doc: &mut TownDocument) {
    if doc.wandering_npcs.is_empty() || !doc.npcs.is_empty() {
        return;
    }
    let count = doc.wandering_npcs.len();
    let first_x = -(count as f32 - 1.0) * NPC_SPREAD / 2.0;
    doc.npcs = doc
        .wandering_npcs
        .iter()
        .enumerate()
        .map(|(i, simple)| Npc {
            prefab: simple.prefab.trim().to_string(),
            name: simple
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("{} {}", simple.prefab.trim(), i + 1)),
            x: first_x + i as f32 * NPC_SPREAD,
            z: 0.0,
            speed: DEFAULT_NPC_SPEED,
            wander_radius: DEFAULT_WANDER_RADIUS,
            position: None,
        })
        .collect();
}

fn normalize_streets(doc: &mut TownDocument) {
    for (i, street) in doc.streets.iter_mut().enumerate() {
        street.points.retain(GroundPoint::is_finite);
        if !street.has_centerline() && street.has_polyline() {
            if let Some((min, max)) = ground_bounds(&street.points) {
                street.center_x = (min.x + max.x) / 2.0;
                street.center_z = (min.z + max.z) / 2.0;
                street.length = (max.x - min.x).max(max.z - min.z);
            }
        }
        if !street.length.is_finite() || street.length <= 0.0 {
            street.length = DEFAULT_STREET_LENGTH;
        }
        street.center_x = finite_or_zero(street.center_x);
        street.center_z = finite_or_zero(street.center_z);

        street.name = street.name.trim().to_string();
        if street.name.is_empty() {
            street.name = format!("Street {}", i + 1);
        }
        street.zone = canonical_zone_key(&street.zone);
        if street.zone.is_empty() {
            street.zone = DEFAULT_STREET_ZONE.into();
        }
    }
}

/// Fill in a missing zone and canonicalise zone, side and interior spelling
fn normalize_classification(building: &mut Building) {
    building.name = building.name.trim().to_string();

    let zone = building.zone.as_deref().map(canonical_zone_key).unwrap_or_default();
    building.zone = Some(if zone.is_empty() {
        infer_zone(building.interior.as_deref(), &building.name).to_string()
    } else {
        zone
    });

    if let Some(side) = building.parsed_side() {
        building.side = Some(side.as_str().to_string());
    }
    if let Some(style) = building.parsed_interior() {
        building.interior = Some(style.as_str().to_string());
    }
}

/// Derive street, side and offset from an absolute position. Only `Left`
/// or `Right` come out of this; `End` must be declared explicitly.
fn place_from_position(building: &mut Building, streets: &[Street]) {
    let Some(pos) = building.position else {
        return;
    };
    if building.side.is_some() {
        return;
    }
    let nearest = streets.iter().enumerate().min_by(|(_, a), (_, b)| {
        (pos.x - a.center_x)
            .abs()
            .total_cmp(&(pos.x - b.center_x).abs())
    });
    let Some((index, street)) = nearest else {
        return;
    };

    let side = if pos.x < street.center_x {
        Side::Left
    } else {
        Side::Right
    };
    building.street_index = index;
    building.side = Some(side.as_str().to_string());
    building.z_pos = Some(pos.z - street.center_z);
}

fn adopt_position(x: &mut f32, z: &mut f32, position: Option<GroundPoint>) {
    if let Some(pos) = position {
        if *x == 0.0 && *z == 0.0 {
            *x = pos.x;
            *z = pos.z;
        }
    }
}

/// Overflowed coordinates (`1e39` reads as infinity) fall back to the origin
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Replace non-positive or non-finite values with a default, then clamp
fn sane(value: f32, (default, min, max): (f32, f32, f32)) -> f32 {
    if value.is_finite() && value > 0.0 {
        value.clamp(min, max)
    } else {
        default
    }
}

/// Generators mix 0..1 and 0..255 colour channels
fn normalize_color(color: &mut [f32; 3]) {
    if color.iter().any(|c| *c > 1.0) {
        for c in color.iter_mut() {
            *c /= 255.0;
        }
    }
    for c in color.iter_mut() {
        *c = if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 };
    }
}

/// Name blanks `Building N` and suffix duplicates with ` (2)`, ` (3)`, ...
fn dedupe_building_names(buildings: &mut [Building]) {
    let mut taken: AHashSet<String> = AHashSet::new();
    for (i, building) in buildings.iter_mut().enumerate() {
        if building.name.is_empty() {
            building.name = format!("Building {}", i + 1);
        }
        if !taken.insert(building.name.clone()) {
            let base = building.name.clone();
            let mut n = 2;
            while taken.contains(&format!("{} ({})", base, n)) {
                n += 1;
            }
            building.name = format!("{} ({})", base, n);
            taken.insert(building.name.clone());
        }
    }
}

/// Whether a building's interior is absent, parseable, or neither
pub fn interior_is_valid(building: &Building) -> bool {
    building
        .interior
        .as_deref()
        .map_or(true, |s| InteriorStyle::parse(s).is_some())
}
