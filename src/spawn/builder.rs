//! World-construction collaborator
//!
//! The spawner never touches a scene graph. It hands fully resolved
//! placements to a `WorldBuilder` and carries on whatever the builder
//! reports; a failed entity never rolls back the spawner's bookkeeping.

use crate::spawn::placement::{
    BuildingPlacement, NpcPlacement, Placement, PropPlacement, StreetPlacement,
};
use std::io::Write;
use thiserror::Error;

/// Failure reported by a world builder for a single entity
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Construction rejected: {0}")]
    Rejected(String),

    #[error("Missing asset: {0}")]
    MissingAsset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Receives placements and turns them into world objects
pub trait WorldBuilder {
    fn place_street(&mut self, street: &StreetPlacement) -> Result<(), BuildError>;

    fn place_building(&mut self, building: &BuildingPlacement) -> Result<(), BuildError>;

    fn place_prop(&mut self, prop: &PropPlacement) -> Result<(), BuildError>;

    fn place_npc(&mut self, npc: &NpcPlacement) -> Result<(), BuildError>;

    /// Tear down everything previously built for `town`
    fn remove_town(&mut self, town: &str);
}

/// Keeps every placement in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingBuilder {
    placements: Vec<Placement>,
    removed: Vec<String>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Placements still standing for one town
    pub fn town(&self, town: &str) -> impl Iterator<Item = &Placement> {
        let town = town.to_string();
        self.placements.iter().filter(move |p| p.town() == town)
    }

    pub fn buildings(&self, town: &str) -> Vec<&BuildingPlacement> {
        self.town(town)
            .filter_map(|p| match p {
                Placement::Building(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Towns torn down so far, in order
    pub fn removed(&self) -> &[String] {
        &self.removed
    }
}

impl WorldBuilder for RecordingBuilder {
    fn place_street(&mut self, street: &StreetPlacement) -> Result<(), BuildError> {
        self.placements.push(Placement::Street(street.clone()));
        Ok(())
    }

    fn place_building(&mut self, building: &BuildingPlacement) -> Result<(), BuildError> {
        self.placements.push(Placement::Building(building.clone()));
        Ok(())
    }

    fn place_prop(&mut self, prop: &PropPlacement) -> Result<(), BuildError> {
        self.placements.push(Placement::Prop(prop.clone()));
        Ok(())
    }

    fn place_npc(&mut self, npc: &NpcPlacement) -> Result<(), BuildError> {
        self.placements.push(Placement::Npc(npc.clone()));
        Ok(())
    }

    fn remove_town(&mut self, town: &str) {
        self.placements.retain(|p| p.town() != town);
        self.removed.push(town.to_string());
    }
}

/// Writes each placement as one JSON object per line
pub struct JsonLinesBuilder<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesBuilder<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    fn emit(&mut self, placement: &Placement) -> Result<(), BuildError> {
        serde_json::to_writer(&mut self.out, placement)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> WorldBuilder for JsonLinesBuilder<W> {
    fn place_street(&mut self, street: &StreetPlacement) -> Result<(), BuildError> {
        self.emit(&Placement::Street(street.clone()))
    }

    fn place_building(&mut self, building: &BuildingPlacement) -> Result<(), BuildError> {
        self.emit(&Placement::Building(building.clone()))
    }

    fn place_prop(&mut self, prop: &PropPlacement) -> Result<(), BuildError> {
        self.emit(&Placement::Prop(prop.clone()))
    }

    fn place_npc(&mut self, npc: &NpcPlacement) -> Result<(), BuildError> {
        self.emit(&Placement::Npc(npc.clone()))
    }

    fn remove_town(&mut self, town: &str) {
        let line = serde_json::json!({ "entity": "remove_town", "town": town });
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::warn!("Failed to write removal of '{}': {}", town, e);
        }
    }
}
