//! Town spawning: parse, normalize, pack, place, persist
//!
//! `TownSpawner` is the single entry point that turns generator output into
//! world placements. Each document is processed independently; a bad
//! document yields an error for that document only, and a bad entity is
//! skipped without failing its town.

use crate::core::config::TownConfig;
use crate::core::error::{Result, TownError};
use crate::core::types::{horizontal_distance, Vec3};
use crate::llm::extract_documents;
use crate::spawn::builder::WorldBuilder;
use crate::spawn::placement::{place_building, place_npc, place_prop, place_street};
use crate::spawn::policy::PlacementPolicy;
use crate::spawn::registry::{BuiltTown, TownRegistry};
use crate::spawn::store::{SavedTown, TownStore};
use crate::town::layout::auto_pack;
use crate::town::normalize::normalize;
use crate::town::schema::TownDocument;
use crate::town::zones::ZoneCatalog;
use serde::Serialize;
use std::fmt;

/// What a build actually put into the world
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub town: String,
    pub streets: usize,
    pub buildings: usize,
    pub props: usize,
    pub npcs: usize,
    /// Entities dropped because their position was forbidden
    pub skipped: usize,
    /// Streets lengthened by auto-packing
    pub streets_extended: usize,
    /// Whether truncation repair was needed to read the document
    pub repaired: bool,
    /// Whether the saved record was written
    pub persisted: bool,
}

impl BuildSummary {
    pub fn new(town: &str) -> Self {
        Self {
            town: town.to_string(),
            ..Default::default()
        }
    }

    /// Entities handed to the builder successfully
    pub fn placed(&self) -> usize {
        self.streets + self.buildings + self.props + self.npcs
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} streets, {} buildings, {} props, {} NPCs",
            self.town, self.streets, self.buildings, self.props, self.npcs
        )?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        if !self.persisted {
            write!(f, " [not saved]")?;
        }
        Ok(())
    }
}

/// Result of one successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub summary: BuildSummary,
    /// Origin the town was finally built at
    pub origin: Vec3,
}

/// One document of a multi-document response
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// Position of the document in the response
    pub index: usize,
    pub result: std::result::Result<BuildOutcome, String>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OriginMode {
    /// Absolute coordinates, nudging and edit reuse all apply
    Resolve,
    /// Build exactly at the given origin
    Pinned,
}

/// Builds towns into a world through an injected builder
pub struct TownSpawner<B: WorldBuilder, S: TownStore, P: PlacementPolicy> {
    config: TownConfig,
    zones: ZoneCatalog,
    builder: B,
    store: S,
    policy: P,
    registry: TownRegistry,
}

impl<B: WorldBuilder, S: TownStore, P: PlacementPolicy> TownSpawner<B, S, P> {
    pub fn new(config: TownConfig, builder: B, store: S, policy: P) -> Self {
        let zones = ZoneCatalog::with_extra(&config.extra_zones);
        Self {
            config,
            zones,
            builder,
            store,
            policy,
            registry: TownRegistry::new(),
        }
    }

    pub fn config(&self) -> &TownConfig {
        &self.config
    }

    pub fn zones(&self) -> &ZoneCatalog {
        &self.zones
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &TownRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Build one town document at `origin`, replacing any same-named town
    pub fn build(&mut self, raw_text: &str, origin: Vec3) -> Result<BuildOutcome> {
        self.build_with(raw_text, origin, OriginMode::Resolve)
    }

    /// Build every document in a response.
    ///
    /// Documents are built in order. Each success moves the default origin
    /// of the next document to its own origin plus `town_spacing` on X;
    /// failures are reported per document and never stop the batch.
    pub fn build_response(&mut self, response_text: &str, origin: Vec3) -> Vec<BatchEntry> {
        let mut documents = extract_documents(response_text);
        if documents.is_empty() {
            documents.push(response_text);
        }

        let mut next_origin = origin;
        let mut entries = Vec::with_capacity(documents.len());
        for (index, document) in documents.into_iter().enumerate() {
            let result = match self.build(document, next_origin) {
                Ok(outcome) => {
                    next_origin = outcome.origin + Vec3::new(self.config.town_spacing, 0.0, 0.0);
                    Ok(outcome)
                }
                Err(e) => {
                    tracing::warn!("Document {} of response failed: {}", index, e);
                    Err(e.to_string())
                }
            };
            entries.push(BatchEntry { index, result });
        }
        entries
    }

    /// Rebuild a saved town exactly where it was built
    pub fn restore(&mut self, name: &str) -> Result<BuildOutcome> {
        let record = self
            .store
            .load(name)?
            .ok_or_else(|| TownError::NotFound(name.to_string()))?;
        self.build_with(&record.document_text, record.origin(), OriginMode::Pinned)
    }

    /// Rebuild every saved town; one failure does not stop the rest
    pub fn restore_all(&mut self) -> Result<Vec<(String, Result<BuildOutcome>)>> {
        let names = self.store.names()?;
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let outcome = self.restore(&name);
            if let Err(e) = &outcome {
                tracing::warn!("Failed to restore '{}': {}", name, e);
            }
            results.push((name, outcome));
        }
        Ok(results)
    }

    /// Tear down a town, forget it and delete its record.
    ///
    /// Returns whether anything was known about the town.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let registered = self.registry.remove(name).is_some();
        let saved = self.store.delete(name)?;
        if registered || saved {
            self.builder.remove_town(name);
            tracing::info!("Removed town '{}'", name);
        }
        Ok(registered || saved)
    }

    fn build_with(&mut self, raw_text: &str, origin: Vec3, mode: OriginMode) -> Result<BuildOutcome> {
        let parsed = TownDocument::parse(raw_text)?;
        let mut doc = parsed.document;
        let name = doc.name.trim().to_string();
        if name.is_empty() {
            return Err(TownError::EmptyName);
        }
        doc.name = name.clone();

        self.apply_caps(&mut doc);
        normalize(&mut doc);
        let pack = auto_pack(&mut doc, &self.zones);

        let mut origin = match mode {
            OriginMode::Resolve => self.resolve_origin(&doc, origin),
            OriginMode::Pinned => origin,
        };

        if let Some(prior) = self.retire_prior(&name) {
            if doc.edit && mode == OriginMode::Resolve {
                tracing::debug!("Editing '{}' in place at {}", name, prior);
                origin = prior;
            }
        }

        let mut summary = BuildSummary::new(&name);
        summary.repaired = parsed.repaired;
        summary.streets_extended = pack.extended.len();
        self.place_entities(&doc, origin, &mut summary);

        summary.persisted = match self.store.save(&SavedTown::new(&name, &parsed.text, origin)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save town '{}': {}", name, e);
                false
            }
        };

        tracing::info!("Built {} at {}", summary, origin);
        self.registry.insert(BuiltTown {
            name,
            origin,
            summary: summary.clone(),
        });
        Ok(BuildOutcome { summary, origin })
    }

    /// Drop entities past the per-document caps
    fn apply_caps(&self, doc: &mut TownDocument) {
        let before = (doc.streets.len(), doc.buildings.len(), doc.props.len(), doc.npcs.len());
        doc.streets.truncate(self.config.max_streets);
        doc.buildings.truncate(self.config.max_buildings);
        doc.props.truncate(self.config.max_props);
        doc.npcs.truncate(self.config.max_npcs);
        let room = self.config.max_npcs.saturating_sub(doc.npcs.len());
        doc.wandering_npcs.truncate(room);

        let after = (doc.streets.len(), doc.buildings.len(), doc.props.len(), doc.npcs.len());
        if before != after {
            tracing::debug!(
                "Capped '{}' from {:?} to {:?} (streets, buildings, props, npcs)",
                doc.name,
                before,
                after
            );
        }
    }

    /// Absolute coordinates override the caller; a forbidden origin gets
    /// one nudge if the policy offers it
    fn resolve_origin(&self, doc: &TownDocument, caller: Vec3) -> Vec3 {
        let mut origin = caller;
        let world_x = doc.world_x.filter(|x| x.is_finite());
        let world_z = doc.world_z.filter(|z| z.is_finite());
        if world_x.is_some() || world_z.is_some() {
            origin.x = world_x.unwrap_or(caller.x);
            origin.z = world_z.unwrap_or(caller.z);
        }

        if self.is_forbidden(origin) {
            match self.policy.nudge(origin).filter(|p| p.is_finite()) {
                Some(nudged) => {
                    tracing::info!("Nudged origin of '{}' from {} to {}", doc.name, origin, nudged);
                    origin = nudged;
                }
                None => tracing::warn!("Origin {} of '{}' is forbidden", origin, doc.name),
            }
        }
        origin
    }

    /// Tear down and forget a same-named town, returning its origin
    fn retire_prior(&mut self, name: &str) -> Option<Vec3> {
        let prior = match self.registry.remove(name) {
            Some(town) => Some(town.origin),
            None => match self.store.load(name) {
                Ok(record) => record.map(|r| r.origin()),
                Err(e) => {
                    tracing::warn!("Could not read saved record for '{}': {}", name, e);
                    None
                }
            },
        };

        if let Err(e) = self.store.delete(name) {
            tracing::error!("Failed to delete saved record for '{}': {}", name, e);
        }
        if prior.is_some() {
            tracing::info!("Replacing existing town '{}'", name);
            self.builder.remove_town(name);
        }
        prior
    }

    /// Outside the world radius, rejected by the policy, or not a real point
    fn is_forbidden(&self, position: Vec3) -> bool {
        if !position.is_finite() {
            return true;
        }
        let [cx, cz] = self.config.world_center;
        let center = Vec3::new(cx, position.y, cz);
        horizontal_distance(position, center) > self.config.max_world_radius
            || self.policy.is_forbidden(position)
    }

    fn place_entities(&mut self, doc: &TownDocument, origin: Vec3, summary: &mut BuildSummary) {
        let town = doc.name.as_str();

        for street in &doc.streets {
            let placement = place_street(town, origin, street);
            if self.is_forbidden(placement.center) {
                tracing::warn!("Skipping street '{}' at forbidden {}", street.name, placement.center);
                summary.skipped += 1;
                continue;
            }
            match self.builder.place_street(&placement) {
                Ok(()) => summary.streets += 1,
                Err(e) => tracing::warn!("Builder failed on street '{}': {}", street.name, e),
            }
        }

        for building in &doc.buildings {
            let Some(street) = doc.streets.get(building.street_index) else {
                tracing::warn!("Skipping building '{}' with no street", building.name);
                summary.skipped += 1;
                continue;
            };
            let placement = place_building(town, origin, street, building, &self.zones);
            if self.is_forbidden(placement.position) {
                tracing::warn!(
                    "Skipping building '{}' at forbidden {}",
                    building.name,
                    placement.position
                );
                summary.skipped += 1;
                continue;
            }
            match self.builder.place_building(&placement) {
                Ok(()) => summary.buildings += 1,
                Err(e) => tracing::warn!("Builder failed on building '{}': {}", building.name, e),
            }
        }

        for prop in &doc.props {
            let placement = place_prop(town, origin, prop);
            if self.is_forbidden(placement.position) {
                tracing::warn!("Skipping prop '{}' at forbidden {}", prop.kind, placement.position);
                summary.skipped += 1;
                continue;
            }
            match self.builder.place_prop(&placement) {
                Ok(()) => summary.props += 1,
                Err(e) => tracing::warn!("Builder failed on prop '{}': {}", prop.kind, e),
            }
        }

        for npc in &doc.npcs {
            let placement = place_npc(town, origin, npc);
            if self.is_forbidden(placement.position) {
                tracing::warn!("Skipping NPC '{}' at forbidden {}", npc.name, placement.position);
                summary.skipped += 1;
                continue;
            }
            match self.builder.place_npc(&placement) {
                Ok(()) => summary.npcs += 1,
                Err(e) => tracing::warn!("Builder failed on NPC '{}': {}", npc.name, e),
            }
        }
    }
}
