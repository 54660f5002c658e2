//! Turning town documents into world placements

pub mod builder;
pub mod orchestrator;
pub mod placement;
pub mod policy;
pub mod registry;
pub mod store;

pub use builder::{BuildError, JsonLinesBuilder, RecordingBuilder, WorldBuilder};
pub use orchestrator::{BatchEntry, BuildOutcome, BuildSummary, TownSpawner};
pub use placement::{
    BuildingPlacement, NpcPlacement, Placement, PropKind, PropPlacement, StreetPlacement,
};
pub use policy::{BlockedGround, FnPolicy, OpenWorld, PlacementPolicy};
pub use registry::{BuiltTown, TownRegistry};
pub use store::{FileStore, MemoryStore, SavedTown, TownStore};
