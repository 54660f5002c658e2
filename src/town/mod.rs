//! Town documents: schema, classification, normalization, audit and layout

pub mod audit;
pub mod layout;
pub mod normalize;
pub mod schema;
pub mod zones;

pub use audit::{AuditReport, Auditor};
pub use layout::{auto_pack, PackReport};
pub use normalize::normalize;
pub use schema::{Building, Npc, ParsedDocument, Prop, Street, TownDocument, WanderingNpc};
pub use zones::{InteriorStyle, Side, ZoneCatalog, ZoneSpec};
