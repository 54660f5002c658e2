//! Townsmith - LLM town definitions to world placements
//!
//! Generator output flows through syntax repair (`llm`), schema
//! normalization, audit and layout (`town`), and finally placement,
//! construction and persistence (`spawn`).

pub mod core;
pub mod llm;
pub mod spawn;
pub mod town;
