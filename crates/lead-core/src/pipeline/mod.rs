//! Motor de posiciones de pipeline (colocación inicial y movimientos
//! atómicos entre boards de un flujo).

mod engine;
mod store;

pub use engine::PipelineEngine;
pub use store::{InMemoryPositionStore, PositionConflict, PositionStore};
