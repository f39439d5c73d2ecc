//! lead-core: motores de posición de pipeline y de ciclo de vida de citas.
pub mod appointment;
pub mod audit;
pub mod errors;
pub mod pipeline;
pub mod registry;

pub use appointment::{AppointmentEngine, AppointmentFilter, AppointmentStore, InMemoryAppointmentStore};
pub use audit::{AuditEvent, AuditEventKind, AuditLog, InMemoryAuditLog};
pub use errors::{AppointmentError, PipelineError};
pub use pipeline::{InMemoryPositionStore, PipelineEngine, PositionStore};
pub use registry::{BoardCatalog, InMemoryBoardCatalog, InMemoryLeadRegistry, LeadRegistry};
