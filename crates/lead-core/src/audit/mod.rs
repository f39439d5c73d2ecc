//! Definiciones de eventos de auditoría y trait AuditLog.

mod store;
mod types;

pub use store::{AuditLog, InMemoryAuditLog};
pub use types::{AuditEvent, AuditEventKind};
