use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use super::{AuditEvent, AuditEventKind};

/// Log de auditoría append-only.
///
/// Los motores se invocan desde un servidor multi-hilo, por eso el
/// append toma `&self`; las implementaciones serializan internamente.
pub trait AuditLog: Send + Sync {
    /// Agrega un evento a partir de su kind y devuelve el evento
    /// completo (con seq y ts).
    fn append_kind(&self, kind: AuditEventKind) -> AuditEvent;
    /// Lista todos los eventos en orden ascendente por seq.
    fn list(&self) -> Vec<AuditEvent>;
    /// Lista los eventos de un lead en orden ascendente por seq.
    fn list_for_lead(&self, lead_id: Uuid) -> Vec<AuditEvent> {
        self.list().into_iter().filter(|e| e.kind.lead_id() == lead_id).collect()
    }
}

pub struct InMemoryAuditLog {
    inner: Mutex<Vec<AuditEvent>>,
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self { inner: Mutex::new(Vec::new()) }
    }
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append_kind(&self, kind: AuditEventKind) -> AuditEvent {
        let mut vec = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let ev = AuditEvent { seq: vec.len() as u64, kind, ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self) -> Vec<AuditEvent> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}
