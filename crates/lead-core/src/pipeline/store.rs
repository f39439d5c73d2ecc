//! Contrato de almacenamiento de posiciones.
//!
//! El store es quien materializa la semántica transaccional del §modelo
//! de concurrencia: cada mutación re-valida su precondición dentro de la
//! sección crítica de la fila `(lead_id, flow_type)` (entry lock en
//! memoria, `SELECT ... FOR UPDATE` en Postgres) y persiste el evento de
//! auditoría junto con el nuevo estado. El motor traduce los conflictos
//! a la taxonomía pública.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use lead_domain::{Board, FlowType, PipelinePosition};

use crate::audit::{AuditEventKind, AuditLog};

/// Conflictos a nivel de fila. No es la taxonomía pública: el motor
/// decide cómo surfacearlos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionConflict {
    /// Ya existe una fila para `(lead_id, flow_type)`.
    AlreadyExists,
    /// No existe fila para `(lead_id, flow_type)`.
    NotFound,
    /// El board actual de la fila no coincide con el esperado por el
    /// caller (movimiento concurrente ya reubicó al lead).
    CurrentMismatch { actual_board_id: Uuid },
    /// Fallo de backend agotados los reintentos.
    Backend(String),
}

pub trait PositionStore: Send + Sync {
    /// Inserta la primera posición de `(lead_id, flow_type)` y el evento
    /// de auditoría en una sola unidad atómica.
    fn insert_new(&self,
                  position: PipelinePosition,
                  audit: AuditEventKind)
                  -> Result<PipelinePosition, PositionConflict>;

    /// Compare-and-move: si la fila existe y su board actual es
    /// `expected_from`, actualiza board/status/entered_at y persiste el
    /// evento de auditoría, todo bajo el lock exclusivo de la fila.
    ///
    /// Precondición del caller: `expected_from != to_board.id`. El
    /// no-op idempotente se resuelve en el motor antes de llegar acá;
    /// una llamada al store siempre escribe y emite auditoría.
    fn move_checked(&self,
                    lead_id: Uuid,
                    flow_type: FlowType,
                    expected_from: Uuid,
                    to_board: &Board,
                    now: DateTime<Utc>,
                    audit: AuditEventKind)
                    -> Result<PipelinePosition, PositionConflict>;

    /// Lectura sin locks; puede observar estado inmediatamente superado.
    fn get(&self, lead_id: Uuid, flow_type: FlowType) -> Option<PipelinePosition>;

    /// Agregación en tiempo de lectura sobre las posiciones actuales.
    /// Nunca un contador almacenado que pueda desincronizarse.
    fn count_by_board(&self, board_id: Uuid) -> usize;
}

/// Backend en memoria. Los entry locks de `DashMap` hacen de lock de
/// fila: dos `move_checked` concurrentes sobre el mismo lead se
/// serializan y exactamente uno observa la precondición violada.
pub struct InMemoryPositionStore {
    rows: DashMap<(Uuid, FlowType), PipelinePosition>,
    audit: Arc<dyn AuditLog>,
}

impl InMemoryPositionStore {
    pub fn new(audit: Arc<dyn AuditLog>) -> Self {
        Self { rows: DashMap::new(), audit }
    }
}

impl PositionStore for InMemoryPositionStore {
    fn insert_new(&self,
                  position: PipelinePosition,
                  audit: AuditEventKind)
                  -> Result<PipelinePosition, PositionConflict> {
        match self.rows.entry((position.lead_id, position.flow_type)) {
            Entry::Occupied(_) => Err(PositionConflict::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(position.clone());
                self.audit.append_kind(audit);
                Ok(position)
            }
        }
    }

    fn move_checked(&self,
                    lead_id: Uuid,
                    flow_type: FlowType,
                    expected_from: Uuid,
                    to_board: &Board,
                    now: DateTime<Utc>,
                    audit: AuditEventKind)
                    -> Result<PipelinePosition, PositionConflict> {
        match self.rows.entry((lead_id, flow_type)) {
            Entry::Vacant(_) => Err(PositionConflict::NotFound),
            Entry::Occupied(mut slot) => {
                let row = slot.get_mut();
                if row.current_board_id != expected_from {
                    return Err(PositionConflict::CurrentMismatch { actual_board_id: row.current_board_id });
                }
                row.current_board_id = to_board.id;
                row.current_status_id = to_board.status_id;
                row.entered_at = now;
                let updated = row.clone();
                self.audit.append_kind(audit);
                Ok(updated)
            }
        }
    }

    fn get(&self, lead_id: Uuid, flow_type: FlowType) -> Option<PipelinePosition> {
        self.rows.get(&(lead_id, flow_type)).map(|r| r.clone())
    }

    fn count_by_board(&self, board_id: Uuid) -> usize {
        self.rows.iter().filter(|r| r.current_board_id == board_id).count()
    }
}
