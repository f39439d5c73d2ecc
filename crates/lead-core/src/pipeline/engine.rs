//! Motor de posiciones: registro autoritativo de en qué board está cada
//! lead dentro de cada flujo, con transiciones validadas y atómicas.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use lead_domain::{Board, FlowType, PipelinePosition};

use crate::audit::AuditEventKind;
use crate::errors::PipelineError;
use crate::registry::{BoardCatalog, LeadRegistry};

use super::store::{PositionConflict, PositionStore};

pub struct PipelineEngine<S: PositionStore> {
    store: S,
    boards: Arc<dyn BoardCatalog>,
    leads: Arc<dyn LeadRegistry>,
}

impl<S: PositionStore> PipelineEngine<S> {
    pub fn new(store: S, boards: Arc<dyn BoardCatalog>, leads: Arc<dyn LeadRegistry>) -> Self {
        Self { store, boards, leads }
    }

    /// Crea la primera posición de `(lead_id, flow_type)`. Falla con
    /// `AlreadyPositioned` si el par ya tiene posición y con
    /// `UnknownBoard` si el board no pertenece al flujo.
    pub fn place_initial(&self,
                         lead_id: Uuid,
                         flow_type: FlowType,
                         board_id: Uuid,
                         actor: Uuid)
                         -> Result<PipelinePosition, PipelineError> {
        if !self.leads.lead_exists(lead_id) {
            return Err(PipelineError::UnknownLead);
        }
        let board = self.board_in_flow(board_id, flow_type)?;
        let position = PipelinePosition { lead_id,
                                          flow_type,
                                          current_board_id: board.id,
                                          current_status_id: board.status_id,
                                          entered_at: Utc::now() };
        let audit = AuditEventKind::PositionPlaced { lead_id, flow_type, board_id: board.id, actor };
        self.store.insert_new(position, audit).map_err(|c| match c {
            PositionConflict::AlreadyExists => PipelineError::AlreadyPositioned,
            PositionConflict::Backend(m) => PipelineError::Storage(m),
            other => PipelineError::Storage(format!("unexpected conflict on insert: {other:?}")),
        })
    }

    /// Mueve un lead entre dos boards del mismo flujo, todo-o-nada.
    ///
    /// El flujo se resuelve desde el board destino; si origen y destino
    /// pertenecen a flujos distintos la operación falla con
    /// `FlowTypeMismatch` antes de tocar estado. `move(L, B, B)` es un
    /// no-op idempotente: no escribe ni emite auditoría.
    pub fn move_lead(&self,
                     lead_id: Uuid,
                     from_board_id: Uuid,
                     to_board_id: Uuid,
                     moved_by: Uuid)
                     -> Result<PipelinePosition, PipelineError> {
        let to_board = self.boards.board(to_board_id).ok_or(PipelineError::UnknownBoard)?;
        let from_board = self.boards.board(from_board_id).ok_or(PipelineError::UnknownBoard)?;
        if from_board.flow_type != to_board.flow_type {
            return Err(PipelineError::FlowTypeMismatch);
        }
        let flow_type = to_board.flow_type;

        if from_board_id == to_board_id {
            // No-op idempotente; aun así valida que la vista del caller
            // no esté desactualizada.
            let current = self.store
                              .get(lead_id, flow_type)
                              .ok_or(PipelineError::NoCurrentPosition)?;
            if current.current_board_id != from_board_id {
                return Err(PipelineError::StaleMove);
            }
            return Ok(current);
        }

        let audit = AuditEventKind::PositionMoved { lead_id,
                                                    flow_type,
                                                    from_board_id,
                                                    to_board_id,
                                                    moved_by };
        self.store
            .move_checked(lead_id, flow_type, from_board_id, &to_board, Utc::now(), audit)
            .map_err(|c| match c {
                PositionConflict::NotFound => PipelineError::NoCurrentPosition,
                PositionConflict::CurrentMismatch { .. } => PipelineError::StaleMove,
                PositionConflict::Backend(m) => PipelineError::Storage(m),
                PositionConflict::AlreadyExists => {
                    PipelineError::Storage("unexpected conflict on move".to_string())
                }
            })
    }

    /// Posición actual de un lead en un flujo, si existe.
    pub fn position_of(&self, lead_id: Uuid, flow_type: FlowType) -> Option<PipelinePosition> {
        self.store.get(lead_id, flow_type)
    }

    /// Cantidad de leads cuya posición actual apunta a `board_id`.
    pub fn count_by_board(&self, board_id: Uuid) -> usize {
        self.store.count_by_board(board_id)
    }

    fn board_in_flow(&self, board_id: Uuid, flow_type: FlowType) -> Result<Board, PipelineError> {
        let board = self.boards.board(board_id).ok_or(PipelineError::UnknownBoard)?;
        if board.flow_type != flow_type {
            return Err(PipelineError::UnknownBoard);
        }
        Ok(board)
    }
}
