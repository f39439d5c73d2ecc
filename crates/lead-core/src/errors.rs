//! Taxonomía de errores de los motores. Todas son condiciones esperadas
//! y recuperables por el caller (4xx-equivalentes); nunca se tragan ni
//! se loguean-y-continúan. `Storage` es la única variante de
//! infraestructura (fallo transitorio agotados los reintentos).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum PipelineError {
    #[error("lead does not exist")] UnknownLead,
    #[error("board does not exist for this flow type")] UnknownBoard,
    #[error("origin and destination boards belong to different flow types")] FlowTypeMismatch,
    #[error("lead has no position in this flow type")] NoCurrentPosition,
    #[error("lead was already moved by a concurrent request")] StaleMove,
    #[error("lead is already positioned in this flow type")] AlreadyPositioned,
    #[error("storage failure: {0}")] Storage(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum AppointmentError {
    #[error("lead does not exist")] UnknownLead,
    #[error("lead already has a scheduled appointment")] DuplicateScheduled,
    #[error("scheduled date is before the start of the current day")] InvalidDate,
    #[error("appointment does not exist")] NotFound,
    #[error("appointment is not in SCHEDULED state")] NotScheduled,
    #[error("invalid notes: {0}")] InvalidNotes(String),
    #[error("storage failure: {0}")] Storage(String),
}
