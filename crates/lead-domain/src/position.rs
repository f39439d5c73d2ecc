use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow_type::FlowType;

/// Posición actual de un lead dentro de un flujo.
///
/// Clave lógica: `(lead_id, flow_type)`. Invariante: a lo sumo una fila
/// por clave; el almacenamiento la refuerza con clave primaria compuesta
/// y el backend en memoria con el mapa indexado por la misma tupla.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePosition {
    pub lead_id: Uuid,
    pub flow_type: FlowType,
    pub current_board_id: Uuid,
    pub current_status_id: Uuid,
    /// Timestamp del último movimiento (o de la colocación inicial).
    pub entered_at: DateTime<Utc>,
}
