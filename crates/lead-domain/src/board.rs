use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow_type::FlowType;
use crate::scope::Scope;

/// Status nombrado de una plantilla de pipeline (el "slot" que un board
/// referencia). La plantilla pertenece a un colaborador externo; aquí
/// solo se modela la forma que los motores necesitan leer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub position: i32,
}

/// Columna de un pipeline. Pertenece a exactamente un `FlowType` y
/// referencia un status de plantilla; los motores solo dependen de
/// `flow_type` y `status_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub flow_type: FlowType,
    pub status_id: Uuid,
    pub position: i32,
    pub color: String,
    pub scope: Scope,
}
