//! Tipos de evento de auditoría.
//!
//! Rol en el sistema:
//! - Cada mutación exitosa de un motor emite exactamente un evento.
//! - El log es append-only; el historial que ve el usuario se renderiza
//!   a partir de estos eventos (colaborador externo).
//! - Los motores lo tratan como fire-and-forget: un evento nunca cambia
//!   el resultado de la operación que lo produjo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lead_domain::{AppointmentStatus, FlowType};

/// Tipos de eventos emitidos por los dos motores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditEventKind {
    /// Primera colocación de un lead en un board de un flujo.
    PositionPlaced {
        lead_id: Uuid,
        flow_type: FlowType,
        board_id: Uuid,
        actor: Uuid,
    },
    /// Movimiento entre boards del mismo flujo. El no-op (origen ==
    /// destino) no emite evento.
    PositionMoved {
        lead_id: Uuid,
        flow_type: FlowType,
        from_board_id: Uuid,
        to_board_id: Uuid,
        moved_by: Uuid,
    },
    /// Transición del ciclo de vida de una cita. `from_status = None`
    /// en la creación; el reagendado emite SCHEDULED -> SCHEDULED.
    AppointmentTransition {
        appointment_id: Uuid,
        lead_id: Uuid,
        from_status: Option<AppointmentStatus>,
        to_status: AppointmentStatus,
        actor: Uuid,
    },
}

impl AuditEventKind {
    /// Lead al que se refiere el evento.
    pub fn lead_id(&self) -> Uuid {
        match self {
            AuditEventKind::PositionPlaced { lead_id, .. }
            | AuditEventKind::PositionMoved { lead_id, .. }
            | AuditEventKind::AppointmentTransition { lead_id, .. } => *lead_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub seq: u64, // asignado por el AuditLog (orden de append)
    pub kind: AuditEventKind,
    pub ts: DateTime<Utc>,
}
