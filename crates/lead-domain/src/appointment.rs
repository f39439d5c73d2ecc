use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// Largo máximo de las observaciones de una cita.
pub const MAX_NOTES_LEN: usize = 255;

/// Estado del ciclo de vida de una cita. `Scheduled` es el único estado
/// con transiciones salientes; los otros tres son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "SCHEDULED")]
    Scheduled,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "NO_SHOW")]
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn parse(s: &str) -> Option<AppointmentStatus> {
        match s {
            "SCHEDULED" => Some(AppointmentStatus::Scheduled),
            "COMPLETED" => Some(AppointmentStatus::Completed),
            "CANCELLED" => Some(AppointmentStatus::Cancelled),
            "NO_SHOW" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }
}

/// Contacto de seguimiento agendado con un lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

impl Appointment {
    /// Crea una cita nueva en estado `Scheduled`, validando las
    /// observaciones. La regla de fecha (no anterior al día actual) es
    /// del motor, no de la entidad.
    pub fn new_scheduled(lead_id: Uuid,
                         scheduled_for: DateTime<Utc>,
                         notes: Option<String>,
                         created_by: Uuid)
                         -> Result<Self, DomainError> {
        if let Some(n) = &notes {
            validate_notes(n)?;
        }
        Ok(Appointment { id: Uuid::new_v4(),
                         lead_id,
                         scheduled_for,
                         status: AppointmentStatus::Scheduled,
                         notes,
                         created_at: Utc::now(),
                         created_by })
    }
}

/// Valida el límite de largo de observaciones (255 caracteres).
pub fn validate_notes(notes: &str) -> Result<(), DomainError> {
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(DomainError::ValidationError(format!(
            "notes exceed {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(())
}
