//! Motor de citas: garantiza un único "próximo contacto" en vuelo por
//! lead y lo conduce por la máquina de estados hasta un terminal.
//!
//! ```text
//! (ninguna) --schedule--> SCHEDULED
//! SCHEDULED --reschedule/move--> SCHEDULED
//! SCHEDULED --complete--> COMPLETED   (terminal)
//! SCHEDULED --cancel--> CANCELLED     (terminal)
//! SCHEDULED --mark_no_show--> NO_SHOW (terminal)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use lead_domain::appointment::validate_notes;
use lead_domain::{Appointment, AppointmentStatus, Scope};

use crate::audit::AuditEventKind;
use crate::errors::AppointmentError;
use crate::registry::LeadRegistry;

use super::store::{AppointmentChange, AppointmentConflict, AppointmentStore};

/// Filtros de la consulta de calendario. El owner se resuelve contra el
/// registro de leads (el store no conoce propietarios).
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub owner: Option<Scope>,
}

pub struct AppointmentEngine<S: AppointmentStore> {
    store: S,
    leads: Arc<dyn LeadRegistry>,
}

impl<S: AppointmentStore> AppointmentEngine<S> {
    pub fn new(store: S, leads: Arc<dyn LeadRegistry>) -> Self {
        Self { store, leads }
    }

    /// Crea una cita SCHEDULED para el lead. Falla con
    /// `DuplicateScheduled` si ya hay una activa y con `InvalidDate` si
    /// la fecha es anterior al inicio del día actual (hoy se permite).
    pub fn schedule(&self,
                    lead_id: Uuid,
                    scheduled_for: DateTime<Utc>,
                    notes: Option<String>,
                    created_by: Uuid)
                    -> Result<Appointment, AppointmentError> {
        if !self.leads.lead_exists(lead_id) {
            return Err(AppointmentError::UnknownLead);
        }
        validate_date(scheduled_for)?;
        let appointment = Appointment::new_scheduled(lead_id, scheduled_for, notes, created_by)
            .map_err(|e| AppointmentError::InvalidNotes(e.to_string()))?;
        let audit = AuditEventKind::AppointmentTransition { appointment_id: appointment.id,
                                                            lead_id,
                                                            from_status: None,
                                                            to_status: AppointmentStatus::Scheduled,
                                                            actor: created_by };
        self.store.insert_scheduled(appointment, audit).map_err(map_conflict)
    }

    /// Cambia la fecha de una cita SCHEDULED; el estado no cambia y la
    /// cita sigue contando como la activa del lead.
    pub fn reschedule(&self,
                      appointment_id: Uuid,
                      new_scheduled_for: DateTime<Utc>,
                      actor: Uuid)
                      -> Result<Appointment, AppointmentError> {
        validate_date(new_scheduled_for)?;
        self.apply(appointment_id, AppointmentChange::Reschedule(new_scheduled_for), actor)
    }

    /// Drag de calendario: misma semántica que `reschedule`.
    pub fn move_appointment(&self,
                            appointment_id: Uuid,
                            new_date: DateTime<Utc>,
                            actor: Uuid)
                            -> Result<Appointment, AppointmentError> {
        self.reschedule(appointment_id, new_date, actor)
    }

    /// Transición terminal a COMPLETED, opcionalmente con notas del
    /// resultado del contacto.
    pub fn complete(&self,
                    appointment_id: Uuid,
                    notes: Option<String>,
                    actor: Uuid)
                    -> Result<Appointment, AppointmentError> {
        if let Some(n) = &notes {
            validate_notes(n).map_err(|e| AppointmentError::InvalidNotes(e.to_string()))?;
        }
        self.apply(appointment_id, AppointmentChange::Complete(notes), actor)
    }

    /// Transición terminal a CANCELLED.
    pub fn cancel(&self, appointment_id: Uuid, actor: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentChange::Cancel, actor)
    }

    /// Transición terminal a NO_SHOW.
    pub fn mark_no_show(&self, appointment_id: Uuid, actor: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentChange::NoShow, actor)
    }

    /// La cita activa del lead, si existe. No es condición de error para
    /// el motor que no haya ninguna.
    pub fn current_scheduled(&self, lead_id: Uuid) -> Option<Appointment> {
        self.store.current_scheduled(lead_id)
    }

    /// Consulta de calendario: citas en `[start, end]` con filtros
    /// opcionales por estado y por propietario del lead.
    pub fn list_in_range(&self,
                         start: DateTime<Utc>,
                         end: DateTime<Utc>,
                         filter: &AppointmentFilter)
                         -> Vec<Appointment> {
        let mut out = self.store.list_in_range(start, end, filter.status);
        if let Some(owner) = &filter.owner {
            out.retain(|a| self.leads.owner_of(a.lead_id).as_ref() == Some(owner));
        }
        out
    }

    fn apply(&self,
             appointment_id: Uuid,
             change: AppointmentChange,
             actor: Uuid)
             -> Result<Appointment, AppointmentError> {
        let current = self.store.get(appointment_id).ok_or(AppointmentError::NotFound)?;
        let audit = AuditEventKind::AppointmentTransition { appointment_id,
                                                            lead_id: current.lead_id,
                                                            from_status: Some(AppointmentStatus::Scheduled),
                                                            to_status: change.target_status(),
                                                            actor };
        self.store.transition(appointment_id, change, audit).map_err(map_conflict)
    }
}

fn validate_date(scheduled_for: DateTime<Utc>) -> Result<(), AppointmentError> {
    if scheduled_for.date_naive() < Utc::now().date_naive() {
        return Err(AppointmentError::InvalidDate);
    }
    Ok(())
}

fn map_conflict(c: AppointmentConflict) -> AppointmentError {
    match c {
        AppointmentConflict::DuplicateScheduled => AppointmentError::DuplicateScheduled,
        AppointmentConflict::NotFound => AppointmentError::NotFound,
        AppointmentConflict::NotScheduled => AppointmentError::NotScheduled,
        AppointmentConflict::Backend(m) => AppointmentError::Storage(m),
    }
}
