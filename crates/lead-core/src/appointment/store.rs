//! Contrato de almacenamiento de citas.
//!
//! La unicidad "a lo sumo una cita SCHEDULED por lead" se refuerza en el
//! store, dentro de la sección crítica de la fila de cita activa del
//! lead (entry lock del índice en memoria, índice único parcial en
//! Postgres). Orden de locks fijo: primero el índice por lead, después
//! la fila de la cita.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use lead_domain::{Appointment, AppointmentStatus};

use crate::audit::{AuditEventKind, AuditLog};

/// Mutación aplicable a una cita en estado `Scheduled`.
#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentChange {
    /// Actualiza solo `scheduled_for`; el estado queda `Scheduled`.
    Reschedule(DateTime<Utc>),
    /// Transición terminal; opcionalmente sobreescribe las notas con el
    /// resultado del contacto.
    Complete(Option<String>),
    Cancel,
    NoShow,
}

impl AppointmentChange {
    pub fn target_status(&self) -> AppointmentStatus {
        match self {
            AppointmentChange::Reschedule(_) => AppointmentStatus::Scheduled,
            AppointmentChange::Complete(_) => AppointmentStatus::Completed,
            AppointmentChange::Cancel => AppointmentStatus::Cancelled,
            AppointmentChange::NoShow => AppointmentStatus::NoShow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentConflict {
    /// El lead ya tiene una cita SCHEDULED.
    DuplicateScheduled,
    NotFound,
    /// La cita existe pero no está en estado SCHEDULED.
    NotScheduled,
    Backend(String),
}

pub trait AppointmentStore: Send + Sync {
    /// Inserta una cita nueva en estado SCHEDULED junto con su evento de
    /// auditoría. Falla con `DuplicateScheduled` sin crear fila si el
    /// lead ya tiene una cita activa.
    fn insert_scheduled(&self,
                        appointment: Appointment,
                        audit: AuditEventKind)
                        -> Result<Appointment, AppointmentConflict>;

    /// Aplica `change` si la cita existe y está SCHEDULED, re-validando
    /// dentro de la sección crítica, y persiste el evento de auditoría
    /// en la misma unidad atómica.
    fn transition(&self,
                  appointment_id: Uuid,
                  change: AppointmentChange,
                  audit: AuditEventKind)
                  -> Result<Appointment, AppointmentConflict>;

    fn get(&self, appointment_id: Uuid) -> Option<Appointment>;

    /// La única cita SCHEDULED del lead, si existe.
    fn current_scheduled(&self, lead_id: Uuid) -> Option<Appointment>;

    /// Citas con `scheduled_for` dentro de `[start, end]`, orden
    /// ascendente por fecha. Lectura sin locks.
    fn list_in_range(&self,
                     start: DateTime<Utc>,
                     end: DateTime<Utc>,
                     status: Option<AppointmentStatus>)
                     -> Vec<Appointment>;
}

/// Backend en memoria: filas por id más un índice lead -> cita SCHEDULED
/// cuyo entry lock hace de lock de "fila de cita activa".
pub struct InMemoryAppointmentStore {
    rows: DashMap<Uuid, Appointment>,
    scheduled_by_lead: DashMap<Uuid, Uuid>,
    audit: Arc<dyn AuditLog>,
}

impl InMemoryAppointmentStore {
    pub fn new(audit: Arc<dyn AuditLog>) -> Self {
        Self { rows: DashMap::new(), scheduled_by_lead: DashMap::new(), audit }
    }
}

impl AppointmentStore for InMemoryAppointmentStore {
    fn insert_scheduled(&self,
                        appointment: Appointment,
                        audit: AuditEventKind)
                        -> Result<Appointment, AppointmentConflict> {
        match self.scheduled_by_lead.entry(appointment.lead_id) {
            Entry::Occupied(_) => Err(AppointmentConflict::DuplicateScheduled),
            Entry::Vacant(slot) => {
                self.rows.insert(appointment.id, appointment.clone());
                slot.insert(appointment.id);
                self.audit.append_kind(audit);
                Ok(appointment)
            }
        }
    }

    fn transition(&self,
                  appointment_id: Uuid,
                  change: AppointmentChange,
                  audit: AuditEventKind)
                  -> Result<Appointment, AppointmentConflict> {
        // Lectura previa solo para resolver el lead; la validación real
        // ocurre bajo los locks.
        let lead_id = match self.rows.get(&appointment_id) {
            Some(a) => a.lead_id,
            None => return Err(AppointmentConflict::NotFound),
        };
        let index_entry = self.scheduled_by_lead.entry(lead_id);
        let mut row = match self.rows.get_mut(&appointment_id) {
            Some(r) => r,
            None => return Err(AppointmentConflict::NotFound),
        };
        if row.status != AppointmentStatus::Scheduled {
            return Err(AppointmentConflict::NotScheduled);
        }
        match change {
            AppointmentChange::Reschedule(ts) => row.scheduled_for = ts,
            AppointmentChange::Complete(notes) => {
                row.status = AppointmentStatus::Completed;
                if let Some(n) = notes {
                    row.notes = Some(n);
                }
            }
            AppointmentChange::Cancel => row.status = AppointmentStatus::Cancelled,
            AppointmentChange::NoShow => row.status = AppointmentStatus::NoShow,
        }
        let updated = row.clone();
        drop(row);
        if updated.status.is_terminal() {
            // Libera el slot de cita activa del lead.
            if let Entry::Occupied(slot) = index_entry {
                if *slot.get() == appointment_id {
                    slot.remove();
                }
            }
        } else {
            drop(index_entry);
        }
        self.audit.append_kind(audit);
        Ok(updated)
    }

    fn get(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.rows.get(&appointment_id).map(|a| a.clone())
    }

    fn current_scheduled(&self, lead_id: Uuid) -> Option<Appointment> {
        let id = *self.scheduled_by_lead.get(&lead_id)?;
        self.rows
            .get(&id)
            .map(|a| a.clone())
            .filter(|a| a.status == AppointmentStatus::Scheduled)
    }

    fn list_in_range(&self,
                     start: DateTime<Utc>,
                     end: DateTime<Utc>,
                     status: Option<AppointmentStatus>)
                     -> Vec<Appointment> {
        let mut out: Vec<Appointment> =
            self.rows
                .iter()
                .filter(|a| a.scheduled_for >= start && a.scheduled_for <= end)
                .filter(|a| status.map_or(true, |s| a.status == s))
                .map(|a| a.clone())
                .collect();
        out.sort_by_key(|a| a.scheduled_for);
        out
    }
}
