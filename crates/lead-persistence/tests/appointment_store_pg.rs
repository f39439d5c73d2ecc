//! Invariante de cita única y transiciones del `PgAppointmentStore`
//! (requiere DATABASE_URL). El índice único parcial debe rechazar la
//! segunda cita SCHEDULED sin crear fila.


use chrono::{Duration, Utc};
use uuid::Uuid;

use lead_core::appointment::{AppointmentChange, AppointmentConflict, AppointmentStore};
use lead_core::audit::AuditEventKind;
use lead_domain::{Appointment, AppointmentStatus};
use lead_persistence::pg::{PgAppointmentStore, PoolProvider};

use test_support::{seed_lead, with_pool};

fn scheduled_for(lead_id: Uuid, days: i64, actor: Uuid) -> Appointment {
    Appointment::new_scheduled(lead_id, Utc::now() + Duration::days(days), None, actor)
        .expect("valid appointment")
}

fn transition_audit(appt: &Appointment, to: AppointmentStatus, actor: Uuid) -> AuditEventKind {
    AuditEventKind::AppointmentTransition { appointment_id: appt.id,
                                            lead_id: appt.lead_id,
                                            from_status: Some(AppointmentStatus::Scheduled),
                                            to_status: to,
                                            actor }
}

fn schedule_audit(appt: &Appointment, actor: Uuid) -> AuditEventKind {
    AuditEventKind::AppointmentTransition { appointment_id: appt.id,
                                            lead_id: appt.lead_id,
                                            from_status: None,
                                            to_status: AppointmentStatus::Scheduled,
                                            actor }
}

#[test]
fn partial_unique_index_enforces_single_scheduled() {
    let ran = with_pool(|pool| {
        let mut conn = pool.get().expect("conn");
        let lead_id = Uuid::new_v4();
        seed_lead(&mut conn, lead_id, "pg appt lead");
        drop(conn);

        let store = PgAppointmentStore::new(PoolProvider { pool: pool.clone() });
        let actor = Uuid::new_v4();

        let first = scheduled_for(lead_id, 1, actor);
        store.insert_scheduled(first.clone(), schedule_audit(&first, actor))
             .expect("first schedule");

        let second = scheduled_for(lead_id, 2, actor);
        let dup = store.insert_scheduled(second.clone(), schedule_audit(&second, actor));
        assert_eq!(dup, Err(AppointmentConflict::DuplicateScheduled));
        // La fila rechazada no debe existir.
        assert!(store.get(second.id).is_none());

        assert_eq!(store.current_scheduled(lead_id).map(|a| a.id), Some(first.id));
    });
    if ran.is_none() {
        eprintln!("DATABASE_URL no definido: omitiendo test");
    }
}

#[test]
fn transitions_respect_the_state_machine() {
    let ran = with_pool(|pool| {
        let mut conn = pool.get().expect("conn");
        let lead_id = Uuid::new_v4();
        seed_lead(&mut conn, lead_id, "pg transition lead");
        drop(conn);

        let store = PgAppointmentStore::new(PoolProvider { pool: pool.clone() });
        let actor = Uuid::new_v4();

        let appt = scheduled_for(lead_id, 1, actor);
        store.insert_scheduled(appt.clone(), schedule_audit(&appt, actor))
             .expect("schedule");

        let new_date = Utc::now() + Duration::days(4);
        let rescheduled = store.transition(appt.id,
                                           AppointmentChange::Reschedule(new_date),
                                           transition_audit(&appt, AppointmentStatus::Scheduled, actor))
                               .expect("reschedule");
        assert_eq!(rescheduled.status, AppointmentStatus::Scheduled);
        assert_eq!(rescheduled.scheduled_for.timestamp(), new_date.timestamp());

        let done = store.transition(appt.id,
                                    AppointmentChange::Complete(Some("hecho".to_string())),
                                    transition_audit(&appt, AppointmentStatus::Completed, actor))
                        .expect("complete");
        assert_eq!(done.status, AppointmentStatus::Completed);
        assert_eq!(done.notes.as_deref(), Some("hecho"));

        // Terminal: cualquier transición posterior es NotScheduled.
        let again = store.transition(appt.id,
                                     AppointmentChange::Cancel,
                                     transition_audit(&appt, AppointmentStatus::Cancelled, actor));
        assert_eq!(again, Err(AppointmentConflict::NotScheduled));

        // El slot quedó libre: una nueva cita SCHEDULED es válida.
        let next = scheduled_for(lead_id, 7, actor);
        store.insert_scheduled(next.clone(), schedule_audit(&next, actor))
             .expect("new schedule after terminal");

        let missing = store.transition(Uuid::new_v4(),
                                       AppointmentChange::Cancel,
                                       transition_audit(&next, AppointmentStatus::Cancelled, actor));
        assert_eq!(missing, Err(AppointmentConflict::NotFound));
    });
    if ran.is_none() {
        eprintln!("DATABASE_URL no definido: omitiendo test");
    }
}
