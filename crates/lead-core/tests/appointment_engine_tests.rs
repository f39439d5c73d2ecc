//! Máquina de estados de citas: unicidad de la cita activa, regla de
//! fecha e inmutabilidad de los estados terminales.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use lead_core::appointment::{AppointmentEngine, AppointmentFilter, InMemoryAppointmentStore};
use lead_core::audit::InMemoryAuditLog;
use lead_core::registry::{InMemoryLeadRegistry, LeadRegistry};
use lead_core::AppointmentError;
use lead_domain::{AppointmentStatus, FlowType, Lead, Scope, MAX_NOTES_LEN};

struct Setup {
    engine: AppointmentEngine<InMemoryAppointmentStore>,
    lead_id: Uuid,
    other_lead_id: Uuid,
    agent: Uuid,
    other_agent: Uuid,
}

fn setup() -> Setup {
    let audit = Arc::new(InMemoryAuditLog::new());
    let leads = Arc::new(InMemoryLeadRegistry::new());
    let agent = Uuid::new_v4();
    let other_agent = Uuid::new_v4();
    let lead = Lead { id: Uuid::new_v4(),
                      name: "Lead 42".to_string(),
                      owner: Scope::Agent(agent),
                      flows: vec![FlowType::Buyer] };
    let other = Lead { id: Uuid::new_v4(),
                       name: "Lead 43".to_string(),
                       owner: Scope::Collaborator(other_agent),
                       flows: vec![FlowType::Seller] };
    let lead_id = lead.id;
    let other_lead_id = other.id;
    leads.insert(lead);
    leads.insert(other);

    let store = InMemoryAppointmentStore::new(audit);
    let leads_dyn: Arc<dyn LeadRegistry> = leads;
    let engine = AppointmentEngine::new(store, leads_dyn);
    Setup { engine, lead_id, other_lead_id, agent, other_agent }
}

#[test]
fn schedule_creates_scheduled_appointment() {
    let s = setup();
    let when = Utc::now() + Duration::days(3);
    let appt = s.engine
                .schedule(s.lead_id, when, Some("primer contacto".to_string()), s.agent)
                .expect("schedule");
    assert_eq!(appt.status, AppointmentStatus::Scheduled);
    assert_eq!(appt.lead_id, s.lead_id);
    assert_eq!(s.engine.current_scheduled(s.lead_id), Some(appt));
}

#[test]
fn second_schedule_for_same_lead_is_duplicate() {
    let s = setup();
    s.engine
     .schedule(s.lead_id, Utc::now() + Duration::days(1), None, s.agent)
     .unwrap();
    let r = s.engine.schedule(s.lead_id, Utc::now() + Duration::days(2), None, s.agent);
    assert_eq!(r, Err(AppointmentError::DuplicateScheduled));
}

#[test]
fn schedule_in_the_past_is_invalid_date() {
    let s = setup();
    let r = s.engine.schedule(s.lead_id, Utc::now() - Duration::days(2), None, s.agent);
    assert_eq!(r, Err(AppointmentError::InvalidDate));
}

#[test]
fn schedule_today_is_allowed() {
    let s = setup();
    let r = s.engine.schedule(s.lead_id, Utc::now(), None, s.agent);
    assert!(r.is_ok());
}

#[test]
fn schedule_for_unknown_lead_is_rejected() {
    let s = setup();
    let r = s.engine.schedule(Uuid::new_v4(), Utc::now() + Duration::days(1), None, s.agent);
    assert_eq!(r, Err(AppointmentError::UnknownLead));
}

#[test]
fn notes_over_limit_are_rejected_without_creating_state() {
    let s = setup();
    let long = "x".repeat(MAX_NOTES_LEN + 1);
    let r = s.engine.schedule(s.lead_id, Utc::now() + Duration::days(1), Some(long), s.agent);
    assert!(matches!(r, Err(AppointmentError::InvalidNotes(_))));
    assert_eq!(s.engine.current_scheduled(s.lead_id), None);
}

#[test]
fn reschedule_changes_only_the_date_and_keeps_the_guard() {
    let s = setup();
    let first = Utc::now() + Duration::days(1);
    let appt = s.engine.schedule(s.lead_id, first, None, s.agent).unwrap();

    let second = Utc::now() + Duration::days(5);
    let updated = s.engine.reschedule(appt.id, second, s.agent).expect("reschedule");
    assert_eq!(updated.status, AppointmentStatus::Scheduled);
    assert_eq!(updated.scheduled_for, second);
    assert_eq!(updated.notes, appt.notes);

    // La cita reagendada sigue contando como la activa del lead.
    let r = s.engine.schedule(s.lead_id, Utc::now() + Duration::days(2), None, s.agent);
    assert_eq!(r, Err(AppointmentError::DuplicateScheduled));
}

#[test]
fn move_appointment_behaves_like_reschedule() {
    let s = setup();
    let appt = s.engine
                .schedule(s.lead_id, Utc::now() + Duration::days(1), None, s.agent)
                .unwrap();
    let new_date = Utc::now() + Duration::days(4);
    let moved = s.engine.move_appointment(appt.id, new_date, s.agent).expect("calendar drag");
    assert_eq!(moved.scheduled_for, new_date);
    assert_eq!(moved.status, AppointmentStatus::Scheduled);
}

#[test]
fn reschedule_to_the_past_is_invalid_date() {
    let s = setup();
    let appt = s.engine
                .schedule(s.lead_id, Utc::now() + Duration::days(1), None, s.agent)
                .unwrap();
    let r = s.engine.reschedule(appt.id, Utc::now() - Duration::days(3), s.agent);
    assert_eq!(r, Err(AppointmentError::InvalidDate));
}

#[test]
fn complete_overwrites_notes_and_frees_the_slot() {
    let s = setup();
    let appt = s.engine
                .schedule(s.lead_id, Utc::now() + Duration::days(1), Some("agendada".to_string()), s.agent)
                .unwrap();
    let done = s.engine
                .complete(appt.id, Some("atendido, pide segunda visita".to_string()), s.agent)
                .expect("complete");
    assert_eq!(done.status, AppointmentStatus::Completed);
    assert_eq!(done.notes.as_deref(), Some("atendido, pide segunda visita"));

    // El lead vuelve a tener cero citas activas y puede agendar otra.
    assert_eq!(s.engine.current_scheduled(s.lead_id), None);
    assert!(s.engine.schedule(s.lead_id, Utc::now() + Duration::days(7), None, s.agent).is_ok());
}

#[test]
fn terminal_states_reject_every_further_transition() {
    let s = setup();
    let appt = s.engine
                .schedule(s.lead_id, Utc::now() + Duration::days(1), None, s.agent)
                .unwrap();
    s.engine.complete(appt.id, None, s.agent).unwrap();

    assert_eq!(s.engine.cancel(appt.id, s.agent), Err(AppointmentError::NotScheduled));
    assert_eq!(s.engine.mark_no_show(appt.id, s.agent), Err(AppointmentError::NotScheduled));
    assert_eq!(s.engine.complete(appt.id, None, s.agent), Err(AppointmentError::NotScheduled));
    assert_eq!(s.engine.reschedule(appt.id, Utc::now() + Duration::days(2), s.agent),
               Err(AppointmentError::NotScheduled));
}

#[test]
fn cancel_and_no_show_are_terminal() {
    let s = setup();
    let a = s.engine
             .schedule(s.lead_id, Utc::now() + Duration::days(1), None, s.agent)
             .unwrap();
    assert_eq!(s.engine.cancel(a.id, s.agent).unwrap().status, AppointmentStatus::Cancelled);

    let b = s.engine
             .schedule(s.lead_id, Utc::now() + Duration::days(2), None, s.agent)
             .unwrap();
    assert_eq!(s.engine.mark_no_show(b.id, s.agent).unwrap().status, AppointmentStatus::NoShow);
}

#[test]
fn transitions_on_unknown_id_are_not_found() {
    let s = setup();
    let missing = Uuid::new_v4();
    assert_eq!(s.engine.cancel(missing, s.agent), Err(AppointmentError::NotFound));
    assert_eq!(s.engine.reschedule(missing, Utc::now() + Duration::days(1), s.agent),
               Err(AppointmentError::NotFound));
}

#[test]
fn list_in_range_filters_by_window_status_and_owner() {
    let s = setup();
    let in_range = s.engine
                    .schedule(s.lead_id, Utc::now() + Duration::days(2), None, s.agent)
                    .unwrap();
    let other = s.engine
                 .schedule(s.other_lead_id, Utc::now() + Duration::days(3), None, s.agent)
                 .unwrap();
    // Fuera de la ventana consultada.
    let far = s.engine
               .schedule(s.lead_id, Utc::now() + Duration::days(30), None, s.agent);
    assert_eq!(far, Err(AppointmentError::DuplicateScheduled)); // sigue activa la del lead

    let start = Utc::now();
    let end = Utc::now() + Duration::days(7);

    let all = s.engine.list_in_range(start, end, &AppointmentFilter::default());
    assert_eq!(all.len(), 2);
    assert!(all[0].scheduled_for <= all[1].scheduled_for);

    let scheduled_only = s.engine.list_in_range(start, end, &AppointmentFilter {
        status: Some(AppointmentStatus::Scheduled),
        owner: None,
    });
    assert_eq!(scheduled_only.len(), 2);

    s.engine.cancel(other.id, s.agent).unwrap();
    let scheduled_after_cancel = s.engine.list_in_range(start, end, &AppointmentFilter {
        status: Some(AppointmentStatus::Scheduled),
        owner: None,
    });
    assert_eq!(scheduled_after_cancel, vec![s.engine.current_scheduled(s.lead_id).unwrap()]);

    // Filtro por propietario resuelto contra el registro de leads.
    let by_owner = s.engine.list_in_range(start, end, &AppointmentFilter {
        status: None,
        owner: Some(Scope::Collaborator(s.other_agent)),
    });
    assert_eq!(by_owner.len(), 1);
    assert_eq!(by_owner[0].id, other.id);
    let _ = in_range;
}
