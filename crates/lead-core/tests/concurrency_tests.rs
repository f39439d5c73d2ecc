//! Carreras de mutaciones concurrentes: exactamente un ganador por
//! lead (movimientos y agendado de citas) y consistencia de los
//! conteos derivados.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use uuid::Uuid;

use lead_core::appointment::{AppointmentEngine, InMemoryAppointmentStore};
use lead_core::audit::InMemoryAuditLog;
use lead_core::pipeline::{InMemoryPositionStore, PipelineEngine};
use lead_core::registry::{InMemoryBoardCatalog, InMemoryLeadRegistry, LeadRegistry};
use lead_core::{AppointmentError, PipelineError};
use lead_domain::{Board, FlowType, Lead, Scope};

fn board(flow_type: FlowType, position: i32) -> Board {
    Board { id: Uuid::new_v4(),
            flow_type,
            status_id: Uuid::new_v4(),
            position,
            color: "#27ae60".to_string(),
            scope: Scope::Global }
}

fn engine_with_boards(boards_list: &[Board],
                      leads_list: &[Lead])
                      -> Arc<PipelineEngine<InMemoryPositionStore>> {
    let audit = Arc::new(InMemoryAuditLog::new());
    let boards = Arc::new(InMemoryBoardCatalog::new());
    let leads = Arc::new(InMemoryLeadRegistry::new());
    for b in boards_list {
        boards.insert_board(b.clone());
    }
    for l in leads_list {
        leads.insert(l.clone());
    }
    let store = InMemoryPositionStore::new(audit);
    Arc::new(PipelineEngine::new(store, boards, leads))
}

fn lead(flows: Vec<FlowType>) -> Lead {
    Lead { id: Uuid::new_v4(),
           name: "lead".to_string(),
           owner: Scope::Agent(Uuid::new_v4()),
           flows }
}

#[test]
fn concurrent_moves_exactly_one_wins() {
    let new_board = board(FlowType::Buyer, 0);
    let board_a = board(FlowType::Buyer, 1);
    let board_b = board(FlowType::Buyer, 2);
    let l = lead(vec![FlowType::Buyer]);
    let lead_id = l.id;
    let actor = Uuid::new_v4();
    let engine = engine_with_boards(&[new_board.clone(), board_a.clone(), board_b.clone()], &[l]);
    engine.place_initial(lead_id, FlowType::Buyer, new_board.id, actor)
          .unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let from = new_board.id;
    let (to_a, to_b) = (board_a.id, board_b.id);
    let t1 = thread::spawn(move || e1.move_lead(lead_id, from, to_a, actor));
    let t2 = thread::spawn(move || e2.move_lead(lead_id, from, to_b, actor));
    let r1 = t1.join().unwrap();
    let r2 = t2.join().unwrap();

    let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent move must win");
    let loser = if r1.is_err() { r1.clone() } else { r2.clone() };
    assert_eq!(loser, Err(PipelineError::StaleMove));

    let winner_board = if r1.is_ok() { to_a } else { to_b };
    let pos = engine.position_of(lead_id, FlowType::Buyer).unwrap();
    assert_eq!(pos.current_board_id, winner_board);
}

#[test]
fn concurrent_schedules_exactly_one_wins() {
    let audit = Arc::new(InMemoryAuditLog::new());
    let leads = Arc::new(InMemoryLeadRegistry::new());
    let l = lead(vec![FlowType::Buyer]);
    let lead_id = l.id;
    leads.insert(l);
    let leads_dyn: Arc<dyn LeadRegistry> = leads;
    let engine = Arc::new(AppointmentEngine::new(InMemoryAppointmentStore::new(audit), leads_dyn));
    let actor = Uuid::new_v4();

    // Ocho agendados en carrera sobre el mismo lead, todos con fecha
    // válida distinta.
    let mut handles = Vec::new();
    for i in 0..8_i64 {
        let e = engine.clone();
        handles.push(thread::spawn(move || {
            e.schedule(lead_id, Utc::now() + Duration::days(1 + i), None, actor)
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent schedule must win");
    for r in results.iter().filter(|r| r.is_err()) {
        assert_eq!(*r, Err(AppointmentError::DuplicateScheduled));
    }

    // En cualquier punto de observación hay una sola cita activa, y es
    // la del ganador.
    let active = engine.current_scheduled(lead_id).expect("one active appointment");
    let winner = results.into_iter().find_map(|r| r.ok()).unwrap();
    assert_eq!(active, winner);
}

#[test]
fn counts_stay_consistent_under_concurrent_moves() {
    let new_board = board(FlowType::Buyer, 0);
    let board_a = board(FlowType::Buyer, 1);
    let board_b = board(FlowType::Buyer, 2);
    let actor = Uuid::new_v4();

    let leads: Vec<Lead> = (0..32).map(|_| lead(vec![FlowType::Buyer])).collect();
    let engine = engine_with_boards(&[new_board.clone(), board_a.clone(), board_b.clone()], &leads);
    for l in &leads {
        engine.place_initial(l.id, FlowType::Buyer, new_board.id, actor).unwrap();
    }

    // Cada lead recibe dos movimientos en carrera hacia destinos
    // distintos; gane quien gane, el lead termina en exactamente uno.
    let mut handles = Vec::new();
    for l in &leads {
        for to in [board_a.id, board_b.id] {
            let e = engine.clone();
            let lead_id = l.id;
            let from = new_board.id;
            handles.push(thread::spawn(move || {
                let _ = e.move_lead(lead_id, from, to, actor);
            }));
        }
    }
    for h in handles {
        h.join().unwrap();
    }

    let total = engine.count_by_board(new_board.id)
                + engine.count_by_board(board_a.id)
                + engine.count_by_board(board_b.id);
    assert_eq!(total, leads.len());
    assert_eq!(engine.count_by_board(new_board.id), 0);

    // El conteo derivado coincide con las posiciones observadas.
    let mut by_position_a = 0;
    let mut by_position_b = 0;
    for l in &leads {
        let pos = engine.position_of(l.id, FlowType::Buyer).unwrap();
        if pos.current_board_id == board_a.id {
            by_position_a += 1;
        } else if pos.current_board_id == board_b.id {
            by_position_b += 1;
        }
    }
    assert_eq!(by_position_a, engine.count_by_board(board_a.id));
    assert_eq!(by_position_b, engine.count_by_board(board_b.id));
}
