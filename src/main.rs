//! Demo end-to-end con backends en memoria: coloca un lead en el flujo
//! COMPRADOR, lo mueve de board, agenda y completa una cita, e imprime
//! el historial de auditoría resultante.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use lead_core::appointment::{AppointmentEngine, InMemoryAppointmentStore};
use lead_core::audit::{AuditLog, InMemoryAuditLog};
use lead_core::pipeline::{InMemoryPositionStore, PipelineEngine};
use lead_core::registry::{InMemoryBoardCatalog, InMemoryLeadRegistry};
use lead_domain::{Board, FlowType, Lead, PipelineStatus, Scope};

fn board_for(flow_type: FlowType, status: &PipelineStatus) -> Board {
    Board { id: Uuid::new_v4(),
            flow_type,
            status_id: status.id,
            position: status.position,
            color: status.color.clone(),
            scope: Scope::Global }
}

fn main() {
    // Plantilla mínima de dos statuses y sus boards COMPRADOR
    let statuses = vec![PipelineStatus { id: Uuid::new_v4(),
                                         name: "Novo".to_string(),
                                         color: "#2f80ed".to_string(),
                                         position: 0 },
                        PipelineStatus { id: Uuid::new_v4(),
                                         name: "Em negociação".to_string(),
                                         color: "#f2994a".to_string(),
                                         position: 1 },];
    let boards = Arc::new(InMemoryBoardCatalog::new());
    let model_id = Uuid::new_v4();
    boards.insert_template(model_id, statuses.clone());
    let novo = board_for(FlowType::Buyer, &statuses[0]);
    let negociacao = board_for(FlowType::Buyer, &statuses[1]);
    boards.insert_board(novo.clone());
    boards.insert_board(negociacao.clone());

    let agent = Uuid::new_v4();
    let leads = Arc::new(InMemoryLeadRegistry::new());
    let lead = Lead { id: Uuid::new_v4(),
                      name: "Lead demo".to_string(),
                      owner: Scope::Agent(agent),
                      flows: vec![FlowType::Buyer] };
    let lead_id = lead.id;
    leads.insert(lead);

    // Un solo log de auditoría compartido por ambos motores
    let audit = Arc::new(InMemoryAuditLog::new());
    let pipeline = PipelineEngine::new(InMemoryPositionStore::new(audit.clone()),
                                       boards.clone(),
                                       leads.clone());
    let appointments = AppointmentEngine::new(InMemoryAppointmentStore::new(audit.clone()),
                                              leads.clone());

    let placed = pipeline.place_initial(lead_id, FlowType::Buyer, novo.id, agent)
                         .expect("colocación inicial");
    println!("posición inicial:\n{}",
             serde_json::to_string_pretty(&placed).expect("json"));

    let moved = pipeline.move_lead(lead_id, novo.id, negociacao.id, agent)
                        .expect("move");
    println!("tras el move:\n{}", serde_json::to_string_pretty(&moved).expect("json"));
    println!("conteos: Novo={} | Em negociação={}",
             pipeline.count_by_board(novo.id),
             pipeline.count_by_board(negociacao.id));

    let appt = appointments.schedule(lead_id,
                                     Utc::now() + Duration::days(2),
                                     Some("primeira visita".to_string()),
                                     agent)
                           .expect("schedule");
    println!("cita agendada:\n{}", serde_json::to_string_pretty(&appt).expect("json"));

    // Una segunda cita activa para el mismo lead debe rechazarse
    let dup = appointments.schedule(lead_id, Utc::now() + Duration::days(5), None, agent);
    println!("segunda cita rechazada: {:?}", dup.err());

    let done = appointments.complete(appt.id, Some("visita realizada".to_string()), agent)
                           .expect("complete");
    println!("cita completada:\n{}", serde_json::to_string_pretty(&done).expect("json"));

    println!("--- auditoría del lead ---");
    for ev in audit.list_for_lead(lead_id) {
        println!("#{} {} {}",
                 ev.seq,
                 ev.ts.to_rfc3339(),
                 serde_json::to_string(&ev.kind).expect("json"));
    }
}
