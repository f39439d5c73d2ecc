use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use lead_core::appointment::AppointmentEngine;
use lead_core::pipeline::PipelineEngine;
use lead_persistence::pg::{PgAppointmentStore, PgBoardCatalog, PgLeadRegistry, PgPositionStore,
                           PoolProvider};

fn usage() {
    eprintln!("uso:");
    eprintln!("  leadflow move --lead <UUID> --from <UUID> --to <UUID> [--by <UUID>]");
    eprintln!("  leadflow schedule --lead <UUID> --date <RFC3339> [--notes <TXT>] [--by <UUID>]");
    eprintln!("  leadflow count --board <UUID>");
}

fn main() {
    // Cargar .env si existe para obtener DATABASE_URL
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(2);
    }

    let mut lead: Option<Uuid> = None;
    let mut from: Option<Uuid> = None;
    let mut to: Option<Uuid> = None;
    let mut board: Option<Uuid> = None;
    let mut date: Option<DateTime<Utc>> = None;
    let mut notes: Option<String> = None;
    let mut by: Option<Uuid> = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--lead" => {
                i += 1;
                if i < args.len() { lead = Uuid::parse_str(&args[i]).ok(); }
            }
            "--from" => {
                i += 1;
                if i < args.len() { from = Uuid::parse_str(&args[i]).ok(); }
            }
            "--to" => {
                i += 1;
                if i < args.len() { to = Uuid::parse_str(&args[i]).ok(); }
            }
            "--board" => {
                i += 1;
                if i < args.len() { board = Uuid::parse_str(&args[i]).ok(); }
            }
            "--date" => {
                i += 1;
                if i < args.len() {
                    date = DateTime::parse_from_rfc3339(&args[i]).ok().map(|d| d.with_timezone(&Utc));
                }
            }
            "--notes" => {
                i += 1;
                if i < args.len() { notes = Some(args[i].clone()); }
            }
            "--by" => {
                i += 1;
                if i < args.len() { by = Uuid::parse_str(&args[i]).ok(); }
            }
            _ => {}
        }
        i += 1;
    }
    let actor = by.unwrap_or_else(Uuid::nil);

    let pool = match lead_persistence::build_dev_pool_from_env() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("no se pudo conectar a la base: {e}");
            std::process::exit(1);
        }
    };
    let boards = Arc::new(PgBoardCatalog::new(PoolProvider { pool: pool.clone() }));
    let leads = Arc::new(PgLeadRegistry::new(PoolProvider { pool: pool.clone() }));

    match args[1].as_str() {
        "move" => {
            let (Some(lead_id), Some(from_id), Some(to_id)) = (lead, from, to) else {
                usage();
                std::process::exit(2);
            };
            let store = PgPositionStore::new(PoolProvider { pool: pool.clone() });
            let engine = PipelineEngine::new(store, boards, leads);
            match engine.move_lead(lead_id, from_id, to_id, actor) {
                Ok(pos) => println!("{}", serde_json::to_string_pretty(&pos).unwrap()),
                Err(e) => {
                    eprintln!("move rechazado: {e}");
                    std::process::exit(1);
                }
            }
        }
        "schedule" => {
            let (Some(lead_id), Some(when)) = (lead, date) else {
                usage();
                std::process::exit(2);
            };
            let store = PgAppointmentStore::new(PoolProvider { pool: pool.clone() });
            let engine = AppointmentEngine::new(store, leads);
            match engine.schedule(lead_id, when, notes, actor) {
                Ok(appt) => println!("{}", serde_json::to_string_pretty(&appt).unwrap()),
                Err(e) => {
                    eprintln!("schedule rechazado: {e}");
                    std::process::exit(1);
                }
            }
        }
        "count" => {
            let Some(board_id) = board else {
                usage();
                std::process::exit(2);
            };
            let store = PgPositionStore::new(PoolProvider { pool: pool.clone() });
            let engine = PipelineEngine::new(store, boards, leads);
            println!("{}", engine.count_by_board(board_id));
        }
        other => {
            eprintln!("comando desconocido: {other}");
            usage();
            std::process::exit(2);
        }
    }
}
