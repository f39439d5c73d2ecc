//! Implementaciones Postgres (Diesel) de los contratos de `lead-core`.
//!
//! Objetivo general del módulo:
//! - Paridad 1:1 con el backend en memoria: mismas precondiciones,
//!   re-validadas dentro de la transacción, con lock de fila.
//! - El evento de auditoría se inserta en la MISMA transacción que el
//!   cambio de estado: o se comitea todo o nada.
//! - Los invariantes de unicidad quedan además garantizados por el
//!   esquema (PK compuesta, índice único parcial); una violación de
//!   unicidad se traduce al conflicto de dominio correspondiente.
//! - Errores transitorios (deadlock, pool, conexión) se reintentan con
//!   backoff acotado; el agotamiento surfacea como `Backend`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::result::Error as DieselError;
use log::{debug, error, warn};
use serde_json::Value;
use uuid::Uuid;

use lead_core::appointment::{AppointmentChange, AppointmentConflict, AppointmentStore};
use lead_core::audit::{AuditEvent, AuditEventKind, AuditLog};
use lead_core::pipeline::{PositionConflict, PositionStore};
use lead_core::registry::{BoardCatalog, LeadRegistry};
use lead_domain::{Appointment, AppointmentStatus, Board, FlowType, Lead, PipelinePosition,
                  PipelineStatus, Scope};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{appointments, audit_log, boards, leads, pipeline_positions, pipeline_statuses};

/// Alias del pool r2d2 de conexiones Postgres. Al construirlo se corre
/// el set de migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones: permite inyectar un pool real o
/// factorear en tests sin acoplar a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(Queryable, Debug)]
struct PositionRow {
    lead_id: Uuid,
    flow_type: String,
    current_board_id: Uuid,
    current_status_id: Uuid,
    entered_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = pipeline_positions)]
struct NewPositionRow<'a> {
    lead_id: &'a Uuid,
    flow_type: &'a str,
    current_board_id: &'a Uuid,
    current_status_id: &'a Uuid,
    entered_at: DateTime<Utc>,
}

#[derive(Queryable, Debug)]
struct AppointmentRow {
    id: Uuid,
    lead_id: Uuid,
    scheduled_for: DateTime<Utc>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    created_by: Uuid,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = appointments)]
struct NewAppointmentRow<'a> {
    id: &'a Uuid,
    lead_id: &'a Uuid,
    scheduled_for: DateTime<Utc>,
    status: &'a str,
    notes: Option<&'a str>,
    created_at: DateTime<Utc>,
    created_by: &'a Uuid,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = audit_log)]
struct NewAuditRow<'a> {
    event_type: &'a str,
    payload: &'a Value,
}

#[derive(Queryable, Debug)]
struct AuditRow {
    seq: i64,
    ts: DateTime<Utc>,
    #[allow(dead_code)]
    event_type: String,
    payload: Value,
}

#[derive(Queryable, Debug)]
struct BoardRow {
    id: Uuid,
    flow_type: String,
    status_id: Uuid,
    position: i32,
    color: String,
    scope_type: String,
    scope_id: Option<Uuid>,
}

#[derive(Queryable, Debug)]
struct LeadRow {
    id: Uuid,
    name: String,
    owner_type: String,
    owner_id: Option<Uuid>,
    is_buyer: bool,
    is_seller: bool,
}

/// Determina si un error es transitorio (recomendado reintentar).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry con backoff lineal pequeño (hasta 3 intentos). No altera la
/// semántica de negocio; sólo repite la unidad de trabajo de `f`.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Nombre estable (minúsculas) de la variante, para el constraint de
/// `audit_log.event_type` y consultas simples.
fn event_type_for(kind: &AuditEventKind) -> &'static str {
    match kind {
        AuditEventKind::PositionPlaced { .. } => "positionplaced",
        AuditEventKind::PositionMoved { .. } => "positionmoved",
        AuditEventKind::AppointmentTransition { .. } => "appointmenttransition",
    }
}

/// Inserta el evento de auditoría dentro de la transacción en curso.
fn insert_audit(tx: &mut PgConnection, kind: &AuditEventKind) -> Result<(), DieselError> {
    let payload = serde_json::to_value(kind).map_err(|e| DieselError::SerializationError(Box::new(e)))?;
    diesel::insert_into(audit_log::table).values(NewAuditRow { event_type: event_type_for(kind),
                                                               payload: &payload })
                                         .execute(tx)?;
    Ok(())
}

fn position_from_row(row: PositionRow) -> Result<PipelinePosition, PersistenceError> {
    let flow_type = FlowType::parse(&row.flow_type)
        .ok_or_else(|| PersistenceError::Unknown(format!("invalid flow_type: {}", row.flow_type)))?;
    Ok(PipelinePosition { lead_id: row.lead_id,
                          flow_type,
                          current_board_id: row.current_board_id,
                          current_status_id: row.current_status_id,
                          entered_at: row.entered_at })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, PersistenceError> {
    let status = AppointmentStatus::parse(&row.status)
        .ok_or_else(|| PersistenceError::Unknown(format!("invalid status: {}", row.status)))?;
    Ok(Appointment { id: row.id,
                     lead_id: row.lead_id,
                     scheduled_for: row.scheduled_for,
                     status,
                     notes: row.notes,
                     created_at: row.created_at,
                     created_by: row.created_by })
}

fn scope_from_parts(scope_type: &str, scope_id: Option<Uuid>) -> Option<Scope> {
    match (scope_type, scope_id) {
        ("GLOBAL", _) => Some(Scope::Global),
        ("AGENT", Some(id)) => Some(Scope::Agent(id)),
        ("COLLABORATOR", Some(id)) => Some(Scope::Collaborator(id)),
        _ => None,
    }
}

/// Implementación Postgres de `PositionStore`.
///
/// `move_checked` toma el lock exclusivo de la fila `(lead_id,
/// flow_type)` con `SELECT ... FOR UPDATE`, re-valida el board de origen
/// y escribe la posición nueva más el evento en un solo commit.
pub struct PgPositionStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgPositionStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

enum MoveOutcome {
    Moved(PositionRow),
    NotFound,
    Mismatch(Uuid),
}

impl<P: ConnectionProvider> PositionStore for PgPositionStore<P> {
    fn insert_new(&self,
                  position: PipelinePosition,
                  audit: AuditEventKind)
                  -> Result<PipelinePosition, PositionConflict> {
        debug!("insert_new:start lead={} flow={}", position.lead_id, position.flow_type);
        let res: Result<(), PersistenceError> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    diesel::insert_into(pipeline_positions::table)
                        .values(NewPositionRow { lead_id: &position.lead_id,
                                                 flow_type: position.flow_type.as_str(),
                                                 current_board_id: &position.current_board_id,
                                                 current_status_id: &position.current_status_id,
                                                 entered_at: position.entered_at })
                        .execute(tx)?;
                    insert_audit(tx, &audit)?;
                    Ok::<(), DieselError>(())
                })
                .map_err(PersistenceError::from)
        });
        match res {
            Ok(()) => Ok(position),
            Err(PersistenceError::UniqueViolation(_)) => Err(PositionConflict::AlreadyExists),
            Err(e) => Err(PositionConflict::Backend(e.to_string())),
        }
    }

    fn move_checked(&self,
                    lead_id: Uuid,
                    flow_type: FlowType,
                    expected_from: Uuid,
                    to_board: &Board,
                    now: DateTime<Utc>,
                    audit: AuditEventKind)
                    -> Result<PipelinePosition, PositionConflict> {
        debug!("move_checked:start lead={lead_id} flow={flow_type} from={expected_from} to={}",
               to_board.id);
        let res: Result<MoveOutcome, PersistenceError> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    let row: Option<PositionRow> =
                        pipeline_positions::table.filter(pipeline_positions::lead_id.eq(lead_id))
                                                 .filter(pipeline_positions::flow_type.eq(flow_type.as_str()))
                                                 .for_update()
                                                 .first(tx)
                                                 .optional()?;
                    let row = match row {
                        Some(r) => r,
                        None => return Ok(MoveOutcome::NotFound),
                    };
                    if row.current_board_id != expected_from {
                        return Ok(MoveOutcome::Mismatch(row.current_board_id));
                    }
                    let updated: PositionRow =
                        diesel::update(pipeline_positions::table
                                           .filter(pipeline_positions::lead_id.eq(lead_id))
                                           .filter(pipeline_positions::flow_type.eq(flow_type.as_str())))
                            .set((pipeline_positions::current_board_id.eq(to_board.id),
                                  pipeline_positions::current_status_id.eq(to_board.status_id),
                                  pipeline_positions::entered_at.eq(now)))
                            .get_result(tx)?;
                    insert_audit(tx, &audit)?;
                    Ok::<MoveOutcome, DieselError>(MoveOutcome::Moved(updated))
                })
                .map_err(PersistenceError::from)
        });
        match res {
            Ok(MoveOutcome::Moved(row)) => {
                position_from_row(row).map_err(|e| PositionConflict::Backend(e.to_string()))
            }
            Ok(MoveOutcome::NotFound) => Err(PositionConflict::NotFound),
            Ok(MoveOutcome::Mismatch(actual)) => {
                Err(PositionConflict::CurrentMismatch { actual_board_id: actual })
            }
            Err(e) => Err(PositionConflict::Backend(e.to_string())),
        }
    }

    fn get(&self, lead_id: Uuid, flow_type: FlowType) -> Option<PipelinePosition> {
        let row: Option<PositionRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            pipeline_positions::table.filter(pipeline_positions::lead_id.eq(lead_id))
                                     .filter(pipeline_positions::flow_type.eq(flow_type.as_str()))
                                     .first(&mut conn)
                                     .optional()
                                     .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("get:load error lead={lead_id} err={e:?}");
            panic!("diesel load error: {e}");
        });
        row.and_then(|r| position_from_row(r).ok())
    }

    fn count_by_board(&self, board_id: Uuid) -> usize {
        let count: i64 = with_retry(|| {
            let mut conn = self.provider.connection()?;
            pipeline_positions::table.filter(pipeline_positions::current_board_id.eq(board_id))
                                     .count()
                                     .get_result(&mut conn)
                                     .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("count_by_board:load error board={board_id} err={e:?}");
            panic!("diesel load error: {e}");
        });
        count as usize
    }
}

/// Implementación Postgres de `AppointmentStore`.
///
/// El índice único parcial `(lead_id) WHERE status = 'SCHEDULED'` es la
/// última línea de defensa del invariante de cita única; la transacción
/// con `FOR UPDATE` evita llegar siquiera a violarlo en las
/// transiciones.
pub struct PgAppointmentStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgAppointmentStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

enum TransitionOutcome {
    Applied(AppointmentRow),
    NotFound,
    NotScheduled,
}

impl<P: ConnectionProvider> AppointmentStore for PgAppointmentStore<P> {
    fn insert_scheduled(&self,
                        appointment: Appointment,
                        audit: AuditEventKind)
                        -> Result<Appointment, AppointmentConflict> {
        debug!("insert_scheduled:start lead={} appt={}", appointment.lead_id, appointment.id);
        let res: Result<(), PersistenceError> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    diesel::insert_into(appointments::table)
                        .values(NewAppointmentRow { id: &appointment.id,
                                                    lead_id: &appointment.lead_id,
                                                    scheduled_for: appointment.scheduled_for,
                                                    status: appointment.status.as_str(),
                                                    notes: appointment.notes.as_deref(),
                                                    created_at: appointment.created_at,
                                                    created_by: &appointment.created_by })
                        .execute(tx)?;
                    insert_audit(tx, &audit)?;
                    Ok::<(), DieselError>(())
                })
                .map_err(PersistenceError::from)
        });
        match res {
            Ok(()) => Ok(appointment),
            Err(PersistenceError::UniqueViolation(_)) => Err(AppointmentConflict::DuplicateScheduled),
            Err(e) => Err(AppointmentConflict::Backend(e.to_string())),
        }
    }

    fn transition(&self,
                  appointment_id: Uuid,
                  change: AppointmentChange,
                  audit: AuditEventKind)
                  -> Result<Appointment, AppointmentConflict> {
        debug!("transition:start appt={appointment_id} change={change:?}");
        let res: Result<TransitionOutcome, PersistenceError> = with_retry(|| {
            let change = change.clone();
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    let row: Option<AppointmentRow> =
                        appointments::table.filter(appointments::id.eq(appointment_id))
                                           .for_update()
                                           .first(tx)
                                           .optional()?;
                    let row = match row {
                        Some(r) => r,
                        None => return Ok(TransitionOutcome::NotFound),
                    };
                    if row.status != AppointmentStatus::Scheduled.as_str() {
                        return Ok(TransitionOutcome::NotScheduled);
                    }
                    let target = appointments::table.filter(appointments::id.eq(appointment_id));
                    let updated: AppointmentRow = match change {
                        AppointmentChange::Reschedule(ts) => {
                            diesel::update(target).set(appointments::scheduled_for.eq(ts))
                                                  .get_result(tx)?
                        }
                        AppointmentChange::Complete(Some(n)) => {
                            diesel::update(target).set((appointments::status
                                                            .eq(AppointmentStatus::Completed.as_str()),
                                                        appointments::notes.eq(n)))
                                                  .get_result(tx)?
                        }
                        AppointmentChange::Complete(None) => {
                            diesel::update(target).set(appointments::status
                                                           .eq(AppointmentStatus::Completed.as_str()))
                                                  .get_result(tx)?
                        }
                        AppointmentChange::Cancel => {
                            diesel::update(target).set(appointments::status
                                                           .eq(AppointmentStatus::Cancelled.as_str()))
                                                  .get_result(tx)?
                        }
                        AppointmentChange::NoShow => {
                            diesel::update(target).set(appointments::status
                                                           .eq(AppointmentStatus::NoShow.as_str()))
                                                  .get_result(tx)?
                        }
                    };
                    insert_audit(tx, &audit)?;
                    Ok::<TransitionOutcome, DieselError>(TransitionOutcome::Applied(updated))
                })
                .map_err(PersistenceError::from)
        });
        match res {
            Ok(TransitionOutcome::Applied(row)) => {
                appointment_from_row(row).map_err(|e| AppointmentConflict::Backend(e.to_string()))
            }
            Ok(TransitionOutcome::NotFound) => Err(AppointmentConflict::NotFound),
            Ok(TransitionOutcome::NotScheduled) => Err(AppointmentConflict::NotScheduled),
            Err(e) => Err(AppointmentConflict::Backend(e.to_string())),
        }
    }

    fn get(&self, appointment_id: Uuid) -> Option<Appointment> {
        let row: Option<AppointmentRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            appointments::table.filter(appointments::id.eq(appointment_id))
                               .first(&mut conn)
                               .optional()
                               .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("get:load error appt={appointment_id} err={e:?}");
            panic!("diesel load error: {e}");
        });
        row.and_then(|r| appointment_from_row(r).ok())
    }

    fn current_scheduled(&self, lead_id: Uuid) -> Option<Appointment> {
        let row: Option<AppointmentRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            appointments::table.filter(appointments::lead_id.eq(lead_id))
                               .filter(appointments::status.eq(AppointmentStatus::Scheduled.as_str()))
                               .first(&mut conn)
                               .optional()
                               .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("current_scheduled:load error lead={lead_id} err={e:?}");
            panic!("diesel load error: {e}");
        });
        row.and_then(|r| appointment_from_row(r).ok())
    }

    fn list_in_range(&self,
                     start: DateTime<Utc>,
                     end: DateTime<Utc>,
                     status: Option<AppointmentStatus>)
                     -> Vec<Appointment> {
        let rows: Vec<AppointmentRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let mut query = appointments::table.filter(appointments::scheduled_for.ge(start))
                                               .filter(appointments::scheduled_for.le(end))
                                               .order(appointments::scheduled_for.asc())
                                               .into_boxed();
            if let Some(s) = status {
                query = query.filter(appointments::status.eq(s.as_str()));
            }
            query.load(&mut conn).map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("list_in_range:load error err={e:?}");
            panic!("diesel load error: {e}");
        });
        rows.into_iter().filter_map(|r| appointment_from_row(r).ok()).collect()
    }
}

/// Lectura del log de auditoría (y append directo para usos fuera de
/// los stores, que ya escriben su evento en la misma transacción).
pub struct PgAuditLog<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgAuditLog<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> AuditLog for PgAuditLog<P> {
    fn append_kind(&self, kind: AuditEventKind) -> AuditEvent {
        let payload = serde_json::to_value(&kind).expect("serialize AuditEventKind");
        let inserted: (i64, DateTime<Utc>) = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(audit_log::table)
                .values(NewAuditRow { event_type: event_type_for(&kind), payload: &payload })
                .returning((audit_log::seq, audit_log::ts))
                .get_result(&mut conn)
                .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("append_kind:insert error err={e:?}");
            panic!("diesel insert error: {e}");
        });
        AuditEvent { seq: inserted.0 as u64, kind, ts: inserted.1 }
    }

    fn list(&self) -> Vec<AuditEvent> {
        let rows: Vec<AuditRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            audit_log::table.order(audit_log::seq.asc())
                            .load(&mut conn)
                            .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("audit list:load error err={e:?}");
            panic!("diesel load error: {e}");
        });
        rows.into_iter()
            .filter_map(|row| {
                let kind: AuditEventKind = serde_json::from_value(row.payload).ok()?;
                Some(AuditEvent { seq: row.seq as u64, kind, ts: row.ts })
            })
            .collect()
    }
}

/// Vista Postgres del catálogo de boards (colaborador de solo lectura).
pub struct PgBoardCatalog<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgBoardCatalog<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

fn board_from_row(row: BoardRow) -> Option<Board> {
    let flow_type = FlowType::parse(&row.flow_type)?;
    let scope = scope_from_parts(&row.scope_type, row.scope_id)?;
    Some(Board { id: row.id,
                 flow_type,
                 status_id: row.status_id,
                 position: row.position,
                 color: row.color,
                 scope })
}

impl<P: ConnectionProvider> BoardCatalog for PgBoardCatalog<P> {
    fn board(&self, id: Uuid) -> Option<Board> {
        let row: Option<BoardRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            boards::table.filter(boards::id.eq(id))
                         .first(&mut conn)
                         .optional()
                         .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("board:load error id={id} err={e:?}");
            panic!("diesel load error: {e}");
        });
        row.and_then(|r| {
            board_from_row(r).or_else(|| {
                warn!("board {id} has invalid flow_type/scope, ignoring");
                None
            })
        })
    }

    fn boards_of(&self, flow_type: FlowType) -> Vec<Board> {
        let rows: Vec<BoardRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            boards::table.filter(boards::flow_type.eq(flow_type.as_str()))
                         .order(boards::position.asc())
                         .load(&mut conn)
                         .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("boards_of:load error err={e:?}");
            panic!("diesel load error: {e}");
        });
        rows.into_iter().filter_map(board_from_row).collect()
    }

    fn statuses_of(&self, model_id: Uuid) -> Vec<PipelineStatus> {
        let rows: Vec<(Uuid, Uuid, String, String, i32)> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            pipeline_statuses::table.filter(pipeline_statuses::model_id.eq(model_id))
                                    .order(pipeline_statuses::position.asc())
                                    .load(&mut conn)
                                    .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("statuses_of:load error err={e:?}");
            panic!("diesel load error: {e}");
        });
        rows.into_iter()
            .map(|(id, _model, name, color, position)| PipelineStatus { id, name, color, position })
            .collect()
    }
}

/// Vista Postgres del registro de leads (colaborador de solo lectura).
pub struct PgLeadRegistry<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgLeadRegistry<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> LeadRegistry for PgLeadRegistry<P> {
    fn get_lead(&self, id: Uuid) -> Option<Lead> {
        let row: Option<LeadRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            leads::table.filter(leads::id.eq(id))
                        .first(&mut conn)
                        .optional()
                        .map_err(PersistenceError::from)
        }).unwrap_or_else(|e| {
            error!("get_lead:load error id={id} err={e:?}");
            panic!("diesel load error: {e}");
        });
        let row = row?;
        let owner = scope_from_parts(&row.owner_type, row.owner_id)?;
        let mut flows = Vec::new();
        if row.is_buyer {
            flows.push(FlowType::Buyer);
        }
        if row.is_seller {
            flows.push(FlowType::Seller);
        }
        Some(Lead { id: row.id, name: row.name, owner, flows })
    }
}

/// Construye un pool Postgres r2d2 y corre las migraciones pendientes.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = if min_size == 0 { 1 } else { min_size };
    let validated_max = if max_size == 0 { 1 } else { max_size };
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee configuración y construye un
/// pool ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env();
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
