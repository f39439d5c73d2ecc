//! lead-persistence
//!
//! Implementaciones Postgres (Diesel) de los contratos de
//! almacenamiento de `lead-core`. Cada mutación es una transacción
//! read-modify-write con lock de fila (`SELECT ... FOR UPDATE`) que
//! persiste el evento de auditoría en el mismo commit; los invariantes
//! de unicidad se refuerzan además a nivel de esquema (PK compuesta de
//! posiciones, índice único parcial de citas SCHEDULED).
//!
//! Módulos:
//! - `pg`: stores Postgres, pool r2d2 y vistas de solo lectura de los
//!   colaboradores (boards, leads).
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgAppointmentStore, PgAuditLog,
             PgBoardCatalog, PgLeadRegistry, PgPool, PgPositionStore, PoolProvider};
