//! Motor de ciclo de vida de citas (un solo "próximo contacto" en vuelo
//! por lead, llevado a un desenlace terminal).

mod engine;
mod store;

pub use engine::{AppointmentEngine, AppointmentFilter};
pub use store::{AppointmentChange, AppointmentConflict, AppointmentStore, InMemoryAppointmentStore};
