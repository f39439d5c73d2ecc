// lead-domain library entry point
pub mod appointment;
pub mod board;
pub mod error;
pub mod flow_type;
pub mod lead;
pub mod position;
pub mod scope;

pub use appointment::{Appointment, AppointmentStatus, MAX_NOTES_LEN};
pub use board::{Board, PipelineStatus};
pub use error::DomainError;
pub use flow_type::FlowType;
pub use lead::Lead;
pub use position::PipelinePosition;
pub use scope::Scope;
