use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ámbito de propiedad de boards y leads: global/admin, un agente
/// concreto o un colaborador concreto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Scope {
    Global,
    Agent(Uuid),
    Collaborator(Uuid),
}

impl Scope {
    /// Id del propietario, si el ámbito no es global.
    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            Scope::Global => None,
            Scope::Agent(id) | Scope::Collaborator(id) => Some(*id),
        }
    }
}
