use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow_type::FlowType;
use crate::scope::Scope;

/// Proyección mínima del lead que los motores necesitan del registro
/// externo: identidad, propietario y flujos en los que participa. El
/// resto de los datos de contacto vive en el colaborador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub owner: Scope,
    pub flows: Vec<FlowType>,
}

impl Lead {
    pub fn in_flow(&self, flow_type: FlowType) -> bool {
        self.flows.contains(&flow_type)
    }
}
