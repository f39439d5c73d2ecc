use serde::{Deserialize, Serialize};
use std::fmt;

/// Flujo de venta en el que participa un lead.
///
/// Un lead puede estar en ambos flujos a la vez; cada flujo mantiene su
/// posición de pipeline de forma independiente. Los nombres serializados
/// (`COMPRADOR` / `VENDEDOR`) son los del sistema original y se usan tal
/// cual en la capa de almacenamiento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowType {
    #[serde(rename = "COMPRADOR")]
    Buyer,
    #[serde(rename = "VENDEDOR")]
    Seller,
}

impl FlowType {
    /// Nombre estable para almacenamiento y wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Buyer => "COMPRADOR",
            FlowType::Seller => "VENDEDOR",
        }
    }

    pub fn parse(s: &str) -> Option<FlowType> {
        match s {
            "COMPRADOR" => Some(FlowType::Buyer),
            "VENDEDOR" => Some(FlowType::Seller),
            _ => None,
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
