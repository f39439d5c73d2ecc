//! Colaboradores de solo lectura: registro de leads y catálogo de
//! boards/plantillas. Los motores validan contra ellos pero nunca los
//! mutan (referencia por id, sin embedding).

use dashmap::DashMap;
use uuid::Uuid;

use lead_domain::{Board, FlowType, Lead, PipelineStatus, Scope};

/// Vista del registro de leads (colaborador externo).
pub trait LeadRegistry: Send + Sync {
    fn get_lead(&self, id: Uuid) -> Option<Lead>;

    fn lead_exists(&self, id: Uuid) -> bool {
        self.get_lead(id).is_some()
    }

    fn owner_of(&self, id: Uuid) -> Option<Scope> {
        self.get_lead(id).map(|l| l.owner)
    }
}

/// Vista del catálogo de boards y de la plantilla de statuses.
pub trait BoardCatalog: Send + Sync {
    fn board(&self, id: Uuid) -> Option<Board>;
    /// Boards de un flujo, ordenados por `position`.
    fn boards_of(&self, flow_type: FlowType) -> Vec<Board>;
    /// Statuses de una plantilla de kanban, ordenados por `position`.
    fn statuses_of(&self, model_id: Uuid) -> Vec<PipelineStatus>;
}

pub struct InMemoryLeadRegistry {
    leads: DashMap<Uuid, Lead>,
}

impl Default for InMemoryLeadRegistry {
    fn default() -> Self {
        Self { leads: DashMap::new() }
    }
}

impl InMemoryLeadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, lead: Lead) {
        self.leads.insert(lead.id, lead);
    }
}

impl LeadRegistry for InMemoryLeadRegistry {
    fn get_lead(&self, id: Uuid) -> Option<Lead> {
        self.leads.get(&id).map(|l| l.clone())
    }
}

pub struct InMemoryBoardCatalog {
    boards: DashMap<Uuid, Board>,
    templates: DashMap<Uuid, Vec<PipelineStatus>>,
}

impl Default for InMemoryBoardCatalog {
    fn default() -> Self {
        Self { boards: DashMap::new(), templates: DashMap::new() }
    }
}

impl InMemoryBoardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_board(&self, board: Board) {
        self.boards.insert(board.id, board);
    }

    pub fn insert_template(&self, model_id: Uuid, statuses: Vec<PipelineStatus>) {
        self.templates.insert(model_id, statuses);
    }
}

impl BoardCatalog for InMemoryBoardCatalog {
    fn board(&self, id: Uuid) -> Option<Board> {
        self.boards.get(&id).map(|b| b.clone())
    }

    fn boards_of(&self, flow_type: FlowType) -> Vec<Board> {
        let mut out: Vec<Board> = self.boards
                                      .iter()
                                      .filter(|b| b.flow_type == flow_type)
                                      .map(|b| b.clone())
                                      .collect();
        out.sort_by_key(|b| b.position);
        out
    }

    fn statuses_of(&self, model_id: Uuid) -> Vec<PipelineStatus> {
        let mut out = self.templates.get(&model_id).map(|s| s.clone()).unwrap_or_default();
        out.sort_by_key(|s| s.position);
        out
    }
}
