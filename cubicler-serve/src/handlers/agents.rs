//! `GET /agents`: lists configured agents (identifier, name, description).

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AgentListEntry {
    pub identifier: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AgentListResponse {
    pub total: usize,
    pub agents: Vec<AgentListEntry>,
}

pub async fn list_agents(State(state): State<Arc<AppState>>) -> Json<AgentListResponse> {
    let mut agents: Vec<AgentListEntry> = state
        .agents
        .agents
        .values()
        .map(|cfg| AgentListEntry {
            identifier: cfg.identifier.clone(),
            name: cfg.name.clone(),
            description: cfg.description.clone(),
        })
        .collect();
    agents.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    Json(AgentListResponse {
        total: agents.len(),
        agents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn empty_config_lists_no_agents() {
        let state = test_state();
        let Json(resp) = list_agents(State(state)).await;
        assert_eq!(resp.total, 0);
        assert!(resp.agents.is_empty());
    }
}
