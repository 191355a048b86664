//! Health aggregation: a cheap, dependency-free snapshot of what is
//! configured and whether the provider set can currently answer `tools/list`.

use serde::Serialize;
use std::sync::Arc;

use crate::config_doc::{AgentsConfig, ProvidersConfig};
use crate::mcp::router::McpRouter;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServicesHealth {
    pub agents: usize,
    pub providers: usize,
    pub mcp: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub services: ServicesHealth,
}

pub struct HealthService {
    agents: AgentsConfig,
    providers: ProvidersConfig,
    router: Arc<McpRouter>,
}

impl HealthService {
    pub fn new(agents: AgentsConfig, providers: ProvidersConfig, router: Arc<McpRouter>) -> Self {
        Self {
            agents,
            providers,
            router,
        }
    }

    pub async fn check(&self) -> HealthReport {
        let (status, tools_available) = match self.router.tools_list().await {
            Ok(tools) => (HealthStatus::Healthy, tools.len()),
            Err(e) => {
                tracing::warn!(error = %e, "health check: tool aggregation failed");
                (HealthStatus::Unhealthy, 0)
            }
        };
        HealthReport {
            status,
            timestamp: chrono::Utc::now(),
            services: ServicesHealth {
                agents: self.agents.agents.len(),
                providers: self.providers.mcp_servers.len() + self.providers.rest_servers.len(),
                mcp: tools_available,
            },
        }
    }
}
