//! In-memory adapter for AgentRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entities::{AgentId, AgentStatus, DeliveryAgent, NewDeliveryAgent};
use crate::domain::ports::AgentRepository;
use crate::error::DomainError;

/// In-memory implementation of AgentRepository
#[derive(Default)]
pub struct MemoryAgentRepository {
    agents: RwLock<HashMap<AgentId, DeliveryAgent>>,
}

impl MemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for MemoryAgentRepository {
    async fn find_by_id(&self, id: &AgentId) -> Result<Option<DeliveryAgent>, DomainError> {
        let agents = self.agents.read().await;
        Ok(agents.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<DeliveryAgent>, DomainError> {
        let agents = self.agents.read().await;
        let mut all: Vec<_> = agents.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn create(&self, new_agent: &NewDeliveryAgent) -> Result<DeliveryAgent, DomainError> {
        let agent = DeliveryAgent {
            id: AgentId::new(),
            name: new_agent.name.clone(),
            phone: new_agent.phone.clone(),
            territory: new_agent.territory.clone(),
            status: AgentStatus::Active,
            joined_at: Utc::now(),
        };

        let mut agents = self.agents.write().await;
        agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn set_status(&self, id: &AgentId, status: AgentStatus) -> Result<(), DomainError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("delivery agent {}", id)))?;
        agent.status = status;
        Ok(())
    }
}
