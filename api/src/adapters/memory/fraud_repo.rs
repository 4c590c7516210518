//! In-memory adapter for FraudFlagRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::{AgentId, FlagId, FlagStatus, FraudFlag, NewFraudFlag, UserId};
use crate::domain::ports::FraudFlagRepository;
use crate::error::DomainError;

/// In-memory implementation of FraudFlagRepository
#[derive(Default)]
pub struct MemoryFraudFlagRepository {
    flags: RwLock<HashMap<FlagId, FraudFlag>>,
}

impl MemoryFraudFlagRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FraudFlagRepository for MemoryFraudFlagRepository {
    async fn create(&self, new_flag: &NewFraudFlag) -> Result<FraudFlag, DomainError> {
        let flag = FraudFlag {
            id: FlagId::new(),
            subject: new_flag.subject,
            da_id: new_flag.da_id,
            reason: new_flag.reason,
            severity: new_flag.severity,
            status: FlagStatus::Open,
            detail: new_flag.detail.clone(),
            raised_by: new_flag.raised_by,
            raised_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        };

        let mut flags = self.flags.write().await;
        flags.insert(flag.id, flag.clone());
        Ok(flag)
    }

    async fn find_by_id(&self, id: &FlagId) -> Result<Option<FraudFlag>, DomainError> {
        let flags = self.flags.read().await;
        Ok(flags.get(id).cloned())
    }

    async fn list(
        &self,
        status: Option<FlagStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<FraudFlag>, DomainError> {
        let flags = self.flags.read().await;
        let mut all: Vec<_> = flags
            .values()
            .filter(|f| status.map_or(true, |s| f.status == s))
            .filter(|f| da_id.map_or(true, |da| &f.da_id == da))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
        Ok(all)
    }

    async fn has_open_for_da(&self, da_id: &AgentId) -> Result<bool, DomainError> {
        let flags = self.flags.read().await;
        Ok(flags
            .values()
            .any(|f| &f.da_id == da_id && f.status == FlagStatus::Open))
    }

    async fn count_for_da_between(
        &self,
        da_id: &AgentId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let flags = self.flags.read().await;
        Ok(flags
            .values()
            .filter(|f| &f.da_id == da_id && f.raised_at >= from && f.raised_at < until)
            .count() as u64)
    }

    async fn review(
        &self,
        id: &FlagId,
        status: FlagStatus,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut flags = self.flags.write().await;
        let flag = flags
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("fraud flag {}", id)))?;
        flag.status = status;
        flag.reviewed_by = Some(*by);
        flag.reviewed_at = Some(at);
        Ok(())
    }
}
