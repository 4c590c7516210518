//! Fraud service
//!
//! Flags raised by the system (OTP lockouts, duplicate references, stock
//! discrepancies) and by staff. An open flag holds every approval for the
//! DA until a supervisor clears or confirms it; confirming suspends the DA.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{
    AgentId, AgentStatus, DeliveryId, FlagId, FlagStatus, FlagSubject, FraudFlag, FraudReason,
    FraudSeverity, NewFraudFlag, User,
};
use crate::domain::ports::{AgentRepository, DeliveryRepository, FraudFlagRepository};
use crate::error::{AppError, DomainError};

/// Service for fraud flag review
pub struct FraudService<FR, AR, DR>
where
    FR: FraudFlagRepository,
    AR: AgentRepository,
    DR: DeliveryRepository,
{
    flags: Arc<FR>,
    agents: Arc<AR>,
    deliveries: Arc<DR>,
}

impl<FR, AR, DR> FraudService<FR, AR, DR>
where
    FR: FraudFlagRepository,
    AR: AgentRepository,
    DR: DeliveryRepository,
{
    pub fn new(flags: Arc<FR>, agents: Arc<AR>, deliveries: Arc<DR>) -> Self {
        Self {
            flags,
            agents,
            deliveries,
        }
    }

    /// Staff report something off about an order or a DA
    pub async fn raise_manual(
        &self,
        actor: &User,
        order_id: Option<DeliveryId>,
        da_id: Option<AgentId>,
        severity: Option<FraudSeverity>,
        detail: &str,
    ) -> Result<FraudFlag, AppError> {
        if detail.trim().is_empty() {
            return Err(AppError::BadRequest(
                "A report needs some detail".to_string(),
            ));
        }

        let (subject, da_id) = match order_id {
            Some(order_id) => {
                let order = self
                    .deliveries
                    .find_by_id(&order_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("delivery order {}", order_id)))?;
                if let Some(da_id) = da_id {
                    if da_id != order.da_id {
                        return Err(AppError::BadRequest(format!(
                            "order {} belongs to a different DA",
                            order.reference
                        )));
                    }
                }
                (FlagSubject::Order(order_id), order.da_id)
            }
            None => {
                let da_id = da_id.ok_or_else(|| {
                    AppError::BadRequest("Name an order or a DA to flag".to_string())
                })?;
                if self.agents.find_by_id(&da_id).await?.is_none() {
                    return Err(AppError::NotFound(format!("DA {}", da_id)));
                }
                (FlagSubject::Agent(da_id), da_id)
            }
        };

        let flag = self
            .flags
            .create(&NewFraudFlag {
                subject,
                da_id,
                reason: FraudReason::ManualReport,
                severity: severity
                    .unwrap_or_else(|| FraudSeverity::default_for(FraudReason::ManualReport)),
                detail: detail.to_string(),
                raised_by: Some(actor.id),
            })
            .await?;

        tracing::info!(flag_id = %flag.id, da_id = %flag.da_id, "Manual fraud flag raised");
        Ok(flag)
    }

    /// Close an open flag
    ///
    /// Clearing releases the DA's approvals; confirming suspends the DA.
    pub async fn review(
        &self,
        actor: &User,
        id: &FlagId,
        verdict: FlagStatus,
    ) -> Result<FraudFlag, AppError> {
        if verdict == FlagStatus::Open {
            return Err(AppError::BadRequest(
                "Verdict must be cleared or confirmed".to_string(),
            ));
        }

        let flag = self.fetch(id).await?;
        if flag.status != FlagStatus::Open {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "flag {} is already {}",
                flag.id, flag.status
            ))));
        }

        self.flags.review(id, verdict, &actor.id, Utc::now()).await?;

        if verdict == FlagStatus::Confirmed {
            self.agents
                .set_status(&flag.da_id, AgentStatus::Suspended)
                .await?;
            tracing::warn!(flag_id = %flag.id, da_id = %flag.da_id, "Fraud confirmed, DA suspended");
        } else {
            tracing::info!(flag_id = %flag.id, "Fraud flag cleared");
        }

        self.fetch(id).await
    }

    /// List flags. DAs only see their own.
    pub async fn list_flags(
        &self,
        actor: &User,
        status: Option<FlagStatus>,
    ) -> Result<Vec<FraudFlag>, AppError> {
        let scope = actor.da_scope();
        Ok(self.flags.list(status, scope.as_ref()).await?)
    }

    /// Find a flag. DAs only see their own.
    pub async fn get_flag(&self, actor: &User, id: &FlagId) -> Result<FraudFlag, AppError> {
        let flag = self.fetch(id).await?;
        if let Some(own) = actor.da_scope() {
            if flag.da_id != own {
                return Err(AppError::Forbidden);
            }
        }
        Ok(flag)
    }

    async fn fetch(&self, id: &FlagId) -> Result<FraudFlag, AppError> {
        self.flags
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("fraud flag {}", id)))
    }
}
