//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (in-memory for now).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{
    AgentId, AgentStatus, ConsignmentHolding, DeliveryAgent, DeliveryId, DeliveryOrder,
    DeliveryStatus, FlagId, FlagStatus, FraudFlag, NewDeliveryAgent, NewDeliveryOrder,
    NewFraudFlag, NewPayment, NewProductStock, NewStockReturn, NewUser, PaymentConfirmation,
    PaymentId, PaymentStatus, ProductStock, ReturnId, ReturnStatus, Sku, StockReturn, User,
    UserId,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by bearer token hash
    async fn find_by_token_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by name
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Update the last seen timestamp
    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError>;
}

/// Repository for DeliveryAgent entities
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Find a DA by ID
    async fn find_by_id(&self, id: &AgentId) -> Result<Option<DeliveryAgent>, DomainError>;

    /// List all DAs
    async fn list(&self) -> Result<Vec<DeliveryAgent>, DomainError>;

    /// Register a new DA
    async fn create(&self, agent: &NewDeliveryAgent) -> Result<DeliveryAgent, DomainError>;

    /// Change a DA's status (suspend / reinstate)
    async fn set_status(&self, id: &AgentId, status: AgentStatus) -> Result<(), DomainError>;
}

/// Repository for warehouse stock and per-DA consignment holdings
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Find a product by SKU
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<ProductStock>, DomainError>;

    /// List all products
    async fn list_products(&self) -> Result<Vec<ProductStock>, DomainError>;

    /// Register a product
    async fn create_product(&self, stock: &NewProductStock) -> Result<ProductStock, DomainError>;

    /// Quantity of a SKU a DA currently holds (0 when none)
    async fn holding_qty(&self, da_id: &AgentId, sku: &Sku) -> Result<i64, DomainError>;

    /// All holdings of one DA
    async fn holdings_by_da(&self, da_id: &AgentId)
        -> Result<Vec<ConsignmentHolding>, DomainError>;

    /// All DAs holding a SKU
    async fn holdings_by_sku(&self, sku: &Sku) -> Result<Vec<ConsignmentHolding>, DomainError>;

    /// Move stock warehouse -> DA. Fails with `Conflict` when the
    /// warehouse holds less than `qty`.
    async fn transfer_to_da(&self, da_id: &AgentId, sku: &Sku, qty: i64)
        -> Result<(), DomainError>;

    /// Credit the warehouse with `qty` units (accepted unsold returns)
    async fn restock_warehouse(&self, sku: &Sku, qty: i64) -> Result<(), DomainError>;

    /// Adjust a DA's holding by `delta`, saturating at zero. Returns the
    /// resulting quantity.
    async fn adjust_holding(
        &self,
        da_id: &AgentId,
        sku: &Sku,
        delta: i64,
    ) -> Result<i64, DomainError>;
}

/// Repository for DeliveryOrder entities
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Create an order; the repository assigns the `DO-n` reference
    async fn create(
        &self,
        order: &NewDeliveryOrder,
        amount_kobo: i64,
    ) -> Result<DeliveryOrder, DomainError>;

    /// Find an order by ID
    async fn find_by_id(&self, id: &DeliveryId) -> Result<Option<DeliveryOrder>, DomainError>;

    /// List orders, newest first, optionally filtered
    async fn list(
        &self,
        status: Option<DeliveryStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<DeliveryOrder>, DomainError>;

    /// Dispatched orders still on the SLA clock
    /// (`out_for_delivery` and `awaiting_approval`)
    async fn find_on_sla_clock(&self) -> Result<Vec<DeliveryOrder>, DomainError>;

    /// Mark dispatched: store the OTP hash and start the SLA clock
    async fn dispatch(
        &self,
        id: &DeliveryId,
        otp_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Record a failed OTP attempt; returns the new attempt count
    async fn record_failed_otp(&self, id: &DeliveryId) -> Result<u32, DomainError>;

    /// Lock the OTP after too many failures
    async fn lock_otp(&self, id: &DeliveryId) -> Result<(), DomainError>;

    /// Replace the OTP hash, clearing attempts and the lock
    async fn reset_otp(&self, id: &DeliveryId, otp_hash: &str) -> Result<(), DomainError>;

    /// OTP verified: set `delivered_at` and move to `awaiting_approval`
    async fn mark_delivered(&self, id: &DeliveryId, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Attach the proof-of-delivery photo reference
    async fn set_proof_photo(&self, id: &DeliveryId, photo_ref: &str) -> Result<(), DomainError>;

    /// Approve, freezing the bonus outcome
    async fn approve(
        &self,
        id: &DeliveryId,
        by: &UserId,
        at: DateTime<Utc>,
        bonus_eligible: bool,
    ) -> Result<(), DomainError>;

    /// Reject with a reason
    async fn reject(
        &self,
        id: &DeliveryId,
        by: &UserId,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), DomainError>;

    /// Mark a failed delivery attempt
    async fn fail(
        &self,
        id: &DeliveryId,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Cancel before dispatch
    async fn cancel(&self, id: &DeliveryId, at: DateTime<Utc>) -> Result<(), DomainError>;
}

/// Repository for PaymentConfirmation entities
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Record a payment
    async fn create(&self, payment: &NewPayment) -> Result<PaymentConfirmation, DomainError>;

    /// Record a payment already settled (prepaid orders)
    async fn create_confirmed(
        &self,
        payment: &NewPayment,
        at: DateTime<Utc>,
    ) -> Result<PaymentConfirmation, DomainError>;

    /// Find a payment by ID
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentConfirmation>, DomainError>;

    /// List payments, newest first, optionally filtered
    async fn list(
        &self,
        status: Option<PaymentStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<PaymentConfirmation>, DomainError>;

    /// All payments against one order
    async fn list_by_order(&self, order_id: &DeliveryId)
        -> Result<Vec<PaymentConfirmation>, DomainError>;

    /// Payments carrying a reference, for duplicate detection
    async fn find_by_reference(&self, reference: &str)
        -> Result<Vec<PaymentConfirmation>, DomainError>;

    /// Mark confirmed
    async fn confirm(
        &self,
        id: &PaymentId,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Mark flagged (duplicate reference etc.)
    async fn mark_flagged(&self, id: &PaymentId) -> Result<(), DomainError>;
}

/// Repository for FraudFlag entities
#[async_trait]
pub trait FraudFlagRepository: Send + Sync {
    /// Raise a flag
    async fn create(&self, flag: &NewFraudFlag) -> Result<FraudFlag, DomainError>;

    /// Find a flag by ID
    async fn find_by_id(&self, id: &FlagId) -> Result<Option<FraudFlag>, DomainError>;

    /// List flags, newest first, optionally filtered
    async fn list(
        &self,
        status: Option<FlagStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<FraudFlag>, DomainError>;

    /// Whether any open flag targets this DA or one of their orders
    async fn has_open_for_da(&self, da_id: &AgentId) -> Result<bool, DomainError>;

    /// Count flags raised against a DA inside a half-open time window
    async fn count_for_da_between(
        &self,
        da_id: &AgentId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// Close a flag as cleared or confirmed
    async fn review(
        &self,
        id: &FlagId,
        status: FlagStatus,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}

/// Repository for StockReturn entities
#[async_trait]
pub trait ReturnRepository: Send + Sync {
    /// Submit a return claim
    async fn create(&self, stock_return: &NewStockReturn) -> Result<StockReturn, DomainError>;

    /// Find a return by ID
    async fn find_by_id(&self, id: &ReturnId) -> Result<Option<StockReturn>, DomainError>;

    /// List returns, newest first, optionally filtered
    async fn list(
        &self,
        status: Option<ReturnStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<StockReturn>, DomainError>;

    /// Record the inspection outcome
    async fn inspect(
        &self,
        id: &ReturnId,
        status: ReturnStatus,
        received_qty: i64,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}
