//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod approval_service;
pub mod delivery_service;
pub mod fraud_service;
pub mod inventory_service;
pub mod ops_config;
pub mod overview_service;
pub mod payment_service;
pub mod scorecard_service;
pub mod user_service;

pub use approval_service::{ApprovalQueueRow, ApprovalService, OrderBadges, SlaBoardRow};
pub use delivery_service::{CreateOrder, DeliveryService, OrderLine};
pub use fraud_service::FraudService;
pub use inventory_service::{
    DaHoldingRow, InventoryService, StockDetail, StockListing, WarehouseStockRow,
};
// Re-export operational constants for public API (used by consumers)
#[allow(unused_imports)]
pub use ops_config::*;
pub use overview_service::{Overview, OverviewService};
pub use payment_service::PaymentService;
pub use scorecard_service::ScorecardService;
pub use user_service::{hash_token, UserService};
