//! Domain entities
//!
//! Pure domain models representing core business concepts, independent
//! of any storage or transport concern.

pub mod agent;
pub mod delivery;
pub mod fraud;
pub mod payment;
pub mod returns;
pub mod scorecard;
pub mod stock;
pub mod user;

pub use agent::{is_valid_phone, AgentId, AgentStatus, DeliveryAgent, NewDeliveryAgent};
pub use delivery::{
    DeliveryId, DeliveryOrder, DeliveryStatus, LineItem, NewDeliveryOrder, PaymentMethod,
};
pub use fraud::{
    FlagId, FlagStatus, FlagSubject, FraudFlag, FraudReason, FraudSeverity, NewFraudFlag,
};
pub use payment::{
    is_valid_reference, NewPayment, PaymentChannel, PaymentConfirmation, PaymentId, PaymentStatus,
};
pub use returns::{NewStockReturn, ReturnId, ReturnReason, ReturnStatus, StockReturn};
pub use scorecard::{
    overall_rating, ratio, CompanyScorecard, DaStanding, KpiMetric, Quarter, Rag, Scorecard,
    TrendPoint,
};
pub use stock::{
    ConsignmentHolding, NewProductStock, ProductStock, Sku, StockHealth, RESTOCK_MULTIPLIER,
};
pub use user::{NewUser, Role, User, UserId};
