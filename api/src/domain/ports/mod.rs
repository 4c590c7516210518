//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod gateway;
pub mod notifier;
pub mod repositories;

pub use gateway::{GatewayIntent, GatewayVerification, PaymentGateway};
pub use notifier::OtpNotifier;
pub use repositories::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, PaymentRepository, ReturnRepository,
    StockRepository, UserRepository,
};
