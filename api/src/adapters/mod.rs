//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod memory;
pub mod sandbox;
pub mod seed;

pub use memory::{
    MemoryAgentRepository, MemoryDeliveryRepository, MemoryFraudFlagRepository,
    MemoryPaymentRepository, MemoryReturnRepository, MemoryStockRepository, MemoryUserRepository,
};
pub use sandbox::{LogOtpNotifier, SandboxGateway};
