//! In-memory adapters
//!
//! Repository implementations backed by `tokio::sync::RwLock`ed maps.
//! State lives for the lifetime of the process; the demo seed provides
//! a working dataset on startup.

mod agent_repo;
mod delivery_repo;
mod fraud_repo;
mod payment_repo;
mod return_repo;
mod stock_repo;
mod user_repo;

pub use agent_repo::MemoryAgentRepository;
pub use delivery_repo::MemoryDeliveryRepository;
pub use fraud_repo::MemoryFraudFlagRepository;
pub use payment_repo::MemoryPaymentRepository;
pub use return_repo::MemoryReturnRepository;
pub use stock_repo::MemoryStockRepository;
pub use user_repo::MemoryUserRepository;
