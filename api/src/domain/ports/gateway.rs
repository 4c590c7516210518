//! Payment gateway port trait
//!
//! Defines the interface for the Moniepoint collection rail. The shipped
//! adapter is a sandbox; a live integration would implement the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A collection request accepted by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    /// Transaction reference in `MP-…` format
    pub reference: String,
}

/// The gateway's view of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayVerification {
    pub reference: String,
    pub settled: bool,
    pub amount_kobo: i64,
}

/// Client for initiating and verifying Moniepoint collections
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Ask the gateway to collect `amount_kobo` for an order; returns the
    /// transaction reference the customer pays against
    async fn initiate(&self, order_ref: &str, amount_kobo: i64)
        -> Result<GatewayIntent, GatewayError>;

    /// Look up a transaction by reference
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError>;
}
