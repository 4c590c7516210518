//! Sandbox adapters for external rails
//!
//! The Moniepoint gateway and the SMS channel are stubbed for local and
//! demo use: the gateway settles every collection it issued, and OTPs go
//! to the log instead of a phone.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use crate::domain::ports::{GatewayIntent, GatewayVerification, OtpNotifier, PaymentGateway};
use crate::error::{GatewayError, NotifyError};

const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a sandbox transaction reference in `MP-…` format
fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..10)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("MP-{}", suffix)
}

/// Sandbox Moniepoint gateway
///
/// Remembers every reference it issued and reports it settled for the
/// full amount on verification. A live implementation would call the
/// Moniepoint transfer/POS APIs behind the same trait.
#[derive(Default)]
pub struct SandboxGateway {
    issued: RwLock<HashMap<String, i64>>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn initiate(
        &self,
        order_ref: &str,
        amount_kobo: i64,
    ) -> Result<GatewayIntent, GatewayError> {
        let reference = generate_reference();
        let mut issued = self.issued.write().await;
        issued.insert(reference.clone(), amount_kobo);
        tracing::debug!(%order_ref, %reference, amount_kobo, "Sandbox collection initiated");
        Ok(GatewayIntent { reference })
    }

    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError> {
        let issued = self.issued.read().await;
        let amount_kobo = issued
            .get(reference)
            .copied()
            .ok_or_else(|| GatewayError::UnknownReference(reference.to_string()))?;
        Ok(GatewayVerification {
            reference: reference.to_string(),
            settled: true,
            amount_kobo,
        })
    }
}

/// OTP notifier that writes the code to the log
///
/// Stands in for the SMS rail; the code appears in the server log so a
/// demo operator can complete the delivery flow.
pub struct LogOtpNotifier;

#[async_trait]
impl OtpNotifier for LogOtpNotifier {
    async fn send_otp(&self, phone: &str, code: &str, order_ref: &str) -> Result<(), NotifyError> {
        tracing::info!(%order_ref, %phone, %code, "Sandbox OTP issued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::payment::is_valid_reference;

    #[test]
    fn generated_references_validate() {
        for _ in 0..50 {
            let reference = generate_reference();
            assert!(is_valid_reference(&reference), "bad ref: {}", reference);
        }
    }

    #[tokio::test]
    async fn verify_settles_issued_references() {
        let gateway = SandboxGateway::new();
        let intent = gateway.initiate("DO-1001", 540_000).await.unwrap();

        let verification = gateway.verify(&intent.reference).await.unwrap();
        assert!(verification.settled);
        assert_eq!(verification.amount_kobo, 540_000);
    }

    #[tokio::test]
    async fn verify_rejects_unknown_references() {
        let gateway = SandboxGateway::new();
        let err = gateway.verify("MP-ZZZZZZZZZZ").await.unwrap_err();
        assert!(matches!(err, GatewayError::UnknownReference(_)));
    }
}
