//! Mock implementations of the outbound ports

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{GatewayIntent, GatewayVerification, OtpNotifier, PaymentGateway};
use crate::error::{GatewayError, NotifyError};

/// An OTP sent through the capturing notifier
#[derive(Debug, Clone)]
pub struct SentOtp {
    pub phone: String,
    pub code: String,
    pub order_ref: String,
}

/// Notifier that records every OTP instead of delivering it
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<SentOtp>>,
    fail: bool,
}

impl CapturingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose sends always fail
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// The code from the most recent send
    pub async fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().await;
        sent.last().map(|s| s.code.clone())
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl OtpNotifier for CapturingNotifier {
    async fn send_otp(&self, phone: &str, code: &str, order_ref: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("SMS channel down".to_string()));
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentOtp {
            phone: phone.to_string(),
            code: code.to_string(),
            order_ref: order_ref.to_string(),
        });
        Ok(())
    }
}

/// Gateway that refuses every call
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn initiate(
        &self,
        _order_ref: &str,
        _amount_kobo: i64,
    ) -> Result<GatewayIntent, GatewayError> {
        Err(GatewayError::Unavailable("gateway offline".to_string()))
    }

    async fn verify(&self, _reference: &str) -> Result<GatewayVerification, GatewayError> {
        Err(GatewayError::Unavailable("gateway offline".to_string()))
    }
}
