//! OTP notifier port trait
//!
//! Delivers one-time codes to customers. The shipped adapter logs the
//! code; a live deployment would send SMS.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Channel for getting a delivery OTP to the customer
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    /// Send `code` to `phone` for the order with reference `order_ref`
    async fn send_otp(&self, phone: &str, code: &str, order_ref: &str)
        -> Result<(), NotifyError>;
}
