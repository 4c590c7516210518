//! Operational policy constants
//!
//! OTP limits, KPI targets and rate-limit numbers in one place. SLA and
//! bonus windows are delivery rules and live in the approval module.

/// OTP attempts before the order locks and a fraud flag is raised
pub const MAX_OTP_ATTEMPTS: u32 = 3;

/// Length of the delivery OTP
pub const OTP_DIGITS: usize = 6;

// KPI targets. `_GREEN` is the inclusive green minimum, `_AMBER` the
// inclusive amber minimum; below amber is red.

/// Approved over all resolved deliveries
pub const SUCCESS_RATE_GREEN: f64 = 0.95;
pub const SUCCESS_RATE_AMBER: f64 = 0.85;

/// Approvals inside the 24h SLA over all approvals
pub const ON_TIME_RATE_GREEN: f64 = 0.90;
pub const ON_TIME_RATE_AMBER: f64 = 0.75;

/// Confirmed collections over expected collections
pub const COLLECTION_RATE_GREEN: f64 = 0.98;
pub const COLLECTION_RATE_AMBER: f64 = 0.90;

/// Bonus-eligible approvals over all approvals
pub const BONUS_RATE_GREEN: f64 = 0.60;
pub const BONUS_RATE_AMBER: f64 = 0.40;

/// Fraud flags in the quarter; zero rates green
pub const FRAUD_FLAGS_AMBER_MAX: u64 = 2;

/// Requests per second allowed on the OTP and payment-initiate routes
pub const SENSITIVE_ROUTE_PER_SECOND: u64 = 2;

/// Burst allowance on the rate-limited routes
pub const SENSITIVE_ROUTE_BURST: u32 = 5;
