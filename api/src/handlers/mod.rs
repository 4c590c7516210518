//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod das;
pub mod deliveries;
pub mod fraud;
pub mod overview;
pub mod payments;
pub mod returns;
pub mod scorecards;
pub mod stocks;
pub mod users;

pub use das::{get_da, list_das, register_da};
pub use deliveries::{
    approve_delivery, attach_photo, cancel_delivery, create_delivery, dispatch_delivery,
    fail_delivery, get_delivery, list_deliveries, reissue_otp, reject_delivery, sla_board,
    submit_otp,
};
pub use fraud::{get_flag, list_flags, raise_flag, review_flag};
pub use overview::get_overview;
pub use payments::{confirm_payment, get_payment, initiate_payment, list_payments};
pub use returns::{get_return, inspect_return, list_returns, submit_return};
pub use scorecards::{company_scorecard, da_scorecard, leaderboard};
pub use stocks::{assign_stock, get_stock, list_stock, restock_suggestions};
pub use users::{create_user, me};
