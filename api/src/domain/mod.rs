//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models representing core business concepts
//! - `approval`: Delivery approval, SLA and bonus rules
//! - `ports`: Trait definitions for external dependencies

pub mod approval;
pub mod entities;
pub mod ports;
