//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use chrono::Utc;

use crate::domain::entities::{AgentId, Role, User, UserId};

/// Create a test user with the given role
pub fn test_user(role: Role) -> User {
    let name = match role {
        Role::Admin => "Test Admin",
        Role::Supervisor => "Test Supervisor",
        Role::InventoryOfficer => "Test Officer",
        Role::DeliveryAgent => "Test DA",
    };
    User {
        id: UserId::new(),
        name: name.to_string(),
        phone: None,
        role,
        da_id: None,
        token_hash: format!("hash-{}", name.to_lowercase().replace(' ', "-")),
        active: true,
        created_at: Utc::now(),
        last_seen_at: None,
    }
}

/// Create a test admin user
pub fn test_admin() -> User {
    test_user(Role::Admin)
}

/// Create a test supervisor user
pub fn test_supervisor() -> User {
    test_user(Role::Supervisor)
}

/// Create a test inventory officer user
pub fn test_officer() -> User {
    test_user(Role::InventoryOfficer)
}

/// Create a test DA user acting for a specific roster entry
pub fn test_da_user(da_id: AgentId) -> User {
    let mut user = test_user(Role::DeliveryAgent);
    user.da_id = Some(da_id);
    user
}
