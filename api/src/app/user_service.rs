//! User and DA directory service
//!
//! Handles account registration, bearer token issuance, and the delivery
//! agent roster.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::entities::{
    is_valid_phone, AgentId, DeliveryAgent, NewDeliveryAgent, NewUser, Role, User, UserId,
};
use crate::domain::ports::{AgentRepository, UserRepository};
use crate::error::{AppError, DomainError};

/// Service for managing users and the DA roster
pub struct UserService<UR, AR>
where
    UR: UserRepository,
    AR: AgentRepository,
{
    users: Arc<UR>,
    agents: Arc<AR>,
}

impl<UR, AR> UserService<UR, AR>
where
    UR: UserRepository,
    AR: AgentRepository,
{
    pub fn new(users: Arc<UR>, agents: Arc<AR>) -> Self {
        Self { users, agents }
    }

    /// Register a new user account
    ///
    /// Returns (user, token) - the token is only shown once.
    pub async fn register_user(
        &self,
        name: &str,
        phone: Option<&str>,
        role: Role,
        da_id: Option<AgentId>,
    ) -> Result<(User, String), AppError> {
        // Validate name
        if name.is_empty() || name.len() > 50 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 50 characters".to_string(),
            ));
        }

        if let Some(phone) = phone {
            if !is_valid_phone(phone) {
                return Err(AppError::BadRequest(format!(
                    "'{}' is not a valid Nigerian mobile number",
                    phone
                )));
            }
        }

        // DA accounts must point at a roster entry; staff accounts must not
        match role {
            Role::DeliveryAgent => {
                let da_id = da_id.ok_or_else(|| {
                    AppError::BadRequest(
                        "Delivery agent accounts must name the DA they act for".to_string(),
                    )
                })?;
                if self.agents.find_by_id(&da_id).await?.is_none() {
                    return Err(AppError::Domain(DomainError::NotFound(format!(
                        "DA {}",
                        da_id
                    ))));
                }
            }
            _ if da_id.is_some() => {
                return Err(AppError::BadRequest(
                    "Only delivery agent accounts are linked to a DA".to_string(),
                ));
            }
            _ => {}
        }

        // Check if name is already taken
        if self.users.find_by_name(name).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "User with name '{}' already exists",
                name
            ))));
        }

        // Generate credentials
        let token = generate_token();
        let token_hash = hash_token(&token);

        let new_user = NewUser {
            name: name.to_string(),
            phone: phone.map(str::to_string),
            role,
            da_id,
            token_hash,
        };

        let user = self.users.create(&new_user).await?;

        Ok((user, token))
    }

    /// Add a DA to the roster
    pub async fn register_da(
        &self,
        name: &str,
        phone: &str,
        territory: &str,
    ) -> Result<DeliveryAgent, AppError> {
        if name.is_empty() || name.len() > 50 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 50 characters".to_string(),
            ));
        }
        if !is_valid_phone(phone) {
            return Err(AppError::BadRequest(format!(
                "'{}' is not a valid Nigerian mobile number",
                phone
            )));
        }
        if territory.is_empty() {
            return Err(AppError::BadRequest("Territory must not be empty".to_string()));
        }

        let new_agent = NewDeliveryAgent {
            name: name.to_string(),
            phone: phone.to_string(),
            territory: territory.to_string(),
        };
        Ok(self.agents.create(&new_agent).await?)
    }

    /// Find a user by their bearer token hash
    pub async fn find_by_token(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_token_hash(token_hash).await?)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// Update a user's last seen timestamp
    pub async fn touch(&self, id: &UserId) -> Result<(), AppError> {
        self.users.update_last_seen(id).await?;
        Ok(())
    }

    /// List the DA roster, alphabetical
    pub async fn list_das(&self) -> Result<Vec<DeliveryAgent>, AppError> {
        Ok(self.agents.list().await?)
    }

    /// Find a DA by ID
    pub async fn get_da(&self, id: &AgentId) -> Result<Option<DeliveryAgent>, AppError> {
        Ok(self.agents.find_by_id(id).await?)
    }
}

/// Generate a random bearer token
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("fl-{}", hex::encode(bytes))
}

/// Hash a bearer token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryAgentRepository, MemoryUserRepository};

    fn create_service() -> UserService<MemoryUserRepository, MemoryAgentRepository> {
        UserService::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryAgentRepository::new()),
        )
    }

    #[test]
    fn test_token_generation() {
        let token = generate_token();
        assert!(token.starts_with("fl-"));
        assert_eq!(token.len(), 3 + 64); // "fl-" + 32 bytes hex
    }

    #[test]
    fn test_token_hashing() {
        let token = "fl-test123";
        let hash1 = hash_token(token);
        let hash2 = hash_token(token);
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, token);
    }

    #[tokio::test]
    async fn register_user_success() {
        let service = create_service();

        let result = service
            .register_user("Funke Alade", Some("08031234567"), Role::Admin, None)
            .await;

        assert!(result.is_ok());
        let (user, token) = result.unwrap();
        assert_eq!(user.name, "Funke Alade");
        assert_eq!(user.role, Role::Admin);
        assert!(token.starts_with("fl-"));
        assert_eq!(user.token_hash, hash_token(&token));
    }

    #[tokio::test]
    async fn register_user_fails_with_duplicate_name() {
        let service = create_service();
        service
            .register_user("Funke Alade", None, Role::Admin, None)
            .await
            .unwrap();

        let result = service
            .register_user("Funke Alade", None, Role::Supervisor, None)
            .await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("already exists"));
    }

    #[tokio::test]
    async fn register_user_rejects_bad_phone() {
        let service = create_service();

        let result = service
            .register_user("Funke Alade", Some("12345"), Role::Admin, None)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn da_account_requires_roster_entry() {
        let service = create_service();

        // No da_id at all
        let result = service
            .register_user("Emeka Obi", None, Role::DeliveryAgent, None)
            .await;
        assert!(result.is_err());

        // da_id that is not on the roster
        let result = service
            .register_user("Emeka Obi", None, Role::DeliveryAgent, Some(AgentId::new()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn staff_account_rejects_da_link() {
        let service = create_service();
        let da = service
            .register_da("Emeka Obi", "08031234567", "Surulere")
            .await
            .unwrap();

        let result = service
            .register_user("Ngozi Eze", None, Role::Supervisor, Some(da.id))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn da_account_links_to_roster_entry() {
        let service = create_service();
        let da = service
            .register_da("Emeka Obi", "08031234567", "Surulere")
            .await
            .unwrap();

        let (user, _) = service
            .register_user("Emeka Obi", None, Role::DeliveryAgent, Some(da.id))
            .await
            .unwrap();

        assert_eq!(user.da_id, Some(da.id));
    }

    #[tokio::test]
    async fn register_da_rejects_invalid_phone() {
        let service = create_service();

        let result = service.register_da("Emeka Obi", "0123", "Surulere").await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Nigerian mobile number"));
    }

    #[tokio::test]
    async fn token_lookup_roundtrip() {
        let service = create_service();
        let (user, token) = service
            .register_user("Tunde Bakare", None, Role::InventoryOfficer, None)
            .await
            .unwrap();

        let found = service.find_by_token(&hash_token(&token)).await.unwrap();

        assert_eq!(found.map(|u| u.id), Some(user.id));
    }
}
