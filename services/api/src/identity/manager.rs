//! User and role managers

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use common::error::DatabaseError;

use crate::models::{Role, User, UserFilter};

use super::{
    IdentityError, IdentityOptions, IdentityResult, PasswordHasher, RoleStore, UserStore,
    generate_token, normalize,
    validation::{
        validate_email, validate_password, validate_person_name, validate_role_name,
        validate_user_name,
    },
};

/// Profile of an account about to be created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Role management
#[derive(Clone)]
pub struct RoleManager {
    store: Arc<dyn RoleStore>,
}

impl RoleManager {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Create a role with a unique name
    pub async fn create(&self, name: &str) -> IdentityResult<Role> {
        validate_role_name(name).map_err(IdentityError::InvalidRoleName)?;

        if self.find_by_name(name).await?.is_some() {
            return Err(IdentityError::DuplicateRoleName(name.trim().to_string()));
        }

        let role = Role::new(name.trim());
        self.store.create(&role).await.map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => IdentityError::DuplicateRoleName(role.name.clone()),
            e => IdentityError::Store(e),
        })?;
        info!("Created role {}", role.name);

        Ok(role)
    }

    pub async fn find_by_name(&self, name: &str) -> IdentityResult<Option<Role>> {
        Ok(self.store.find_by_normalized_name(&normalize(name)).await?)
    }

    pub async fn list(&self) -> IdentityResult<Vec<Role>> {
        Ok(self.store.list().await?)
    }
}

/// User management: validation, normalization, hashing, and uniqueness
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn UserStore>,
    roles: Arc<RoleManager>,
    options: Arc<IdentityOptions>,
    hasher: PasswordHasher,
}

impl UserManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        roles: Arc<RoleManager>,
        options: Arc<IdentityOptions>,
    ) -> Self {
        Self {
            store,
            roles,
            options,
            hasher: PasswordHasher::new(),
        }
    }

    pub fn options(&self) -> &IdentityOptions {
        &self.options
    }

    /// Create an unconfirmed account with a password
    pub async fn create(&self, new_user: NewUser, password: &str) -> IdentityResult<User> {
        let user_name = new_user.user_name.trim().to_string();
        let email = new_user.email.trim().to_string();

        validate_user_name(&user_name).map_err(IdentityError::InvalidUserName)?;
        validate_email(&email).map_err(IdentityError::InvalidEmail)?;
        validate_profile(new_user.first_name.as_deref(), new_user.last_name.as_deref())?;
        validate_password(password, &self.options.password).map_err(IdentityError::PasswordPolicy)?;

        if self.find_by_name(&user_name).await?.is_some() {
            return Err(IdentityError::DuplicateUserName(user_name));
        }

        if self.options.user.require_unique_email && self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail(email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            normalized_user_name: normalize(&user_name),
            user_name,
            normalized_email: normalize(&email),
            email,
            email_confirmed: false,
            password_hash: self.hasher.hash(password)?,
            security_stamp: generate_token(),
            email_confirmation_token: Some(generate_token()),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(&user)
            .await
            .map_err(|e| duplicate_user(e, &user))?;
        info!("Created user {} ({})", user.user_name, user.id);

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> IdentityResult<Option<User>> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn find_by_name(&self, user_name: &str) -> IdentityResult<Option<User>> {
        Ok(self
            .store
            .find_by_normalized_user_name(&normalize(user_name))
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> IdentityResult<Option<User>> {
        Ok(self
            .store
            .find_by_normalized_email(&normalize(email))
            .await?)
    }

    /// Look a user up by name first, then by email
    pub async fn find_by_name_or_email(&self, value: &str) -> IdentityResult<Option<User>> {
        match self.find_by_name(value).await? {
            Some(user) => Ok(Some(user)),
            None => self.find_by_email(value).await,
        }
    }

    pub async fn check_password(&self, user: &User, password: &str) -> IdentityResult<bool> {
        self.hasher.verify(&user.password_hash, password)
    }

    /// Validate and hash a new password into `user` and rotate the security
    /// stamp, without persisting anything
    pub fn apply_password(&self, user: &mut User, password: &str) -> IdentityResult<()> {
        validate_password(password, &self.options.password).map_err(IdentityError::PasswordPolicy)?;

        user.password_hash = self.hasher.hash(password)?;
        user.security_stamp = generate_token();
        Ok(())
    }

    /// Replace the password and rotate the security stamp
    pub async fn set_password(&self, mut user: User, password: &str) -> IdentityResult<User> {
        self.apply_password(&mut user, password)?;

        user.updated_at = Utc::now();
        self.store.update(&user).await?;
        info!("Password changed for user {}", user.id);

        Ok(user)
    }

    /// Persist profile changes.
    ///
    /// A changed email is re-validated, must stay unique, and un-confirms the
    /// account with a fresh confirmation token.
    pub async fn update(&self, mut user: User) -> IdentityResult<User> {
        user.email = user.email.trim().to_string();
        validate_email(&user.email).map_err(IdentityError::InvalidEmail)?;
        validate_profile(user.first_name.as_deref(), user.last_name.as_deref())?;

        let normalized_email = normalize(&user.email);
        if normalized_email != user.normalized_email {
            if self.options.user.require_unique_email {
                if let Some(other) = self.store.find_by_normalized_email(&normalized_email).await? {
                    if other.id != user.id {
                        return Err(IdentityError::DuplicateEmail(user.email));
                    }
                }
            }

            user.normalized_email = normalized_email;
            user.email_confirmed = false;
            user.email_confirmation_token = Some(generate_token());
            user.security_stamp = generate_token();
        }

        user.updated_at = Utc::now();
        self.store
            .update(&user)
            .await
            .map_err(|e| duplicate_user(e, &user))?;

        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> IdentityResult<()> {
        if !self.store.delete(id).await? {
            return Err(IdentityError::UserNotFound);
        }

        info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn search(&self, filter: &UserFilter) -> IdentityResult<(Vec<User>, i64)> {
        Ok(self.store.search(filter).await?)
    }

    /// Mark the email address confirmed if `token` matches the issued one
    pub async fn confirm_email(&self, mut user: User, token: &str) -> IdentityResult<User> {
        match user.email_confirmation_token.as_deref() {
            Some(expected) if !token.is_empty() && expected == token => {}
            _ => {
                warn!("Rejected email confirmation for user {}", user.id);
                return Err(IdentityError::InvalidToken);
            }
        }

        user.email_confirmed = true;
        user.email_confirmation_token = None;
        user.updated_at = Utc::now();
        self.store.update(&user).await?;
        info!("Confirmed email for user {}", user.id);

        Ok(user)
    }

    /// Grant existing roles by name
    pub async fn add_to_roles(&self, user: &User, role_names: &[String]) -> IdentityResult<()> {
        for name in role_names {
            let role = self
                .roles
                .find_by_name(name)
                .await?
                .ok_or_else(|| IdentityError::RoleNotFound(name.clone()))?;

            self.store.add_to_role(user.id, role.id).await?;
        }

        Ok(())
    }

    pub async fn get_roles(&self, user: &User) -> IdentityResult<Vec<String>> {
        Ok(self.store.get_roles(user.id).await?)
    }
}

fn validate_profile(first_name: Option<&str>, last_name: Option<&str>) -> IdentityResult<()> {
    validate_person_name("First name", first_name).map_err(IdentityError::InvalidProfile)?;
    validate_person_name("Last name", last_name).map_err(IdentityError::InvalidProfile)
}

/// Map a unique-constraint rejection onto the field it guards
fn duplicate_user(e: DatabaseError, user: &User) -> IdentityError {
    match e {
        DatabaseError::UniqueViolation(constraint) if constraint.contains("email") => {
            IdentityError::DuplicateEmail(user.email.clone())
        }
        DatabaseError::UniqueViolation(_) => IdentityError::DuplicateUserName(user.user_name.clone()),
        e => IdentityError::Store(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryRoleStore, MemoryUserStore};

    fn managers() -> (UserManager, Arc<RoleManager>) {
        let roles = Arc::new(MemoryRoleStore::default());
        let role_manager = Arc::new(RoleManager::new(roles.clone()));
        let users = Arc::new(MemoryUserStore::new(roles));
        let user_manager = UserManager::new(
            users,
            role_manager.clone(),
            Arc::new(IdentityOptions::default()),
        );
        (user_manager, role_manager)
    }

    fn jane() -> NewUser {
        NewUser {
            user_name: "jane_doe".to_string(),
            email: "Jane@Example.com".to_string(),
            first_name: Some("Jane".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_hashes() {
        let (users, _) = managers();
        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();

        assert_eq!(user.normalized_user_name, "JANE_DOE");
        assert_eq!(user.normalized_email, "JANE@EXAMPLE.COM");
        assert!(!user.email_confirmed);
        assert!(user.email_confirmation_token.is_some());
        assert_ne!(user.password_hash, "Sup3r$ecret");
        assert!(users.check_password(&user, "Sup3r$ecret").await.unwrap());
        assert!(!users.check_password(&user, "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let (users, _) = managers();
        users.create(jane(), "Sup3r$ecret").await.unwrap();

        let same_name = NewUser {
            email: "other@example.com".to_string(),
            ..jane()
        };
        assert!(matches!(
            users.create(same_name, "Sup3r$ecret").await,
            Err(IdentityError::DuplicateUserName(_))
        ));

        let same_email = NewUser {
            user_name: "jane_two".to_string(),
            email: "JANE@example.COM".to_string(),
            ..jane()
        };
        assert!(matches!(
            users.create(same_email, "Sup3r$ecret").await,
            Err(IdentityError::DuplicateEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_create_enforces_password_policy() {
        let (users, _) = managers();
        assert!(matches!(
            users.create(jane(), "password").await,
            Err(IdentityError::PasswordPolicy(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_by_name_or_email() {
        let (users, _) = managers();
        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();

        let by_name = users.find_by_name_or_email("JANE_DOE").await.unwrap().unwrap();
        let by_email = users
            .find_by_name_or_email("jane@example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert!(users.find_by_name_or_email("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_email() {
        let (users, _) = managers();
        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();
        let token = user.email_confirmation_token.clone().unwrap();

        assert!(matches!(
            users.confirm_email(user.clone(), "wrong").await,
            Err(IdentityError::InvalidToken)
        ));

        let confirmed = users.confirm_email(user, &token).await.unwrap();
        assert!(confirmed.email_confirmed);
        assert!(confirmed.email_confirmation_token.is_none());

        assert!(matches!(
            users.confirm_email(confirmed, &token).await,
            Err(IdentityError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_set_password_rotates_security_stamp() {
        let (users, _) = managers();
        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();
        let stamp = user.security_stamp.clone();

        let user = users.set_password(user, "N3w$ecret!").await.unwrap();
        assert_ne!(user.security_stamp, stamp);
        assert!(users.check_password(&user, "N3w$ecret!").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_changed_email_requires_reconfirmation() {
        let (users, _) = managers();
        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();
        let token = user.email_confirmation_token.clone().unwrap();
        let mut user = users.confirm_email(user, &token).await.unwrap();

        user.email = "jane.doe@example.org".to_string();
        let user = users.update(user).await.unwrap();

        assert_eq!(user.normalized_email, "JANE.DOE@EXAMPLE.ORG");
        assert!(!user.email_confirmed);
        assert!(user.email_confirmation_token.is_some());
    }

    #[tokio::test]
    async fn test_roles() {
        let (users, roles) = managers();
        roles.create("Administrator").await.unwrap();
        assert!(matches!(
            roles.create("administrator").await,
            Err(IdentityError::DuplicateRoleName(_))
        ));

        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();
        users
            .add_to_roles(&user, &["administrator".to_string()])
            .await
            .unwrap();
        assert_eq!(users.get_roles(&user).await.unwrap(), vec!["Administrator"]);

        assert!(matches!(
            users.add_to_roles(&user, &["Missing".to_string()]).await,
            Err(IdentityError::RoleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let (users, _) = managers();
        let user = users.create(jane(), "Sup3r$ecret").await.unwrap();

        users.delete(user.id).await.unwrap();
        assert!(users.find_by_id(user.id).await.unwrap().is_none());
        assert!(matches!(
            users.delete(user.id).await,
            Err(IdentityError::UserNotFound)
        ));
    }

    /// Store whose lookups miss but whose inserts hit a unique constraint,
    /// as when a concurrent request wins the race
    struct RacedStore;

    #[async_trait::async_trait]
    impl UserStore for RacedStore {
        async fn create(&self, _user: &User) -> common::error::DatabaseResult<()> {
            Err(DatabaseError::UniqueViolation(
                "users_normalized_user_name_key".to_string(),
            ))
        }

        async fn update(&self, _user: &User) -> common::error::DatabaseResult<()> {
            Ok(())
        }

        async fn delete(&self, _id: Uuid) -> common::error::DatabaseResult<bool> {
            Ok(false)
        }

        async fn find_by_id(&self, _id: Uuid) -> common::error::DatabaseResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_normalized_user_name(
            &self,
            _normalized: &str,
        ) -> common::error::DatabaseResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_normalized_email(
            &self,
            _normalized: &str,
        ) -> common::error::DatabaseResult<Option<User>> {
            Ok(None)
        }

        async fn search(
            &self,
            _filter: &UserFilter,
        ) -> common::error::DatabaseResult<(Vec<User>, i64)> {
            Ok((vec![], 0))
        }

        async fn get_roles(&self, _user_id: Uuid) -> common::error::DatabaseResult<Vec<String>> {
            Ok(vec![])
        }

        async fn add_to_role(
            &self,
            _user_id: Uuid,
            _role_id: Uuid,
        ) -> common::error::DatabaseResult<()> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl RoleStore for RacedStore {
        async fn create(&self, _role: &Role) -> common::error::DatabaseResult<()> {
            Err(DatabaseError::UniqueViolation(
                "roles_normalized_name_key".to_string(),
            ))
        }

        async fn find_by_normalized_name(
            &self,
            _normalized: &str,
        ) -> common::error::DatabaseResult<Option<Role>> {
            Ok(None)
        }

        async fn list(&self) -> common::error::DatabaseResult<Vec<Role>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_lost_race_on_user_name_is_a_conflict() {
        let roles = Arc::new(RoleManager::new(Arc::new(RacedStore)));
        let users = UserManager::new(
            Arc::new(RacedStore),
            roles,
            Arc::new(IdentityOptions::default()),
        );

        let result = users.create(jane(), "Sup3r$ecret").await;
        assert!(matches!(result, Err(IdentityError::DuplicateUserName(ref name)) if name == "jane_doe"));
        assert!(matches!(
            crate::services::ServiceError::from(result.unwrap_err()),
            crate::services::ServiceError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_lost_race_on_role_name_is_a_conflict() {
        let roles = RoleManager::new(Arc::new(RacedStore));

        let result = roles.create("Editor").await;
        assert!(matches!(result, Err(IdentityError::DuplicateRoleName(ref name)) if name == "Editor"));
        assert!(matches!(
            crate::services::ServiceError::from(result.unwrap_err()),
            crate::services::ServiceError::Conflict(_)
        ));
    }

    #[test]
    fn test_email_constraint_maps_to_duplicate_email() {
        let mut user = crate::testing::test_user("jane_doe");
        user.email = "jane@example.com".to_string();

        assert!(matches!(
            duplicate_user(
                DatabaseError::UniqueViolation("idx_users_normalized_email".to_string()),
                &user
            ),
            IdentityError::DuplicateEmail(email) if email == "jane@example.com"
        ));
    }

    #[tokio::test]
    async fn test_overlong_names_are_rejected() {
        let (users, _) = managers();
        let long_name = NewUser {
            last_name: Some("x".repeat(101)),
            ..jane()
        };
        assert!(matches!(
            users.create(long_name, "Sup3r$ecret").await,
            Err(IdentityError::InvalidProfile(_))
        ));

        let mut user = users.create(jane(), "Sup3r$ecret").await.unwrap();
        user.first_name = Some("y".repeat(101));
        assert!(matches!(
            users.update(user).await,
            Err(IdentityError::InvalidProfile(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_password_does_not_persist() {
        let (users, _) = managers();
        let stored = users.create(jane(), "Sup3r$ecret").await.unwrap();

        let mut changed = stored.clone();
        users.apply_password(&mut changed, "N3w$ecret!").unwrap();
        assert_ne!(changed.security_stamp, stored.security_stamp);

        let reloaded = users.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.security_stamp, stored.security_stamp);
        assert!(users.check_password(&reloaded, "Sup3r$ecret").await.unwrap());
    }
}
