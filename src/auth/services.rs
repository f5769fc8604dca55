use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    dto::{LoginPayload, LoginResponse, RegisterPayload},
    errors::AuthError,
    jwt::JwtKeys,
    password,
    repo::{DynUserStore, StoreError},
    repo_types::{NewUser, PublicUser},
};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

/// Lowercased and trimmed; the only form used for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Schema rules applied to already normalized input.
fn validate_registration(email: &str, name: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::Validation(
            "Please provide a valid email address".into(),
        ));
    }
    let name_len = name.chars().count();
    if name_len < NAME_MIN {
        return Err(AuthError::Validation(
            "Name must be at least 2 characters long".into(),
        ));
    }
    if name_len > NAME_MAX {
        return Err(AuthError::Validation(
            "Name cannot exceed 50 characters".into(),
        ));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(AuthError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }
    Ok(())
}

/// Registration, credential verification and user lookup over a [`UserStore`](crate::auth::repo::UserStore).
#[derive(Clone)]
pub struct UsersService {
    store: DynUserStore,
    keys: JwtKeys,
}

impl UsersService {
    pub fn new(store: DynUserStore, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    #[instrument(skip(self, payload))]
    pub async fn register(&self, payload: RegisterPayload) -> Result<PublicUser, AuthError> {
        let email = normalize_email(&payload.email);
        let name = payload.name.trim().to_string();
        validate_registration(&email, &name, &payload.password)?;

        // Fast path only: the store's unique constraint is what decides races
        if self.store.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = password::hash_password_blocking(payload.password).await?;

        let user = match self
            .store
            .insert(NewUser {
                email,
                name,
                password_hash,
            })
            .await
        {
            Ok(u) => u,
            Err(StoreError::DuplicateEmail) => {
                warn!("email registered concurrently");
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user.into())
    }

    #[instrument(skip(self, payload))]
    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(&payload.email);

        let user = match self.store.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                warn!(%email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "login on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let ok =
            password::verify_password_blocking(payload.password, user.password_hash.clone())
                .await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.keys.sign(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_active_users(&self) -> Result<Vec<PublicUser>, AuthError> {
        let users = self.store.list_active().await?;
        info!(count = users.len(), "listed active users");
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<PublicUser, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryUserStore;
    use crate::config::JwtConfig;
    use crate::rpc::RpcError;
    use std::sync::Arc;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            ttl_minutes: 60 * 24,
        }
    }

    fn service() -> (UsersService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let svc = UsersService::new(store.clone(), JwtKeys::from_config(&jwt_config()));
        (svc, store)
    }

    fn register_payload(email: &str, name: &str, password: &str) -> RegisterPayload {
        RegisterPayload {
            email: email.into(),
            name: name.into(),
            password: password.into(),
        }
    }

    fn login_payload(email: &str, password: &str) -> LoginPayload {
        LoginPayload {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_normalization_and_format() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
    }

    #[tokio::test]
    async fn register_returns_user_without_password() {
        let (svc, _) = service();
        let user = svc
            .register(register_payload(" Ann@X.com ", "  Ann ", "secret1"))
            .await
            .expect("register");
        assert_eq!(user.email, "ann@x.com");
        assert_eq!(user.name, "Ann");
        assert!(user.is_active);

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.to_lowercase().contains("password"));
        assert!(!json.contains("$argon2"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_regardless_of_case() {
        let (svc, _) = service();
        svc.register(register_payload("a@x.com", "Ann", "secret1"))
            .await
            .expect("first register");
        let err = svc
            .register(register_payload("A@X.com", "Ann2", "other12"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(RpcError::from(err).status, 409);
    }

    #[tokio::test]
    async fn register_applies_schema_rules() {
        let (svc, _) = service();
        for payload in [
            register_payload("nope", "Ann", "secret1"),
            register_payload("a@x.com", " A ", "secret1"),
            register_payload("a@x.com", &"n".repeat(51), "secret1"),
            register_payload("a@x.com", "Ann", "12345"),
        ] {
            let err = svc.register(payload).await.unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registers_of_one_email_admit_exactly_one() {
        let (svc, _) = service();
        let mut handles = Vec::new();
        for i in 0..6 {
            let svc = svc.clone();
            let email = if i % 2 == 0 { "race@x.com" } else { " RACE@x.com" };
            handles.push(tokio::spawn(async move {
                svc.register(register_payload(email, "Racer", "secret1")).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.expect("task") {
                Ok(_) => ok += 1,
                Err(AuthError::EmailTaken) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn login_issues_token_with_identity_claims() {
        let (svc, _) = service();
        let user = svc
            .register(register_payload("a@x.com", "Ann", "secret1"))
            .await
            .unwrap();

        let res = svc
            .login(login_payload(" A@x.com", "secret1"))
            .await
            .expect("login");
        assert_eq!(res.user, user);

        let claims = JwtKeys::from_config(&jwt_config())
            .verify(&res.access_token)
            .expect("token verifies");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.name, "Ann");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (svc, store) = service();
        svc.register(register_payload("a@x.com", "Ann", "secret1"))
            .await
            .unwrap();
        let inactive = svc
            .register(register_payload("off@x.com", "Off", "secret1"))
            .await
            .unwrap();
        store.set_active(inactive.id, false);

        let wrong_password = svc.login(login_payload("a@x.com", "wrong!!")).await;
        let unknown_email = svc.login(login_payload("ghost@x.com", "secret1")).await;
        let inactive_account = svc.login(login_payload("off@x.com", "secret1")).await;

        let errors: Vec<RpcError> = [wrong_password, unknown_email, inactive_account]
            .into_iter()
            .map(|r| RpcError::from(r.unwrap_err()))
            .collect();
        for err in &errors {
            assert_eq!(err.status, 401);
            assert_eq!(err.message, "Invalid email or password");
        }
        assert!(errors.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn list_active_users_newest_first_without_inactive() {
        let (svc, store) = service();
        let ann = svc
            .register(register_payload("ann@x.com", "Ann", "secret1"))
            .await
            .unwrap();
        let bob = svc
            .register(register_payload("bob@x.com", "Bob", "secret1"))
            .await
            .unwrap();
        let cid = svc
            .register(register_payload("cid@x.com", "Cid", "secret1"))
            .await
            .unwrap();
        store.set_active(bob.id, false);

        let listed = svc.list_active_users().await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![cid.id, ann.id]);

        let json = serde_json::to_string(&listed).unwrap();
        assert!(!json.to_lowercase().contains("password"));
    }

    #[tokio::test]
    async fn find_by_id_known_and_unknown() {
        let (svc, _) = service();
        let ann = svc
            .register(register_payload("ann@x.com", "Ann", "secret1"))
            .await
            .unwrap();

        assert_eq!(svc.find_by_id(ann.id).await.unwrap(), ann);
        let err = svc.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
        assert_eq!(RpcError::from(err).status, 404);
    }
}
