//! Authentication service
//!
//! Provides business logic for user registration, login, logout, token
//! refresh, and user lookups. Coordinates between the user repository, the
//! revoked token repository, and the JWT service.

use chrono::{DateTime, Utc};

use crate::auth::jwt::{Claims, JwtError, JwtService, TokenType};
use crate::db::models::{CreateUser, UserResponse};
use crate::db::repositories::{
    RevokedTokenRepository, RevokedTokenRepositoryError, UserRepository, UserRepositoryError,
};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Missing {0} parameter")]
    MissingCredentials(&'static str),

    #[error("Username already taken")]
    DuplicateUser,

    #[error("User not found")]
    UserNotFound,

    #[error("Wrong credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token malformed")]
    TokenMalformed,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Token signature invalid")]
    TokenSignatureInvalid,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::SignatureInvalid => AuthError::TokenSignatureInvalid,
            JwtError::Malformed | JwtError::WrongTokenType => AuthError::TokenMalformed,
            JwtError::MissingSecret | JwtError::EncodingError(_) => {
                AuthError::InternalError(err.to_string())
            }
        }
    }
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::UsernameAlreadyExists => AuthError::DuplicateUser,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<RevokedTokenRepositoryError> for AuthError {
    fn from(err: RevokedTokenRepositoryError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Registration request data.
///
/// This struct is the allow-list of registrable fields; anything else in the
/// payload is rejected at deserialization.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response for registration and login: confirmation plus a token pair
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    revoked_repo: RevokedTokenRepository,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        user_repo: UserRepository,
        revoked_repo: RevokedTokenRepository,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            user_repo,
            revoked_repo,
            jwt_service,
        }
    }

    /// Check that a registration request carries its required fields
    fn validate_registration(
        request: &RegisterRequest,
    ) -> Result<(String, String, String), AuthError> {
        let username = match request.username.as_deref() {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => return Err(AuthError::Validation("username is required".to_string())),
        };
        let email = match request.email.as_deref() {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => return Err(AuthError::Validation("email is required".to_string())),
        };
        let password = match request.password.as_deref() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => return Err(AuthError::Validation("password is required".to_string())),
        };

        Ok((username, email, password))
    }

    /// Check that a login request carries both credentials
    fn require_credentials(request: &LoginRequest) -> Result<(String, String), AuthError> {
        let username = request
            .username
            .clone()
            .ok_or(AuthError::MissingCredentials("username"))?;
        let password = request
            .password
            .clone()
            .ok_or(AuthError::MissingCredentials("password"))?;

        Ok((username, password))
    }

    /// Register a new user and issue an initial token pair
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let (username, email, password) = Self::validate_registration(&request)?;

        // Friendly pre-check; the UNIQUE constraint on the username column is
        // what actually closes the race on concurrent registrations.
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AuthError::DuplicateUser);
        }

        let dto = CreateUser {
            username,
            email,
            name: request.name,
            surname: request.surname,
            password_hash: UserRepository::hash_password(&password)?,
        };

        let user = self.user_repo.create(&dto).await?;

        let tokens = self.jwt_service.generate_token_pair(&user.username)?;

        Ok(AuthResponse {
            message: format!("Congratulations, user {} has been created", user.username),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Login an existing user and issue a fresh token pair
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let (username, password) = Self::require_credentials(&request)?;

        let user = self
            .user_repo
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let is_valid = UserRepository::verify_password(&password, &user.password_hash)?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.jwt_service.generate_token_pair(&user.username)?;

        Ok(AuthResponse {
            message: format!("Logged in as {}", user.username),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Verify an access token: signature, expiry, and revocation
    pub async fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.jwt_service.validate_access_token(token)?;

        if self.revoked_repo.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Verify a refresh token: signature, expiry, and revocation
    pub async fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.jwt_service.validate_refresh_token(token)?;

        if self.revoked_repo.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Revoke a refresh token's jti.
    ///
    /// Only signature and expiry are checked here; a token that is already
    /// revoked can still be logged out with, so the revocation set is not
    /// consulted. Idempotent at the storage layer.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.jwt_service.validate_refresh_token(refresh_token)?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".to_string()))?;

        self.revoked_repo.revoke(&claims.jti, expires_at).await?;

        Ok(())
    }

    /// Issue a new access token against a valid, non-revoked refresh token.
    ///
    /// The refresh token itself is not rotated; it stays usable until it
    /// expires or is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verify_refresh_token(refresh_token).await?;

        let access_token = self.jwt_service.issue(&claims.sub, TokenType::Access)?;

        Ok(access_token)
    }

    /// List all users (password hashes excluded by the response projection)
    pub async fn list_users(&self, access_token: &str) -> Result<Vec<UserResponse>, AuthError> {
        self.verify_access_token(access_token).await?;

        let users = self.user_repo.list_all().await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Get the user record behind a valid access token.
    ///
    /// The account may have been deleted after the token was issued; the
    /// token stays structurally valid until expiry, so this can miss.
    pub async fn current_user(&self, access_token: &str) -> Result<UserResponse, AuthError> {
        let claims = self.verify_access_token(access_token).await?;

        let user = self
            .user_repo
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Validation Tests
    // ========================================================================

    fn full_request() -> RegisterRequest {
        RegisterRequest {
            username: Some("alice".to_string()),
            email: Some("a@x.com".to_string()),
            password: Some("p1".to_string()),
            name: None,
            surname: None,
        }
    }

    #[test]
    fn test_validate_registration_complete() {
        let (username, email, password) =
            AuthService::validate_registration(&full_request()).unwrap();

        assert_eq!(username, "alice");
        assert_eq!(email, "a@x.com");
        assert_eq!(password, "p1");
    }

    #[test]
    fn test_validate_registration_missing_username() {
        let mut request = full_request();
        request.username = None;

        let result = AuthService::validate_registration(&request);
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[test]
    fn test_validate_registration_empty_password() {
        let mut request = full_request();
        request.password = Some(String::new());

        let result = AuthService::validate_registration(&request);
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[test]
    fn test_require_credentials_complete() {
        let request = LoginRequest {
            username: Some("alice".to_string()),
            password: Some("p1".to_string()),
        };

        let (username, password) = AuthService::require_credentials(&request).unwrap();
        assert_eq!(username, "alice");
        assert_eq!(password, "p1");
    }

    #[test]
    fn test_require_credentials_missing_username() {
        let request = LoginRequest {
            username: None,
            password: Some("p1".to_string()),
        };

        let result = AuthService::require_credentials(&request);
        assert!(matches!(
            result,
            Err(AuthError::MissingCredentials("username"))
        ));
    }

    #[test]
    fn test_require_credentials_missing_password() {
        let request = LoginRequest {
            username: Some("alice".to_string()),
            password: None,
        };

        let result = AuthService::require_credentials(&request);
        assert!(matches!(
            result,
            Err(AuthError::MissingCredentials("password"))
        ));
    }

    // ========================================================================
    // Error Conversion Tests
    // ========================================================================

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            format!("{}", AuthError::MissingCredentials("username")),
            "Missing username parameter"
        );
        assert_eq!(
            format!("{}", AuthError::DuplicateUser),
            "Username already taken"
        );
        assert_eq!(format!("{}", AuthError::UserNotFound), "User not found");
        assert_eq!(
            format!("{}", AuthError::InvalidCredentials),
            "Wrong credentials"
        );
        assert_eq!(format!("{}", AuthError::TokenRevoked), "Token revoked");
    }

    #[test]
    fn test_auth_error_from_jwt_error() {
        let err: AuthError = JwtError::Expired.into();
        assert!(matches!(err, AuthError::TokenExpired));

        let err: AuthError = JwtError::SignatureInvalid.into();
        assert!(matches!(err, AuthError::TokenSignatureInvalid));

        let err: AuthError = JwtError::Malformed.into();
        assert!(matches!(err, AuthError::TokenMalformed));

        let err: AuthError = JwtError::WrongTokenType.into();
        assert!(matches!(err, AuthError::TokenMalformed));

        let err: AuthError = JwtError::MissingSecret.into();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    #[test]
    fn test_auth_error_from_user_repository_error() {
        let err: AuthError = UserRepositoryError::UsernameAlreadyExists.into();
        assert!(matches!(err, AuthError::DuplicateUser));

        let err: AuthError = UserRepositoryError::HashingError("boom".to_string()).into();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    // ========================================================================
    // Request Deserialization Tests
    // ========================================================================

    #[test]
    fn test_register_request_deserialization() {
        let json = r#"{
            "username": "alice",
            "email": "a@x.com",
            "password": "p1",
            "name": "Alice",
            "surname": "Martin"
        }"#;

        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert_eq!(request.email.as_deref(), Some("a@x.com"));
        assert_eq!(request.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_register_request_rejects_unknown_fields() {
        let json = r#"{
            "username": "alice",
            "email": "a@x.com",
            "password": "p1",
            "is_admin": true
        }"#;

        let result: Result<RegisterRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_login_request_tolerates_missing_fields() {
        let json = r#"{"username": "alice"}"#;

        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert!(request.password.is_none());
    }

    // ========================================================================
    // Flow Tests (require real database)
    // ========================================================================

    async fn test_service() -> AuthService {
        let config = crate::db::pool::DbConfig::from_env().expect("DATABASE_URL must be set");
        let pool = crate::db::pool::create_pool_with_migrations(&config)
            .await
            .expect("Failed to create pool");

        AuthService::new(
            UserRepository::new(pool.clone()),
            RevokedTokenRepository::new(pool),
            crate::auth::jwt::JwtService::new(crate::auth::jwt::JwtConfig::new(
                "test_secret_key_for_testing_only_32bytes!",
            )),
        )
    }

    fn unique_registration() -> RegisterRequest {
        RegisterRequest {
            username: Some(format!("it_{}", uuid::Uuid::new_v4().simple())),
            email: Some("it@example.com".to_string()),
            password: Some("p1".to_string()),
            name: None,
            surname: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_register_then_login() {
        let service = test_service().await;
        let request = unique_registration();
        let username = request.username.clone().unwrap();

        let registered = service.register(request).await.unwrap();
        assert!(!registered.access_token.is_empty());
        assert!(!registered.refresh_token.is_empty());

        // Same username again is a duplicate
        let duplicate = service
            .register(RegisterRequest {
                username: Some(username.clone()),
                email: Some("other@example.com".to_string()),
                password: Some("p2".to_string()),
                name: None,
                surname: None,
            })
            .await;
        assert!(matches!(duplicate, Err(AuthError::DuplicateUser)));

        // Wrong password fails, right password succeeds
        let wrong = service
            .login(LoginRequest {
                username: Some(username.clone()),
                password: Some("wrong".to_string()),
            })
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let logged_in = service
            .login(LoginRequest {
                username: Some(username.clone()),
                password: Some("p1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.message, format!("Logged in as {}", username));
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_logout_revokes_refresh_token() {
        let service = test_service().await;

        let registered = service.register(unique_registration()).await.unwrap();
        let refresh_token = registered.refresh_token;

        // Refresh works before logout
        let access = service.refresh(&refresh_token).await.unwrap();
        assert!(service.verify_access_token(&access).await.is_ok());

        // Logout twice; both succeed
        service.logout(&refresh_token).await.unwrap();
        service.logout(&refresh_token).await.unwrap();

        // Refresh now fails with a revocation error
        let result = service.refresh(&refresh_token).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_list_users_excludes_password_hash() {
        let service = test_service().await;

        let registered = service.register(unique_registration()).await.unwrap();
        let users = service.list_users(&registered.access_token).await.unwrap();
        assert!(!users.is_empty());

        let json = serde_json::to_string(&users).unwrap();
        assert!(!json.contains("password"));
    }
}
