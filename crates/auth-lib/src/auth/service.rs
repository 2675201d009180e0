use async_trait::async_trait;
use crate::error::AppError;
use crate::models::{AccountId, IssuedSession, LoginRequest, RegisterRequest};

/// The request/response contract exposed to the HTTP shell. One method per
/// flow; every failure is synchronous and non-fatal.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. No session is issued; the caller logs in separately.
    async fn register(&self, req: RegisterRequest) -> Result<AccountId, AppError>;

    /// Authenticate and issue a session token for cookie delivery.
    async fn login(&self, req: LoginRequest) -> Result<IssuedSession, AppError>;

    /// Invalidate a session. Succeeds whether or not the token still exists.
    async fn logout(&self, token: Option<&str>) -> Result<(), AppError>;

    /// Check a bearer token and yield the owning account id.
    async fn validate_session(&self, token: Option<&str>) -> Result<AccountId, AppError>;
}
