//! Authentication middleware
//!
//! Sign-in is handled by an OAuth proxy in front of the service, which
//! forwards the signed-in e-mail (and display name) as request headers. The
//! middleware turns that identity into a user account, creating it on first
//! sight, and attaches it to the request as [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use snehband_common::db::{users, Role, User};
use tracing::warn;

use crate::{ApiError, ApiResult, AppState};

/// Header carrying the shared secret between proxy and service
pub const PROXY_SECRET_HEADER: &str = "x-proxy-secret";

/// Signed-in account, available to handlers as `Extension<CurrentUser>`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

impl CurrentUser {
    /// Fail with 403 unless the account's role is at least `required`
    pub fn require(&self, required: Role) -> ApiResult<()> {
        if self.role.allows(required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Requires {:?} role or higher",
                required
            )))
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the proxy-asserted identity into a [`CurrentUser`]
///
/// Returns 401 when the identity header is missing or, with a proxy secret
/// configured, when the request did not pass through the proxy.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = &state.config.auth;

    if let Some(secret) = auth.proxy_secret.as_deref() {
        if header_value(request.headers(), PROXY_SECRET_HEADER).as_deref() != Some(secret) {
            warn!(uri = %request.uri(), "Rejected request without valid proxy secret");
            return Err(ApiError::Unauthorized(
                "Request did not pass through the sign-in proxy".to_string(),
            ));
        }
    }

    let email = header_value(request.headers(), &auth.identity_header)
        .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;
    let name = header_value(request.headers(), &auth.name_header);

    let initial_role = if auth.is_admin_email(&email) {
        Role::Admin
    } else {
        Role::Default
    };
    let user = users::sign_in(&state.db, &email, name.as_deref(), initial_role).await?;

    request.extensions_mut().insert(CurrentUser::from(user));
    Ok(next.run(request).await)
}
