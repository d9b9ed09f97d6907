use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;
use tracing::warn;

const CHALLENGE: &str = "Basic realm=\"media-gallery\"";

/// HTTP Basic authentication against the configured single user.
///
/// Passes every request through when no password is configured.
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(password) = state.config.auth_password.as_deref() else {
        return next.run(req).await;
    };

    let authorized = parse_basic_credentials(req.headers())
        .map(|(user, pass)| {
            // Evaluate both comparisons so a wrong username costs the same as a wrong password
            let user_ok = user.as_bytes().ct_eq(state.config.auth_username.as_bytes());
            let pass_ok = pass.as_bytes().ct_eq(password.as_bytes());
            bool::from(user_ok & pass_ok)
        })
        .unwrap_or(false);

    if authorized {
        return next.run(req).await;
    }

    warn!("🔒 Rejected unauthenticated {} {}", req.method(), req.uri());
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, CHALLENGE)],
    )
        .into_response()
}

fn parse_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
