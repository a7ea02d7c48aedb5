use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{app_error::AppError, app_state::AppState};

pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by admin bearer tokens. `sub` is the admin's id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Verifies the bearer token and exposes the admin id to handlers as an
/// `Extension<Uuid>`.
pub async fn admins_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token.".into()))?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|err| {
        tracing::debug!("Rejected bearer token: {}", err);
        AppError::Unauthorized("Invalid or expired token.".into())
    })?
    .claims;

    if claims.role != ADMIN_ROLE {
        return Err(AppError::ForbiddenResource("Access denied.".into()));
    }

    let admin_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".into()))?;

    req.extensions_mut().insert(admin_id);
    Ok(next.run(req).await)
}
