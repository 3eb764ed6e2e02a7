//! Bearer check in front of the model endpoints.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::ProxyAuth;
use crate::error::ProxyError;

/// Audience Supabase puts on tokens of signed-in users.
pub const SUPABASE_AUDIENCE: &str = "authenticated";

/// Claims of a Supabase access token that the proxy cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub role: Option<String>,
}

fn bearer(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn verify_supabase_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

pub async fn require_proxy_auth(
    State(auth): State<ProxyAuth>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ProxyError> {
    match &auth {
        ProxyAuth::Open => {}
        ProxyAuth::ApiKey(expected) => {
            if bearer(&req) != Some(expected.as_str()) {
                return Err(ProxyError::Unauthorized);
            }
        }
        ProxyAuth::SupabaseJwt { secret } => {
            let token = bearer(&req).ok_or(ProxyError::Unauthorized)?;
            let claims = verify_supabase_token(token, secret).map_err(|err| {
                tracing::warn!(error = %err, "Rejected access token");
                ProxyError::Unauthorized
            })?;
            tracing::debug!(user_id = %claims.sub, "Authenticated caller");
            req.extensions_mut().insert(claims);
        }
    }

    Ok(next.run(req).await)
}
