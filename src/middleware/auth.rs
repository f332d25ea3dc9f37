use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const INSTRUCTOR_ROLES: &[&str] = &["instructor", "admin"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        let role = self.role.as_deref().unwrap_or_default();
        allowed.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_claims(req: &Request) -> Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))
}

/// Any signed-in user: learners taking quizzes, instructors, admins.
pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    match bearer_claims(&req) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(response) => response,
    }
}

/// Quiz and lesson authoring is limited to instructors and admins.
pub async fn require_instructor(mut req: Request, next: Next) -> Response {
    let claims = match bearer_claims(&req) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    if !claims.has_any_role(INSTRUCTOR_ROLES) {
        tracing::warn!(sub = %claims.sub, "non-instructor attempted an authoring route");
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}
