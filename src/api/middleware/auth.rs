use crate::api::errors::{AppError, ErrorCode};
use crate::auth::AuthError;
use crate::database::models::UserDetail;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub user: UserDetail,
}

/// Token from an `Authorization` value; the scheme name is case-insensitive
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware that validates JWT token and adds user to request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from Authorization header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let Some(token) = token else {
        return Err(AppError::missing_auth_header());
    };

    let user = state.auth.authenticate(&token).await.map_err(|e| match e {
        AuthError::TokenExpired => AppError::new(ErrorCode::AuthTokenExpired, "Token expired"),
        AuthError::User(crate::database::UserError::UserNotFound(_)) => {
            AppError::new(ErrorCode::AuthInvalidToken, "Could not validate credentials")
        }
        AuthError::InvalidToken => {
            AppError::new(ErrorCode::AuthInvalidToken, "Could not validate credentials")
        }
        other => AppError::from(other),
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.user.id.clone(),
        user,
    });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("BEARER  abc.def "), Some("abc.def"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearerabc"), None);
    }
}
