//! Identity Middleware
//!
//! The platform's gateway authenticates every request and forwards the
//! caller's identity in trusted headers; this middleware parses them
//! into an [`Actor`] extension. It never performs authentication itself.

use crate::domain::value_objects::{Actor, ActorRole};
use crate::error::UnlockError;
use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::id::UserId;
use uuid::Uuid;

/// Header carrying the authenticated user's UUID
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the authenticated user's role
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Parse the identity headers into an [`Actor`]
pub fn extract_actor(headers: &HeaderMap) -> Result<Actor, UnlockError> {
    let id_value = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| UnlockError::MissingHeader(ACTOR_ID_HEADER.to_string()))?;

    let user_id = id_value
        .parse::<Uuid>()
        .map_err(|_| UnlockError::Validation(format!("invalid {} header", ACTOR_ID_HEADER)))?;

    let role_value = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| UnlockError::MissingHeader(ACTOR_ROLE_HEADER.to_string()))?;

    let role = ActorRole::parse(role_value)
        .ok_or_else(|| UnlockError::Validation(format!("invalid {} header", ACTOR_ROLE_HEADER)))?;

    Ok(Actor::new(UserId::from_uuid(user_id), role))
}

/// Middleware that requires a forwarded identity on every route
pub async fn require_actor(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    let actor = match extract_actor(req.headers()) {
        Ok(actor) => actor,
        Err(e) => return Err(e.into_response()),
    };

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            map.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_actor_valid() {
        let uuid = Uuid::new_v4();
        let actor = extract_actor(&headers(Some(&uuid.to_string()), Some("admin"))).unwrap();
        assert_eq!(actor.user_id.into_uuid(), uuid);
        assert!(actor.role.is_admin());
    }

    #[test]
    fn test_extract_actor_missing_headers() {
        let uuid = Uuid::new_v4().to_string();

        let err = extract_actor(&headers(None, Some("admin"))).unwrap_err();
        assert!(matches!(err, UnlockError::MissingHeader(_)));

        let err = extract_actor(&headers(Some(&uuid), None)).unwrap_err();
        assert!(matches!(err, UnlockError::MissingHeader(_)));
    }

    #[test]
    fn test_extract_actor_malformed() {
        let err = extract_actor(&headers(Some("not-a-uuid"), Some("admin"))).unwrap_err();
        assert!(matches!(err, UnlockError::Validation(_)));

        let uuid = Uuid::new_v4().to_string();
        let err = extract_actor(&headers(Some(&uuid), Some("superuser"))).unwrap_err();
        assert!(matches!(err, UnlockError::Validation(_)));
    }
}
