use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body that may be left out entirely.
///
/// An empty (or all-whitespace) body yields `T::default()`. Anything else must
/// parse as `T`, otherwise the request is answered with 400 `BAD_REQUEST`.
/// The content type is not checked, so clients posting bare JSON still work.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        parse_body(&bytes).map(OptionalJson)
    }
}

fn parse_body<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(bytes).map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Ttl {
        ttl_secs: Option<i64>,
    }

    #[test]
    fn test_empty_body_is_default() {
        assert_eq!(parse_body::<Ttl>(b"").unwrap(), Ttl::default());
        assert_eq!(parse_body::<Ttl>(b"  \n").unwrap(), Ttl::default());
    }

    #[test]
    fn test_valid_body_is_parsed() {
        assert_eq!(parse_body::<Ttl>(br#"{"ttl_secs": 60}"#).unwrap().ttl_secs, Some(60));
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        for body in [&br#"{"ttl_secs": "soon"}"#[..], &b"{"[..], &b"null"[..], &b"42"[..]] {
            let err = parse_body::<Ttl>(body).unwrap_err();
            assert_eq!(err.status_code(), 400, "body {:?}", String::from_utf8_lossy(body));
            assert_eq!(err.error_code(), "BAD_REQUEST");
        }
    }
}
