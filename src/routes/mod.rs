//! HTTP routes for auditdesk
//!
//! Each resource module exposes a `route` function that receives the path
//! segments after its prefix and returns either a JSON response or an
//! `AuditError`, which the server turns into the error body.

pub mod audits;
pub mod auth_routes;
pub mod dashboard;
pub mod health;
pub mod risks;
pub mod users;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::types::{AuditError, RecordId, Result};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response type produced by every handler
pub type ApiResponse = Response<Full<Bytes>>;

pub type HandlerResult = Result<ApiResponse>;

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> ApiResponse {
    let (status, payload) = match serde_json::to_vec(body) {
        Ok(payload) => (status, payload),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal server error","code":"internal_error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(payload)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn ok<T: Serialize>(body: &T) -> HandlerResult {
    Ok(json_response(StatusCode::OK, body))
}

pub fn created<T: Serialize>(body: &T) -> HandlerResult {
    Ok(json_response(StatusCode::CREATED, body))
}

/// Turn an error into its status code and JSON body
pub fn error_response(err: &AuditError) -> ApiResponse {
    json_response(err.status_code(), &err.to_body())
}

pub fn empty_response(status: StatusCode) -> ApiResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

pub fn auth_header<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Read and parse a JSON body of at most `limit` bytes.
///
/// An empty body parses as `{}` so optional-only inputs need no payload.
pub async fn read_json<T, B>(req: Request<B>, limit: usize) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let collected = Limited::new(req.into_body(), limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                AuditError::Validation(format!("Request body exceeds {limit} bytes"))
            } else {
                AuditError::Validation(format!("Failed to read request body: {e}"))
            }
        })?;

    let bytes = collected.to_bytes();
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Parse the query string into a filter struct
pub fn read_query<T, B>(req: &Request<B>) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_urlencoded::from_str(req.uri().query().unwrap_or(""))
        .map_err(|e| AuditError::Validation(format!("Invalid query parameters: {e}")))
}

/// Parse a numeric path segment
pub fn parse_id(segment: &str) -> Result<RecordId> {
    segment
        .parse::<RecordId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AuditError::Validation(format!("Invalid id: {segment}")))
}

pub fn route_not_found() -> AuditError {
    AuditError::NotFound("Route".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default)]
    struct Filter {
        year: Option<i32>,
        status: Option<String>,
    }

    fn request(body: &'static str) -> Request<Full<Bytes>> {
        Request::new(Full::new(Bytes::from_static(body.as_bytes())))
    }

    #[tokio::test]
    async fn test_read_json() {
        let value: serde_json::Value = read_json(request(r#"{"a":1}"#), 1024).await.unwrap();
        assert_eq!(value["a"], 1);

        let empty: serde_json::Value = read_json(request(""), 1024).await.unwrap();
        assert!(empty.as_object().unwrap().is_empty());

        let bad = read_json::<serde_json::Value, _>(request("{nope"), 1024).await;
        assert!(matches!(bad, Err(AuditError::Validation(_))));

        let big = read_json::<serde_json::Value, _>(request(r#"{"a":"0123456789"}"#), 8).await;
        assert!(matches!(big, Err(AuditError::Validation(m)) if m.contains("exceeds")));
    }

    #[test]
    fn test_read_query() {
        let req = Request::builder()
            .uri("/api/audits/plans?year=2026&status=draft")
            .body(())
            .unwrap();
        let filter: Filter = read_query(&req).unwrap();
        assert_eq!(filter.year, Some(2026));
        assert_eq!(filter.status.as_deref(), Some("draft"));

        let bare = Request::builder().uri("/x").body(()).unwrap();
        let filter: Filter = read_query(&bare).unwrap();
        assert!(filter.year.is_none());

        let bad = Request::builder().uri("/x?year=soon").body(()).unwrap();
        assert!(read_query::<Filter, _>(&bad).is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(parse_id("0").is_err());
        assert!(parse_id("abc").is_err());
    }

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&AuditError::MissingToken);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }
}
