use axum::http::{HeaderMap, HeaderValue};
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id kept as-is; anything longer is replaced.
pub const MAX_REQUEST_ID_LEN: usize = 128;

fn incoming_request_id(headers: &HeaderMap) -> Option<HeaderValue> {
    let value = headers.get(REQUEST_ID_HEADER)?;
    let text = value.to_str().ok()?.trim();
    if text.is_empty() || text.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    HeaderValue::from_str(text).ok()
}

fn minted_request_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

/// Tags every request with an `x-request-id` and echoes it on the response.
///
/// A usable incoming id is kept; a missing, blank or oversized one is
/// replaced with a fresh UUID so log lines stay correlatable.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = incoming_request_id(req.headers()).unwrap_or_else(minted_request_id);
    req.headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|headers: HeaderMap| async move {
                    headers
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                }),
            )
            .layer(from_fn(request_id_middleware))
    }

    async fn send(request_id: Option<&str>) -> (String, String) {
        let mut builder = HttpRequest::builder().uri("/echo");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let echoed = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (echoed, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn keeps_incoming_request_id() {
        let (echoed, seen_by_handler) = send(Some("req-42")).await;
        assert_eq!(echoed, "req-42");
        assert_eq!(seen_by_handler, "req-42");
    }

    #[tokio::test]
    async fn mints_request_id_when_missing() {
        let (echoed, seen_by_handler) = send(None).await;
        assert!(Uuid::parse_str(&echoed).is_ok());
        assert_eq!(echoed, seen_by_handler);
    }

    #[tokio::test]
    async fn replaces_blank_request_id() {
        let (echoed, _) = send(Some("   ")).await;
        assert!(Uuid::parse_str(&echoed).is_ok());
    }

    #[tokio::test]
    async fn replaces_oversized_request_id() {
        let oversized = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        let (echoed, seen_by_handler) = send(Some(&oversized)).await;
        assert!(Uuid::parse_str(&echoed).is_ok());
        assert_eq!(echoed, seen_by_handler);
    }
}
