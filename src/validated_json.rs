//! Axum extractor that deserialises and validates JSON

use crate::error::SwotVisError;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Json},
    http::Request,
};
use serde::de::DeserializeOwned;

/// A type that is built from a loosely typed JSON payload by validating it.
pub trait Validated: Sized {
    /// The shape accepted from the wire.
    type Raw: DeserializeOwned;

    /// Validate the raw payload.
    fn validated(raw: Self::Raw) -> Result<Self, SwotVisError>;
}

/// An axum extractor based on the Json extractor that also performs validation of the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: Validated,
    S: Send + Sync,
    Json<T::Raw>: FromRequest<S, B, Rejection = JsonRejection>,
    B: Send + 'static,
{
    type Rejection = SwotVisError;

    /// Extract a `ValidatedJson` from a `Request`.
    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<T::Raw>::from_request(req, state).await?;
        Ok(ValidatedJson(T::validated(raw)?))
    }
}

#[cfg(test)]
mod tests {
    // https://github.com/tokio-rs/axum/blob/main/examples/testing/src/main.rs

    use super::*;
    use crate::models::{SampleError, SeriesCollection};
    use axum::{
        body::Body,
        http::{self, Request, StatusCode},
        response::Response,
        routing::post,
        Router,
    };
    use regex::Regex;
    use serde::Deserialize;
    use tower::ServiceExt; // for `oneshot` and `ready`

    #[derive(Deserialize)]
    struct TestRaw {
        pub foo: String,
        pub bar: Option<u32>,
    }

    struct TestPayload {
        pub foo: String,
        pub bar: Option<u32>,
    }

    impl Validated for TestPayload {
        type Raw = TestRaw;

        fn validated(raw: Self::Raw) -> Result<Self, SwotVisError> {
            if raw.foo.is_empty() || raw.foo.len() > 3 {
                return Err(SwotVisError::Validation {
                    pass: 0,
                    node: 0,
                    source: SampleError::NotAString {
                        field: "foo",
                        value: format!("{:?}", raw.foo),
                    },
                });
            }
            Ok(TestPayload {
                foo: raw.foo,
                bar: raw.bar,
            })
        }
    }

    // Handler function that accepts a ValidatedJson extractor.
    async fn test_handler(ValidatedJson(payload): ValidatedJson<TestPayload>) -> String {
        format!("foo: {} bar: {:?}", payload.foo, payload.bar)
    }

    async fn series_handler(ValidatedJson(series): ValidatedJson<SeriesCollection>) -> String {
        format!("passes: {} samples: {}", series.passes().len(), series.len())
    }

    // Build a router and make a oneshot request.
    async fn request(body: Body) -> Response {
        Router::new()
            .route("/", post(test_handler))
            .route("/series", post(series_handler))
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/")
                    .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn request_series(body: Body) -> Response {
        Router::new()
            .route("/series", post(series_handler))
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/series")
                    .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ok() {
        let body = Body::from(r#"{"foo": "abc", "bar": 123}"#);
        let response = request(body).await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert_eq!(&body[..], "foo: abc bar: Some(123)");
    }

    #[tokio::test]
    async fn invalid_json() {
        let body = Body::from("{\"");
        let response = request(body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r"Failed to parse the request body as JSON").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}")
    }

    #[tokio::test]
    async fn invalid_foo_type() {
        let body = Body::from(r#"{"foo": 123}"#);
        let response = request(body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*foo: invalid type: integer `123`.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}")
    }

    #[tokio::test]
    async fn invalid_foo_too_long() {
        let body = Body::from(r#"{"foo": "abcd"}"#);
        let response = request(body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*node 0 of pass 0 is not valid.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
        let re = Regex::new(r".*field `foo`: expected a string.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
    }

    #[tokio::test]
    async fn series_ok() {
        let body = Body::from(r#"[[], []]"#);
        let response = request_series(body).await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert_eq!(&body[..], "passes: 2 samples: 0");
    }

    #[tokio::test]
    async fn series_not_nested() {
        let body = Body::from(r#"[{"wse": "1.0"}]"#);
        let response = request_series(body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*request data is not valid.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
    }

    #[tokio::test]
    async fn series_missing_field() {
        let body = Body::from(r#"[[{"wse": "1.0"}]]"#);
        let response = request_series(body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*node 0 of pass 0 is not valid.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
        let re = Regex::new(r".*missing field `node_q`.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
    }
}
