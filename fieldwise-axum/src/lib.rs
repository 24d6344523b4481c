#![warn(missing_docs)]
//! Axum integration for fieldwise.
//!
//! [`Parsed<T>`] collects everything a request says about `T` into one
//! mapping and resolves it with the [`Engine`] found in the router state:
//!
//! - a JSON object body (`Content-Type: application/json`),
//! - query-string values, which override JSON keys,
//! - url-encoded form values (`Content-Type: application/x-www-form-urlencoded`),
//!   which override JSON keys but not query values.
//!
//! A key repeated within the query string or the form keeps its first value.
//!
//! ```ignore
//! use std::sync::Arc;
//! use axum::{Router, routing::post};
//! use fieldwise::{Engine, record};
//! use fieldwise_axum::Parsed;
//!
//! record! {
//!     struct NewUser {
//!         name: String,
//!         age: u32 = 18,
//!     }
//! }
//!
//! async fn create(Parsed(user): Parsed<NewUser>) -> String {
//!     format!("{} ({})", user.name, user.age)
//! }
//!
//! let app = Router::new()
//!     .route("/users", post(create))
//!     .with_state(Arc::new(Engine::new()));
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use axum_core::extract::{FromRef, FromRequest, Request};
use axum_core::response::{IntoResponse, Response};
use fieldwise::{Engine, Record};
use http::{StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Map, Value as JsonValue};

/// A record resolved from the request's query string, form body or JSON body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parsed<T>(pub T);

impl<T> Parsed<T> {
    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Parsed<T> {
    fn from(inner: T) -> Self {
        Parsed(inner)
    }
}

impl<T> Deref for Parsed<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Parsed<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Why a request could not be turned into a [`Parsed`] value.
#[derive(Debug)]
pub struct ParsedRejection {
    kind: ParsedRejectionKind,
}

#[derive(Debug)]
enum ParsedRejectionKind {
    /// Failed to buffer the request body.
    BodyError(axum_core::Error),
    /// The body is not valid UTF-8.
    InvalidUtf8,
    /// The body is declared as JSON but does not parse.
    InvalidJson(serde_json::Error),
    /// The JSON body is not an object.
    NotAnObject,
    /// The engine rejected the assembled mapping.
    Resolve(fieldwise::Error),
}

impl ParsedRejection {
    /// Returns the status code for this rejection.
    ///
    /// Unreadable input is a 400, input of the wrong shape is a 422, and a
    /// record declaration the engine cannot handle is a 500.
    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ParsedRejectionKind::BodyError(_)
            | ParsedRejectionKind::InvalidUtf8
            | ParsedRejectionKind::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ParsedRejectionKind::NotAnObject => StatusCode::UNPROCESSABLE_ENTITY,
            ParsedRejectionKind::Resolve(err) if err.is_data_defect() => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ParsedRejectionKind::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The engine's error, if resolution is what failed.
    pub fn resolve_error(&self) -> Option<&fieldwise::Error> {
        match &self.kind {
            ParsedRejectionKind::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ParsedRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParsedRejectionKind::BodyError(err) => write!(f, "Failed to read request body: {err}"),
            ParsedRejectionKind::InvalidUtf8 => write!(f, "Request body is not valid UTF-8"),
            ParsedRejectionKind::InvalidJson(err) => write!(f, "Invalid JSON body: {err}"),
            ParsedRejectionKind::NotAnObject => write!(f, "JSON body must be an object"),
            ParsedRejectionKind::Resolve(err) => write!(f, "Invalid input: {err}"),
        }
    }
}

impl std::error::Error for ParsedRejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParsedRejectionKind::BodyError(err) => Some(err),
            ParsedRejectionKind::InvalidJson(err) => Some(err),
            ParsedRejectionKind::Resolve(err) => Some(err),
            ParsedRejectionKind::InvalidUtf8 | ParsedRejectionKind::NotAnObject => None,
        }
    }
}

impl IntoResponse for ParsedRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%self, "record declaration cannot be resolved");
        } else {
            tracing::debug!(%status, %self, "rejecting request");
        }
        let body = self.to_string();
        (status, body).into_response()
    }
}

impl From<axum_core::Error> for ParsedRejection {
    fn from(err: axum_core::Error) -> Self {
        ParsedRejection {
            kind: ParsedRejectionKind::BodyError(err),
        }
    }
}

impl From<fieldwise::Error> for ParsedRejection {
    fn from(err: fieldwise::Error) -> Self {
        ParsedRejection {
            kind: ParsedRejectionKind::Resolve(err),
        }
    }
}

fn media_type(content_type: Option<&str>) -> Option<&str> {
    content_type.and_then(|ct| ct.split(';').next()).map(str::trim)
}

fn is_json(content_type: Option<&str>) -> bool {
    media_type(content_type)
        .is_some_and(|essence| essence == "application/json" || essence.ends_with("+json"))
}

fn is_form(content_type: Option<&str>) -> bool {
    media_type(content_type) == Some("application/x-www-form-urlencoded")
}

/// Adds url-encoded pairs to `into`, keeping the first value of a repeated key.
fn collect_pairs(encoded: &[u8], into: &mut Map<String, JsonValue>) {
    for (key, value) in form_urlencoded::parse(encoded) {
        into.entry(key.into_owned())
            .or_insert_with(|| JsonValue::String(value.into_owned()));
    }
}

/// Assembles the mapping a request describes.
///
/// `query` is the raw query string, `content_type` the request's
/// `Content-Type` header and `body` the buffered body.
pub fn mapping_from_request_parts(
    query: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Map<String, JsonValue>, ParsedRejection> {
    let mut mapping = Map::new();
    if is_json(content_type) && !body.is_empty() {
        let text = std::str::from_utf8(body).map_err(|_| ParsedRejection {
            kind: ParsedRejectionKind::InvalidUtf8,
        })?;
        let json = serde_json::from_str::<JsonValue>(text).map_err(|err| ParsedRejection {
            kind: ParsedRejectionKind::InvalidJson(err),
        })?;
        let JsonValue::Object(object) = json else {
            return Err(ParsedRejection {
                kind: ParsedRejectionKind::NotAnObject,
            });
        };
        mapping = object;
    }

    let mut overrides = Map::new();
    if let Some(query) = query {
        collect_pairs(query.as_bytes(), &mut overrides);
    }
    if is_form(content_type) {
        std::str::from_utf8(body).map_err(|_| ParsedRejection {
            kind: ParsedRejectionKind::InvalidUtf8,
        })?;
        collect_pairs(body, &mut overrides);
    }
    mapping.extend(overrides);
    Ok(mapping)
}

impl<T, S> FromRequest<S> for Parsed<T>
where
    T: Record + Send,
    S: Send + Sync,
    Arc<Engine>: FromRef<S>,
{
    type Rejection = ParsedRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let engine = Arc::<Engine>::from_ref(state);
        let (parts, body) = req.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(axum_core::Error::new)?
            .to_bytes();

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let mapping = mapping_from_request_parts(parts.uri.query(), content_type, &bytes)?;
        tracing::trace!(fields = mapping.len(), "resolving request mapping");

        let value = engine.from_mapping::<T>(&mapping)?;
        Ok(Parsed(value))
    }
}
