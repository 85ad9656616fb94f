//! Lenient extractors for form bodies and query strings.
//!
//! Missing or repeated fields never reject the request: absent keys read as
//! empty and the first occurrence of a key wins.

use super::types::{ConfirmationQuery, RegistrationForm};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
    Form,
};
use std::convert::Infallible;
use tracing::debug;

fn is_urlencoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

#[async_trait]
impl<S> FromRequest<S> for RegistrationForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_urlencoded_form(req.headers()) {
            debug!("Registration body is not a urlencoded form, reading no fields");
            return Ok(Self::default());
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        Ok(Self::from_pairs(pairs))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ConfirmationQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
            Ok(Query(pairs)) => pairs,
            Err(e) => {
                debug!(error = %e, "Unreadable confirmation query, using empty fields");
                Vec::new()
            }
        };

        Ok(Self::from_pairs(pairs))
    }
}
