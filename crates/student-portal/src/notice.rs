//! Flash-style notices.
//!
//! A notice raised while rendering a page is shown inline. A notice raised
//! before a redirect travels in the `portal_notice` cookie, signed with the
//! configured secret key, and is shown and cleared by the next page view.

use crate::error::PortalError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    response::{IntoResponseParts, ResponseParts},
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

type NoticeMac = Hmac<Sha256>;

/// Name of the cookie carrying a pending notice.
pub const NOTICE_COOKIE: &str = "portal_notice";

const CLEAR_NOTICE_COOKIE: &str = "portal_notice=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax";

/// Severity of a notice, also used as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Danger,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Danger => "danger",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(NoticeLevel::Success),
            "danger" => Some(NoticeLevel::Danger),
            _ => None,
        }
    }
}

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Danger,
            message: message.into(),
        }
    }
}

/// Signs and verifies notice cookies.
#[derive(Clone)]
pub struct NoticeSigner {
    key: Arc<SecretString>,
}

impl NoticeSigner {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            key: Arc::new(SecretString::new(secret_key.into())),
        }
    }

    fn mac(&self, level: NoticeLevel, message: &str) -> NoticeMac {
        let mut mac = NoticeMac::new_from_slice(self.key.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(level.as_str().as_bytes());
        mac.update(b"|");
        mac.update(message.as_bytes());
        mac
    }

    /// Encode a notice as a cookie value: `level|message|signature`.
    pub fn encode(&self, notice: &Notice) -> String {
        let tag = self.mac(notice.level, &notice.message).finalize().into_bytes();
        format!(
            "{}|{}|{}",
            notice.level.as_str(),
            urlencoding::encode(&notice.message),
            hex::encode(tag)
        )
    }

    /// Decode a cookie value, rejecting anything not signed with our key.
    pub fn decode(&self, value: &str) -> Option<Notice> {
        let mut parts = value.splitn(3, '|');
        let level = NoticeLevel::parse(parts.next()?)?;
        let message = urlencoding::decode(parts.next()?).ok()?.into_owned();
        let signature = hex::decode(parts.next()?).ok()?;

        if self.mac(level, &message).verify_slice(&signature).is_err() {
            warn!("Discarding notice cookie with bad signature");
            return None;
        }

        Some(Notice { level, message })
    }

    /// `Set-Cookie` value carrying `notice` to the next page view.
    pub fn set_cookie(&self, notice: &Notice) -> Result<HeaderValue, PortalError> {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            NOTICE_COOKIE,
            self.encode(notice)
        );
        HeaderValue::from_str(&cookie)
            .map_err(|e| PortalError::Internal(format!("Invalid notice cookie: {}", e)))
    }
}

impl std::fmt::Debug for NoticeSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeSigner").finish_non_exhaustive()
    }
}

fn notice_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| pair.trim().strip_prefix(NOTICE_COOKIE)?.strip_prefix('='))
}

/// The notice left by the previous response, if any.
///
/// As a response part it clears the cookie it was read from.
#[derive(Debug, Default)]
pub struct PendingNotice {
    notice: Option<Notice>,
    had_cookie: bool,
}

impl PendingNotice {
    pub fn from_headers(headers: &HeaderMap, signer: &NoticeSigner) -> Self {
        match notice_cookie(headers) {
            Some(value) => Self {
                notice: signer.decode(value),
                had_cookie: true,
            },
            None => Self::default(),
        }
    }

    /// Take the pending notice for rendering.
    pub fn take(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// The pending notice followed by `extra`, in display order.
    pub fn take_with(&mut self, extra: impl IntoIterator<Item = Notice>) -> Vec<Notice> {
        self.take().into_iter().chain(extra).collect()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PendingNotice
where
    NoticeSigner: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let signer = NoticeSigner::from_ref(state);
        Ok(Self::from_headers(&parts.headers, &signer))
    }
}

impl IntoResponseParts for PendingNotice {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.had_cookie {
            debug!("Clearing consumed notice cookie");
            res.headers_mut()
                .append(SET_COOKIE, HeaderValue::from_static(CLEAR_NOTICE_COOKIE));
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_encode_decode() {
        let signer = NoticeSigner::new("secret");
        let notice = Notice::success("Registration successful!");

        let value = signer.encode(&notice);
        assert!(value.starts_with("success|Registration%20successful%21|"));
        assert_eq!(signer.decode(&value), Some(notice));
    }

    #[test]
    fn test_decode_rejects_tampered_message() {
        let signer = NoticeSigner::new("secret");
        let value = signer.encode(&Notice::success("Registration successful!"));
        let tampered = value.replace("successful", "failed");

        assert_eq!(signer.decode(&tampered), None);
    }

    #[test]
    fn test_decode_rejects_other_key() {
        let value = NoticeSigner::new("one").encode(&Notice::danger("nope"));
        assert_eq!(NoticeSigner::new("two").decode(&value), None);
    }

    #[test]
    fn test_decode_rejects_truncated_signature() {
        let signer = NoticeSigner::new("secret");
        let value = signer.encode(&Notice::success("Done"));
        let truncated = &value[..value.len() - 2];

        assert_eq!(signer.decode(truncated), None);
    }

    #[test]
    fn test_signature_is_hmac_sha256() {
        let signer = NoticeSigner::new("secret");
        let value = signer.encode(&Notice::success("Done"));
        let signature = value.rsplit('|').next().unwrap();

        let mut mac = NoticeMac::new_from_slice(b"secret").unwrap();
        mac.update(b"success|Done");
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let signer = NoticeSigner::new("secret");
        assert_eq!(signer.decode(""), None);
        assert_eq!(signer.decode("info|hello|abc"), None);
        assert_eq!(signer.decode("success|hello"), None);
    }

    #[test]
    fn test_pending_notice_from_cookie_header() {
        let signer = NoticeSigner::new("secret");
        let value = signer.encode(&Notice::success("Registration successful!"));
        let headers = headers_with_cookie(&format!("theme=dark; {}={}", NOTICE_COOKIE, value));

        let mut pending = PendingNotice::from_headers(&headers, &signer);
        assert!(pending.had_cookie);
        assert_eq!(pending.take(), Some(Notice::success("Registration successful!")));
        assert_eq!(pending.take(), None);
    }

    #[test]
    fn test_pending_notice_without_cookie() {
        let signer = NoticeSigner::new("secret");
        let headers = headers_with_cookie("theme=dark");

        let mut pending = PendingNotice::from_headers(&headers, &signer);
        assert!(!pending.had_cookie);
        assert_eq!(pending.take_with([Notice::danger("x")]), vec![Notice::danger("x")]);
    }

    #[test]
    fn test_set_cookie_header() {
        let signer = NoticeSigner::new("secret");
        let header = signer.set_cookie(&Notice::success("Done")).unwrap();
        let header = header.to_str().unwrap();

        assert!(header.starts_with("portal_notice=success|Done|"));
        assert!(header.contains("HttpOnly"));
    }

    #[test]
    fn test_signer_debug_hides_key() {
        let signer = NoticeSigner::new("very-secret");
        assert!(!format!("{:?}", signer).contains("very-secret"));
    }
}
