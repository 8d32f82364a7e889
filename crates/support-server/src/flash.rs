//! One-shot notices carried across a redirect in a cookie.
//!
//! The cookie value is `<level>:<message>` with the message
//! `application/x-www-form-urlencoded`, which keeps it free of the
//! separators a cookie value may not contain.

use axum::http::{header, HeaderMap};
use url::form_urlencoded;

/// Name of the cookie holding a pending notice.
pub const FLASH_COOKIE: &str = "support_flash";

/// Presentation category of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Danger,
}

impl FlashLevel {
    /// The category name used in markup and in the cookie.
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Danger => "danger",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(FlashLevel::Success),
            "danger" => Some(FlashLevel::Danger),
            _ => None,
        }
    }
}

/// A notice shown once to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }

    /// Renders a `Set-Cookie` value that stores this notice.
    pub fn to_cookie(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.message.as_bytes()).collect();
        format!(
            "{FLASH_COOKIE}={}:{encoded}; Path=/; HttpOnly; SameSite=Lax",
            self.level.as_str()
        )
    }

    /// Reads a pending notice from the request's `Cookie` headers.
    ///
    /// Malformed values are ignored.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .and_then(|(_, value)| Self::decode(value))
    }

    fn decode(value: &str) -> Option<Self> {
        let (level, encoded) = value.split_once(':')?;
        let level = FlashLevel::parse(level)?;
        let message = form_urlencoded::parse(encoded.as_bytes())
            .next()
            .map(|(message, _)| message.into_owned())
            .unwrap_or_default();
        Some(Self { level, message })
    }
}

/// A `Set-Cookie` value that removes any pending notice.
pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
