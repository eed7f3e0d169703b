use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use std::future::{Ready, ready};

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::RequestIdExt;

/// Bearer credential issued by the external auth layer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Per-request caller context handed to every backend call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub credential: Credential,
    pub locale: String,
    pub correlation_id: Option<String>,
}

/// First language tag of an `Accept-Language` header, without weight.
fn preferred_locale(header: &str) -> Option<String> {
    header
        .split(',')
        .next()
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .map(str::to_string)
}

impl FromRequest for RequestContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        let Some(token) = token else {
            return ready(Err(AppError::Unauthorized));
        };

        let default_locale = req
            .app_data::<Data<Config>>()
            .map(|config| config.default_locale.clone())
            .unwrap_or_else(|| "en".to_string());

        let locale = req
            .headers()
            .get("Accept-Language")
            .and_then(|h| h.to_str().ok())
            .and_then(preferred_locale)
            .unwrap_or(default_locale);

        ready(Ok(RequestContext {
            credential: Credential::new(token),
            locale,
            correlation_id: req.correlation_id(),
        }))
    }
}
