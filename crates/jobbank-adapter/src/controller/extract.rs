//! Request extractors: caller identity, cookie preferences, anti-forgery

use async_trait::async_trait;
use axum::extract::{Form, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::warn;
use uuid::Uuid;

use jobbank_domain::Role;
use jobbank_usecase::{Caller, PreferenceStore};

use super::CookieSettings;

/// Header carrying the authenticated user name
pub const USER_HEADER: &str = "x-jobbank-user";

/// Header carrying comma-separated role names
pub const ROLES_HEADER: &str = "x-jobbank-roles";

/// Cookie holding the anti-forgery token
pub const ANTI_FORGERY_COOKIE: &str = "jobbank.antiforgery";

/// Form field carrying the anti-forgery token
pub const ANTI_FORGERY_FIELD: &str = "__RequestVerificationToken";

/// Header alternative to the form field
pub const ANTI_FORGERY_HEADER: &str = "x-requestverificationtoken";

// ========== Identity ==========

/// The caller as asserted by the upstream identity proxy.
///
/// No user header means an anonymous caller; unknown role names are dropped.
#[derive(Debug, Clone)]
pub struct RequestCaller(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for RequestCaller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestCaller(caller_from_headers(&parts.headers)))
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let name = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let Some(name) = name else {
        return Caller::anonymous();
    };

    let roles = headers
        .get(ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .split(',')
        .filter_map(Role::parse);

    Caller::new(name, roles)
}

// ========== Preferences ==========

/// Cookie-backed [`PreferenceStore`]
#[derive(Debug, Clone)]
pub struct CookiePreferences {
    jar: CookieJar,
    settings: CookieSettings,
}

impl CookiePreferences {
    pub fn new(jar: CookieJar, settings: CookieSettings) -> Self {
        Self { jar, settings }
    }

    /// The jar including any cookies set, to return with the response
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl PreferenceStore for CookiePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|cookie| cookie.value().to_string())
    }

    fn set(&mut self, key: &str, value: String, lifetime: chrono::Duration) {
        let cookie = Cookie::build((key.to_string(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.settings.secure)
            .max_age(cookie::time::Duration::seconds(lifetime.num_seconds()));
        self.jar = self.jar.clone().add(cookie);
    }
}

// ========== Anti-forgery ==========

/// Reuse the caller's anti-forgery token, or mint a new one
pub fn issue_token(jar: CookieJar, settings: CookieSettings) -> (CookieJar, String) {
    if let Some(existing) = jar.get(ANTI_FORGERY_COOKIE) {
        let token = existing.value().to_string();
        return (jar, token);
    }

    let token = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((ANTI_FORGERY_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure);
    (jar.add(cookie), token)
}

#[derive(Debug, Deserialize)]
struct Submission<T> {
    #[serde(rename = "__RequestVerificationToken", default)]
    token: Option<String>,
    #[serde(flatten)]
    value: T,
}

/// A urlencoded form whose anti-forgery token matched the cookie
#[derive(Debug)]
pub struct AntiForgeryForm<T> {
    pub token: String,
    pub value: T,
}

#[async_trait]
impl<S, T> FromRequest<S> for AntiForgeryForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let expected = CookieJar::from_headers(req.headers())
            .get(ANTI_FORGERY_COOKIE)
            .map(|cookie| cookie.value().to_string());
        let from_header = req
            .headers()
            .get(ANTI_FORGERY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let Form(submission) = Form::<Submission<T>>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let presented = submission.token.or(from_header);
        match (expected, presented) {
            (Some(expected), Some(presented)) if !expected.is_empty() && expected == presented => {
                Ok(AntiForgeryForm {
                    token: expected,
                    value: submission.value,
                })
            }
            _ => {
                warn!("Rejected submission with a missing or mismatched anti-forgery token");
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "The anti-forgery token is missing or invalid." })),
                )
                    .into_response())
            }
        }
    }
}
