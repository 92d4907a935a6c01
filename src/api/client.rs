//! The API client: token lifecycle, request dispatch, error classification.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::api::executor::{
    HttpExecutor, HttpRequest, Method, Params, ReqwestExecutor, DEFAULT_TIMEOUT,
};
use crate::api::response::Response;
use crate::error::{Error, Result};
use crate::oauth::authorize::{build_authentication_url, Display, Scope};
use crate::oauth::signature::{stringify_scalar, RequestSigner, SIGNATURE_FIELD, TOKEN_FIELD};
use crate::oauth::token::{TokenPayload, TokenState};

/// Production API host.
pub const PRODUCTION_HOST: &str = "https://api.rabota.ru";

/// Demo host usable as a sandbox during development.
pub const SANDBOX_HOST: &str = "https://api.neptune.rabota.space";

/// Header carrying the bearer token on authenticated requests. The token
/// rides out of band; it is never a body or query parameter.
const TOKEN_HEADER: &str = "X-Token";

const TOKEN_ENDPOINT: &str = "/oauth/token.json";
const REFRESH_ENDPOINT: &str = "/oauth/refresh-token.json";
const LOGOUT_ENDPOINT: &str = "/oauth/logout.json";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Client for the job-board API.
///
/// Owns the application credentials and the in-memory [`TokenState`], and
/// orchestrates every exchange: authorization URL construction, token
/// acquisition and refresh, signed dispatch, and error classification.
/// Mutating operations take `&mut self`, which keeps token handling strictly
/// sequential; wrap the client in your own mutex or actor if you share it
/// across tasks.
pub struct ApiClient {
    app_id: String,
    signer: RequestSigner,
    base_url: String,
    state: TokenState,
    executor: Arc<dyn HttpExecutor>,
}

impl ApiClient {
    /// Creates a client with the default transport and a previously
    /// persisted token state (use [`TokenState::default`] when there is
    /// none). Fails with [`Error::Configuration`] when the transport cannot
    /// be built.
    pub fn new(
        app_id: impl Into<String>,
        secret: impl Into<String>,
        initial: TokenState,
    ) -> Result<Self> {
        let executor: Arc<dyn HttpExecutor> = Arc::new(ReqwestExecutor::new(DEFAULT_TIMEOUT)?);
        Ok(Self::with_executor(app_id, secret, initial, executor))
    }

    /// Creates a client around a caller-supplied transport. This is the hook
    /// for tests and for embedders with their own HTTP stack or timeout
    /// policy.
    pub fn with_executor(
        app_id: impl Into<String>,
        secret: impl Into<String>,
        initial: TokenState,
        executor: Arc<dyn HttpExecutor>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            signer: RequestSigner::new(secret),
            base_url: PRODUCTION_HOST.to_string(),
            state: initial,
            executor,
        }
    }

    /// Points subsequent requests at the default sandbox host.
    pub fn set_sandbox(&mut self) {
        self.base_url = SANDBOX_HOST.to_string();
    }

    /// Points subsequent requests at a custom host.
    pub fn set_sandbox_host(&mut self, host: impl Into<String>) {
        self.base_url = host.into();
    }

    /// Points subsequent requests back at production.
    pub fn switch_prod(&mut self) {
        self.base_url = PRODUCTION_HOST.to_string();
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }

    pub fn expires_at(&self) -> Option<u64> {
        self.state.expires_at()
    }

    /// Replaces the held token, leaving the expiry alone.
    pub fn set_token(&mut self, access_token: impl Into<String>) {
        self.state.set_token(access_token);
    }

    /// The full token state, for the caller to persist.
    pub fn token_state(&self) -> &TokenState {
        &self.state
    }

    /// Whether the held token's expiry has passed. An absent expiry reads as
    /// not expired; check [`ApiClient::token`] separately for presence.
    pub fn is_expired(&self) -> bool {
        self.state.is_expired(unix_now())
    }

    /// Where to send the user so they can approve this application. Pure URL
    /// construction; nothing is sent anywhere.
    pub fn authentication_url(
        &self,
        redirect_uri: &str,
        display: Display,
        scopes: &[Scope],
    ) -> String {
        build_authentication_url(&self.base_url, &self.app_id, redirect_uri, display, scopes)
    }

    /// Exchanges an authorization code for an access token and stores it.
    ///
    /// A 200 response whose body does not decode is an
    /// [`Error::TokenAcquisition`] failure; a decodable response without an
    /// `access_token` field leaves the local state alone.
    pub async fn request_token(&mut self, code: &str) -> Result<TokenPayload> {
        let mut parameters = Params::new();
        parameters.insert("code".to_string(), json!(code));
        parameters.insert("app_id".to_string(), Value::String(self.app_id.clone()));

        let envelope = self
            .fetch(TOKEN_ENDPOINT, parameters, Method::Post, true)
            .await?;

        let Some(decoded) = envelope.json().cloned() else {
            return Err(Error::TokenAcquisition { response: envelope });
        };
        let payload: TokenPayload = match serde_json::from_value(decoded) {
            Ok(payload) => payload,
            Err(_) => return Err(Error::TokenAcquisition { response: envelope }),
        };

        self.store_payload(&payload);
        Ok(payload)
    }

    /// Performs one API call.
    ///
    /// A held-but-expired token is refreshed first. With `signed` set, a
    /// `time` parameter and the computed `signature` are injected before
    /// dispatch. The current token always travels as the `X-Token` header.
    pub async fn fetch(
        &mut self,
        endpoint: &str,
        parameters: Params,
        method: Method,
        signed: bool,
    ) -> Result<Response> {
        if self.state.token().is_some() && self.is_expired() {
            self.refresh_token().await?;
        }

        let mut parameters = parameters;
        if signed {
            parameters.insert("time".to_string(), json!(unix_now()));
            let signature = self.signer.sign(&parameters);
            parameters.insert(SIGNATURE_FIELD.to_string(), Value::String(signature));
        }

        self.request(endpoint, parameters, method).await
    }

    /// Trades the current token for a fresh one.
    ///
    /// Safe to call with a stale or absent token; the server decides. On
    /// success the new token and recomputed expiry replace the old pair.
    pub async fn refresh_token(&mut self) -> Result<TokenPayload> {
        debug!("refreshing access token");

        let mut parameters = Params::new();
        parameters.insert("time".to_string(), json!(unix_now()));
        parameters.insert(
            TOKEN_FIELD.to_string(),
            json!(self.state.token().unwrap_or_default()),
        );
        parameters.insert("app_id".to_string(), Value::String(self.app_id.clone()));
        let signature = self.signer.sign(&parameters);
        parameters.insert(SIGNATURE_FIELD.to_string(), Value::String(signature));

        let envelope = self
            .perform(REFRESH_ENDPOINT, &parameters, Method::Post)
            .await?;
        let payload: TokenPayload = envelope
            .json()
            .and_then(|decoded| serde_json::from_value(decoded.clone()).ok())
            .unwrap_or_default();

        self.store_payload(&payload);
        Ok(payload)
    }

    /// Ends the session server-side, then drops the local token.
    ///
    /// State is cleared only once the call has gone through; if the request
    /// fails the token stays put and the error propagates, so the caller can
    /// retry or persist whatever is still held.
    pub async fn logout(&mut self) -> Result<()> {
        let mut parameters = Params::new();
        parameters.insert(
            "access_token".to_string(),
            json!(self.state.token().unwrap_or_default()),
        );
        self.fetch(LOGOUT_ENDPOINT, parameters, Method::Get, false)
            .await?;
        self.state.clear();
        Ok(())
    }

    fn store_payload(&mut self, payload: &TokenPayload) {
        if let Some(access_token) = &payload.access_token {
            let lifetime = payload.expires_in.unwrap_or(0);
            self.state.store(access_token.clone(), unix_now() + lifetime);
        }
    }

    /// One API call with the bounded retry after a token refresh.
    async fn request(
        &mut self,
        endpoint: &str,
        parameters: Params,
        method: Method,
    ) -> Result<Response> {
        let mut refreshed = false;
        loop {
            match self.perform(endpoint, &parameters, method).await {
                Err(Error::Api { code, .. }) if code == "invalid_token" && !refreshed => {
                    // One shot only. A server that keeps rejecting the
                    // refreshed token must not trap us in a loop.
                    warn!("token rejected, refreshing and retrying once");
                    self.refresh_token().await?;
                    refreshed = true;
                }
                outcome => return outcome,
            }
        }
    }

    /// Exactly one round trip, plus classification of a non-200 answer.
    async fn perform(
        &mut self,
        endpoint: &str,
        parameters: &Params,
        method: Method,
    ) -> Result<Response> {
        let envelope = self.round_trip(endpoint, parameters, method).await?;
        if envelope.status() == 200 {
            // A 200 is a success whatever the body holds; callers inspect
            // `json()` themselves.
            return Ok(envelope);
        }

        let (code, description) = classify(&envelope);
        if code == "undefined_token" {
            // The server no longer knows this token. Drop it locally and
            // let the caller send the user back through authorization.
            self.state.clear();
        }
        Err(Error::Api {
            code,
            description,
            response: Some(envelope),
        })
    }

    /// Builds the outgoing request and executes it.
    async fn round_trip(
        &self,
        endpoint: &str,
        parameters: &Params,
        method: Method,
    ) -> Result<Response> {
        let (path, merged) = merge_endpoint_parameters(endpoint, parameters);
        let base = format!("{}{}", self.base_url, path);
        let query = encode_parameters(&merged);

        let (url, body) = match method {
            Method::Get => {
                let url = if query.is_empty() {
                    base
                } else {
                    format!("{base}?{query}")
                };
                (url, None)
            }
            Method::Post => (base, Some(query)),
            other => return Err(Error::UnsupportedMethod(other.as_str().to_string())),
        };

        let mut headers = Vec::new();
        if let Some(token) = self.state.token() {
            headers.push((TOKEN_HEADER.to_string(), token.to_string()));
        }
        if body.is_some() {
            headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
        }

        debug!("{} {}", method.as_str(), url);
        let raw = self
            .executor
            .execute(HttpRequest {
                method,
                url: url.clone(),
                headers,
                body,
            })
            .await?;

        Ok(Response::new(url, merged, raw))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Splits a literal query string off the endpoint path and folds its
/// parameters into the set. Keys the path already carries win over explicit
/// duplicates; everything else extends the set.
fn merge_endpoint_parameters(endpoint: &str, parameters: &Params) -> (String, Params) {
    let Some((path, query)) = endpoint.split_once('?') else {
        return (endpoint.to_string(), parameters.clone());
    };

    let mut merged: Params = form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    for (key, value) in parameters {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    (path.to_string(), merged)
}

/// Form-urlencodes the parameter set. Nested values flatten to the bracketed
/// `key[sub]` convention; nulls are omitted entirely.
fn encode_parameters(parameters: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in parameters {
        flatten_parameter(key, value, &mut pairs);
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn flatten_parameter(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (sub, nested) in map {
                flatten_parameter(&format!("{key}[{sub}]"), nested, pairs);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_parameter(&format!("{key}[{index}]"), nested, pairs);
            }
        }
        Value::Null => {}
        scalar => pairs.push((key.to_string(), stringify_scalar(scalar))),
    }
}

/// Pulls the error code and description out of a failed exchange.
///
/// Two body shapes exist in the wild: `{error, description}` with the code
/// under `error`, and the alternate `{code, error}` with the description
/// under `error`. Anything else falls back to the HTTP status as the code.
fn classify(envelope: &Response) -> (String, String) {
    if let Some(decoded) = envelope.json() {
        if let (Some(error), Some(description)) =
            (field(decoded, "error"), field(decoded, "description"))
        {
            return (error, description);
        }
        if let (Some(code), Some(error)) = (field(decoded, "code"), field(decoded, "error")) {
            return (code, error);
        }
    }
    (envelope.status().to_string(), "unknown error".to_string())
}

fn field(decoded: &Value, name: &str) -> Option<String> {
    decoded.get(name).map(|value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}
