//! Client for the Rabota.ru job-board API.
//!
//! Handles the full bearer-token lifecycle (acquisition via authorization
//! code, refresh on expiry, invalidation on logout), signs requests with a
//! deterministic SHA-256 digest over the canonicalized parameter set, and
//! classifies JSON error responses into typed failures.
//!
//! Token persistence is deliberately left to the caller: seed
//! [`TokenState`] from your storage when constructing the [`ApiClient`],
//! and write [`ApiClient::token_state`] back after any call that may have
//! changed it.
//!
//! The HTTP transport sits behind the [`HttpExecutor`] trait.
//! [`ReqwestExecutor`] is the default; tests and embedders can supply their
//! own via [`ApiClient::with_executor`].

mod api;
mod error;
mod oauth;

pub use api::{
    ApiClient, HttpExecutor, HttpRequest, HttpResponse, Method, Params, ReqwestExecutor, Response,
    DEFAULT_TIMEOUT, PRODUCTION_HOST, SANDBOX_HOST,
};
pub use error::{Error, Result};
pub use oauth::{Display, RequestSigner, Scope, TokenPayload, TokenState, DEFAULT_SCOPES};
