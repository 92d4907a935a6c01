mod client;
mod executor;
mod response;

pub use client::{ApiClient, PRODUCTION_HOST, SANDBOX_HOST};
pub use executor::{
    HttpExecutor, HttpRequest, HttpResponse, Method, Params, ReqwestExecutor, DEFAULT_TIMEOUT,
};
pub use response::Response;
