pub(crate) mod authorize;
pub(crate) mod signature;
pub(crate) mod token;

pub use authorize::{Display, Scope, DEFAULT_SCOPES};
pub use signature::RequestSigner;
pub use token::{TokenPayload, TokenState};
