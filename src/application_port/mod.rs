mod auth_error;
mod localizer;
mod remote_authority;
mod session_service;
mod token_service;
mod token_verifier;

pub use auth_error::*;
pub use localizer::*;
pub use remote_authority::*;
pub use session_service::*;
pub use token_service::*;
pub use token_verifier::*;
