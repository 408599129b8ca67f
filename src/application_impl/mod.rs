mod catalog_localizer;
mod jwt_codec;
mod remote_authority_fake;
mod rotation_ledger;
mod session_service_impl;
mod token_verifier_impl;

pub use catalog_localizer::*;
pub use jwt_codec::*;
pub use remote_authority_fake::*;
pub use rotation_ledger::*;
pub use session_service_impl::*;
pub use token_verifier_impl::*;
