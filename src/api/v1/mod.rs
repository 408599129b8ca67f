mod error;
mod handler;
mod router;

pub use error::{ErrorBody, recover_error};
pub use handler::REQUEST_KEY_HEADER;
pub use router::{routes, with_identity};
