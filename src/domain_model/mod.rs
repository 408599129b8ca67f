mod identity;
mod session;
mod subject;
mod token;

pub use identity::*;
pub use session::*;
pub use subject::*;
pub use token::*;
