mod auth_gate;
mod bearer;

pub use auth_gate::*;
pub use bearer::*;
