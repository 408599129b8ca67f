mod rotation_store;

pub use rotation_store::*;
