mod rotation_store_memory;

pub use rotation_store_memory::*;
