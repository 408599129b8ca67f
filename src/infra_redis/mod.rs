mod rotation_store_redis;

pub use rotation_store_redis::*;
