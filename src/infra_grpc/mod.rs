mod authority_client_grpc;
pub mod proto;

pub use authority_client_grpc::*;
