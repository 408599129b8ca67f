//! Messages of `proto/auth.proto`, written out by hand so the build needs no
//! protoc.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckReqV1 {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
    /// `"access"` or `"refresh"`.
    #[prost(string, tag = "2")]
    pub r#type: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckRespV1 {
    #[prost(uint64, tag = "1")]
    pub uid: u64,
    #[prost(int32, tag = "2")]
    pub rid: i32,
    #[prost(string, tag = "3")]
    pub key: ::prost::alloc::string::String,
}

pub const CHECK_V1_PATH: &str = "/proto.AuthServiceV1/CheckV1";
