//! HTTP transport shared by the provider adapters.

pub mod http;

pub use http::{Auth, HttpTransport, RawResponse, ResponseMetadata, TransportError};
