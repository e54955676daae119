//! Integration tests with mock HTTP server

pub mod adapters;
pub mod mock_server;
pub mod routes;
