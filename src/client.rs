//! Suite client: the fallback orchestrator callers talk to.
//!
//! Keep the public surface small and predictable. Implementation details are
//! split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod types;
mod validation;

pub use builder::SuiteClientBuilder;
pub use core::{preview, SuiteClient};
pub use types::GenerateResponse;
