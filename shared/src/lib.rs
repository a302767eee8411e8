//! Shared types and report aggregation for the FAPECAFES reporting platform
//!
//! This crate contains the upstream data model and the pure aggregation
//! logic shared between the report gateway and the browser (via WASM).

#[macro_use]
mod macros;

pub mod accounting;
pub mod filter;
pub mod models;
pub mod owners;
pub mod stats;
pub mod types;
pub mod validation;

pub use accounting::*;
pub use filter::*;
pub use models::*;
pub use owners::*;
pub use stats::*;
pub use types::*;
pub use validation::*;
