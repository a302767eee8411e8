//! External API integrations

pub mod upstream;

pub use upstream::{Credentials, UpstreamClient};
