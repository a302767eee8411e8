//! Domain models mirrored from the cooperative's REST backend

mod activity;
mod lot;
mod organization;
mod process;
mod sample;

pub use activity::*;
pub use lot::*;
pub use organization::*;
pub use process::*;
pub use sample::*;
