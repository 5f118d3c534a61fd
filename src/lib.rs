pub mod config;
pub mod download;
mod error;
pub mod models;
pub mod optimize;
pub mod placement;
pub mod ratelimit;
pub mod rank;
pub mod search;
pub mod sources;
pub mod validate;

pub use error::{ImageError, Result};
