mod client;
mod types;

pub use client::{BuildSource, BuildStatusClient};
pub use types::{BuildState, BuildStatus};
