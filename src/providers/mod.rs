pub mod travis;

pub use travis::{BuildSource, BuildState, BuildStatus, BuildStatusClient};
