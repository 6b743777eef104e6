use serde::Deserialize;
use std::fmt;

/// Build state reported by the Travis API.
///
/// States outside the known set are kept verbatim in `Unknown` and
/// rendered as the raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Created,
    Starting,
    /// Build is actively running
    Started,
    Passed,
    Failed,
    Errored,
    Canceled,
    Queued,
    Unknown(String),
}

impl BuildState {
    pub fn parse(state: &str) -> Self {
        match state {
            "created" => Self::Created,
            "starting" => Self::Starting,
            "started" => Self::Started,
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "errored" => Self::Errored,
            "canceled" => Self::Canceled,
            "queued" => Self::Queued,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Status bar rendering of the state.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Passed => "passed ✔",
            Self::Created => "created",
            Self::Starting => "starting...",
            Self::Started => "building...",
            Self::Failed => "failed ✘",
            Self::Queued => "queued ◽\u{fe0f}",
            Self::Errored => "errored ⚠",
            Self::Canceled => "canceled \u{20e0}",
            Self::Unknown(raw) => raw,
        }
    }

    /// Everything except a running build is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Latest build for a branch. Both fields are `None` when no build was
/// found or the request failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStatus {
    pub state: Option<BuildState>,
    pub build_number: Option<String>,
}

impl BuildStatus {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Response body of `GET /repo/{slug}/builds`.
#[derive(Debug, Deserialize)]
pub struct BuildsResponse {
    pub builds: Vec<TravisBuild>,
}

#[derive(Debug, Deserialize)]
pub struct TravisBuild {
    pub state: String,
    pub number: String,
}

impl From<TravisBuild> for BuildStatus {
    fn from(build: TravisBuild) -> Self {
        Self {
            state: Some(BuildState::parse(&build.state)),
            build_number: Some(build.number),
        }
    }
}
