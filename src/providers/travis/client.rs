use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, TravisStatusError};
use crate::repo::RepoInfo;

use super::types::{BuildStatus, BuildsResponse};

const API_VERSION_HEADER: &str = "Travis-API-Version";
const API_VERSION: &str = "3";
const REQUEST_TIMEOUT_SECONDS: u64 = 5;

/// Source of the latest build for a resolved repository and branch.
#[allow(async_fn_in_trait)]
pub trait BuildSource {
    async fn latest_build(&self, base_url: &str, token: &Token, repo: &RepoInfo) -> BuildStatus;
}

/// Fetches the latest build of a branch from the Travis v3 API.
pub struct BuildStatusClient {
    client: Client,
}

impl BuildStatusClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("travis-status/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| TravisStatusError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Construct `{base}/repo/{slug}/builds?limit=1&branch.name={branch}`.
    ///
    /// The slug is percent-encoded as a single path segment, `/` included.
    /// A path prefix on the base (`https://host/api`) is kept with or
    /// without a trailing slash.
    pub fn builds_url(base_url: &str, repository_id: &str, branch: &str) -> Result<Url> {
        let mut base = Url::parse(base_url)
            .map_err(|e| TravisStatusError::Config(format!("Invalid API base URL: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(&format!("repo/{}/builds", urlencoding::encode(repository_id)))
            .map_err(|e| TravisStatusError::Config(format!("Invalid builds URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("limit", "1")
            .append_pair("branch.name", branch);

        Ok(url)
    }

    async fn fetch_latest(
        &self,
        url: &Url,
        token: &Token,
        repository_id: &str,
        branch: &str,
    ) -> Result<BuildStatus> {
        let response = self
            .client
            .get(url.clone())
            .header(API_VERSION_HEADER, API_VERSION)
            .header(AUTHORIZATION, token.authorization())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(TravisStatusError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.text().await?;
        let builds: BuildsResponse = serde_json::from_str(&body)?;

        builds
            .builds
            .into_iter()
            .next()
            .map(BuildStatus::from)
            .ok_or_else(|| TravisStatusError::NoBuilds {
                repo: repository_id.to_string(),
                branch: branch.to_string(),
            })
    }
}

impl BuildSource for BuildStatusClient {
    /// Latest build for the repository and branch in `repo`.
    ///
    /// Never fails: transport, status and parse errors are logged and
    /// collapse to an empty `BuildStatus` so a flaky network does not
    /// flood the status bar.
    async fn latest_build(&self, base_url: &str, token: &Token, repo: &RepoInfo) -> BuildStatus {
        let (Some(repository_id), Some(branch)) = (&repo.repository_id, &repo.branch) else {
            return BuildStatus::none();
        };

        let url = match Self::builds_url(base_url, repository_id, branch) {
            Ok(url) => url,
            Err(e) => {
                warn!("[Travis-CI API Error] {e}");
                return BuildStatus::none();
            }
        };

        match self.fetch_latest(&url, token, repository_id, branch).await {
            Ok(status) => status,
            Err(e) => {
                warn!("[Travis-CI API Error] {e}");
                debug!("[Travis-CI Debug] {url}");
                BuildStatus::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::travis::BuildState;
    use mockito::Matcher;

    fn repo(id: &str, branch: &str) -> RepoInfo {
        RepoInfo::resolved(id.to_string(), branch.to_string())
    }

    fn base(server: &mockito::ServerGuard) -> String {
        format!("{}/", server.url())
    }

    #[test]
    fn test_builds_url_encodes_slug() {
        let url =
            BuildStatusClient::builds_url("https://api.travis-ci.org/", "acme/widget", "main")
                .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.travis-ci.org/repo/acme%2Fwidget/builds?limit=1&branch.name=main"
        );
    }

    #[test]
    fn test_builds_url_keeps_base_path_prefix() {
        let expected = "https://travis.example.com/api/repo/acme%2Fwidget/builds?limit=1&branch.name=main";

        for base in ["https://travis.example.com/api", "https://travis.example.com/api/"] {
            let url = BuildStatusClient::builds_url(base, "acme/widget", "main").unwrap();
            assert_eq!(url.as_str(), expected);
        }
    }

    #[test]
    fn test_builds_url_without_trailing_slash_on_host() {
        let url =
            BuildStatusClient::builds_url("https://api.travis-ci.com", "acme/widget", "dev").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.travis-ci.com/repo/acme%2Fwidget/builds?limit=1&branch.name=dev"
        );
    }

    #[tokio::test]
    async fn test_prefixed_base_reaches_prefixed_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/repo/acme%2Fwidget/builds")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"builds":[{"state":"passed","number":"12"}]}"#)
            .create_async()
            .await;

        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(
                &format!("{}/api", server.url()),
                &Token::from("t"),
                &repo("acme/widget", "main"),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(status.state, Some(BuildState::Passed));
    }

    #[tokio::test]
    async fn test_latest_build_sends_headers_and_parses_first_build() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repo/acme%2Fwidget/builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "1".into()),
                Matcher::UrlEncoded("branch.name".into(), "main".into()),
            ]))
            .match_header("travis-api-version", "3")
            .match_header("authorization", "token secret")
            .match_header("user-agent", Matcher::Regex("^travis-status/".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"builds":[{"state":"queued","number":"7"},{"state":"passed","number":"6"}]}"#)
            .create_async()
            .await;

        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(&base(&server), &Token::from("secret"), &repo("acme/widget", "main"))
            .await;

        mock.assert_async().await;
        assert_eq!(status.state, Some(BuildState::Queued));
        assert_eq!(status.build_number.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_empty_builds_degrades_to_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/repo/".into()))
            .with_status(200)
            .with_body(r#"{"builds":[]}"#)
            .create_async()
            .await;

        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(&base(&server), &Token::from("t"), &repo("acme/widget", "main"))
            .await;

        assert_eq!(status, BuildStatus::none());
    }

    #[tokio::test]
    async fn test_http_error_degrades_to_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/repo/".into()))
            .with_status(403)
            .with_body("access denied")
            .create_async()
            .await;

        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(&base(&server), &Token::from("t"), &repo("acme/widget", "main"))
            .await;

        assert_eq!(status, BuildStatus::none());
    }

    #[tokio::test]
    async fn test_malformed_json_degrades_to_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/repo/".into()))
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(&base(&server), &Token::from("t"), &repo("acme/widget", "main"))
            .await;

        assert_eq!(status, BuildStatus::none());
    }

    #[tokio::test]
    async fn test_missing_branch_short_circuits() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let incomplete = RepoInfo {
            repository_id: Some("acme/widget".to_string()),
            branch: None,
            error: None,
        };

        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(&base(&server), &Token::from("t"), &incomplete)
            .await;

        mock.assert_async().await;
        assert_eq!(status, BuildStatus::none());
    }

    #[tokio::test]
    async fn test_unreachable_host_degrades_to_none() {
        let client = BuildStatusClient::new().unwrap();
        let status = client
            .latest_build(
                "http://127.0.0.1:1/",
                &Token::from("t"),
                &repo("acme/widget", "main"),
            )
            .await;

        assert_eq!(status, BuildStatus::none());
    }
}
