use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GitHubConfig;
use crate::domain::ReleaseRecord;
use crate::error::{Backend, Result, VoyagerError};

const MAX_PAGE_SIZE: usize = 100;

/// Release-record store backed by the GitHub releases API
pub struct GitHubClient {
    http: Client,
    api_url: String,
    owner: String,
    repo: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    target_commitish: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

#[derive(Deserialize)]
struct ReleaseResponse {
    id: u64,
    tag_name: String,
    #[serde(default)]
    target_commitish: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    author: Option<Author>,
}

#[derive(Deserialize)]
struct Author {
    login: String,
}

impl From<ReleaseResponse> for ReleaseRecord {
    fn from(release: ReleaseResponse) -> Self {
        ReleaseRecord {
            title: release.name.unwrap_or_else(|| release.tag_name.clone()),
            tag: release.tag_name,
            commit: release.target_commitish.unwrap_or_default(),
            body: release.body.unwrap_or_default(),
            created_at: release.created_at,
            url: release.html_url,
            author: release.author.map(|a| a.login),
        }
    }
}

impl GitHubClient {
    /// Build a client for `owner/repo` authenticating with `token`
    pub fn new(config: &GitHubConfig, owner: &str, repo: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        let auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|e| VoyagerError::config(format!("Invalid GitHub token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("voyager/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| VoyagerError::config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(GitHubClient {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url, self.owner, self.repo)
    }

    fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        request.send().map_err(|e| {
            if e.is_timeout() {
                VoyagerError::network(
                    Backend::RecordStore,
                    operation,
                    format!("timed out after {}s", self.timeout_secs),
                )
            } else {
                VoyagerError::network(Backend::RecordStore, operation, e)
            }
        })
    }

    /// Lookup URL for `tag`, which goes in as a single encoded path segment
    fn tag_url(&self, tag: &str) -> Result<Url> {
        let mut url = Url::parse(&self.releases_url()).map_err(|e| {
            VoyagerError::config(format!("Invalid GitHub API URL '{}': {}", self.api_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                VoyagerError::config(format!("GitHub API URL '{}' cannot take a path", self.api_url))
            })?
            .extend(["tags", tag]);
        Ok(url)
    }

    fn release_id(&self, tag: &str, operation: &str) -> Result<u64> {
        let url = self.tag_url(tag)?;
        let response = self.send(self.http.get(url), operation)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(VoyagerError::not_found(Backend::RecordStore, tag)),
            status if status.is_success() => {
                let release: ReleaseResponse = response
                    .json()
                    .map_err(|e| VoyagerError::network(Backend::RecordStore, operation, e))?;
                Ok(release.id)
            }
            _ => Err(unexpected(operation, response)),
        }
    }
}

impl super::RecordStore for GitHubClient {
    fn create_record(&self, tag: &str, commit: &str, title: &str, body: &str) -> Result<()> {
        let operation = format!("create release {}", tag);
        let payload = CreateRelease {
            tag_name: tag,
            target_commitish: commit,
            name: title,
            body,
            draft: false,
            prerelease: false,
        };

        let response = self.send(self.http.post(self.releases_url()).json(&payload), &operation)?;
        match response.status() {
            status if status.is_success() => {
                debug!(tag, repo = %self.repo, "release record created");
                Ok(())
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let text = response.text().unwrap_or_default();
                if text.contains("already_exists") {
                    Err(VoyagerError::conflict(Backend::RecordStore, tag))
                } else {
                    Err(VoyagerError::network(
                        Backend::RecordStore,
                        operation,
                        format!("422 - {}", text),
                    ))
                }
            }
            _ => Err(unexpected(&operation, response)),
        }
    }

    fn delete_record(&self, tag: &str) -> Result<()> {
        let operation = format!("delete release {}", tag);
        let id = self.release_id(tag, &operation)?;

        let url = format!("{}/{}", self.releases_url(), id);
        let response = self.send(self.http.delete(url), &operation)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(VoyagerError::not_found(Backend::RecordStore, tag)),
            status if status.is_success() => {
                debug!(tag, id, "release record deleted");
                Ok(())
            }
            _ => Err(unexpected(&operation, response)),
        }
    }

    fn list_records(&self, limit: Option<usize>) -> Result<Vec<ReleaseRecord>> {
        let operation = "list releases";
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let wanted = limit.map(|l| l.saturating_sub(records.len()));
            let per_page = wanted.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
            let request = self
                .http
                .get(self.releases_url())
                .query(&[("per_page", per_page), ("page", page)]);

            let response = self.send(request, operation)?;
            if !response.status().is_success() {
                return Err(unexpected(operation, response));
            }
            let batch: Vec<ReleaseResponse> = response
                .json()
                .map_err(|e| VoyagerError::network(Backend::RecordStore, operation, e))?;

            let exhausted = batch.len() < per_page;
            records.extend(batch.into_iter().map(ReleaseRecord::from));

            let filled = limit.is_some_and(|l| records.len() >= l);
            if exhausted || filled {
                break;
            }
            page += 1;
        }

        if let Some(limit) = limit {
            records.truncate(limit);
        }
        debug!(count = records.len(), pages = page, "listed release records");
        Ok(records)
    }
}

fn unexpected(operation: &str, response: Response) -> VoyagerError {
    let status = response.status();
    let text = response.text().unwrap_or_default();
    VoyagerError::network(
        Backend::RecordStore,
        operation,
        format!("{} - {}", status.as_u16(), text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_response_into_record() {
        let json = r#"{
            "id": 42,
            "tag_name": "v1.2.0",
            "target_commitish": "abc123",
            "name": "v1.2.0",
            "body": "notes",
            "created_at": "2024-03-01T10:00:00Z",
            "html_url": "https://github.com/acme/app/releases/tag/v1.2.0",
            "author": {"login": "octocat"}
        }"#;
        let release: ReleaseResponse = serde_json::from_str(json).unwrap();
        let record = ReleaseRecord::from(release);

        assert_eq!(record.tag, "v1.2.0");
        assert_eq!(record.commit, "abc123");
        assert_eq!(record.body, "notes");
        assert_eq!(record.author.as_deref(), Some("octocat"));
        assert!(record.created_at.is_some());
    }

    #[test]
    fn test_release_response_sparse_fields() {
        let json = r#"{"id": 7, "tag_name": "v0.1.0", "name": null, "body": null}"#;
        let release: ReleaseResponse = serde_json::from_str(json).unwrap();
        let record = ReleaseRecord::from(release);

        assert_eq!(record.title, "v0.1.0");
        assert_eq!(record.body, "");
        assert_eq!(record.author, None);
    }

    #[test]
    fn test_client_trims_api_url() {
        let config = GitHubConfig {
            api_url: "https://github.example.com/api/v3/".to_string(),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::new(&config, "acme", "app", "t0ken").unwrap();
        assert_eq!(
            client.releases_url(),
            "https://github.example.com/api/v3/repos/acme/app/releases"
        );
    }

    #[test]
    fn test_tag_lookup_encodes_the_tag() {
        let client =
            GitHubClient::new(&GitHubConfig::default(), "acme", "app", "t0ken").unwrap();
        assert_eq!(
            client.tag_url("v1.2.0").unwrap().as_str(),
            "https://api.github.com/repos/acme/app/releases/tags/v1.2.0"
        );
        assert_eq!(
            client.tag_url("feature/x#1?").unwrap().as_str(),
            "https://api.github.com/repos/acme/app/releases/tags/feature%2Fx%231%3F"
        );
    }

    #[test]
    fn test_client_rejects_unprintable_token() {
        let result = GitHubClient::new(&GitHubConfig::default(), "acme", "app", "bad\ntoken");
        assert!(matches!(result, Err(VoyagerError::Config(_))));
    }
}
