//! GitHub REST client
//!
//! Implements [`HostingApi`] against the GitHub v3 REST API using the git
//! data endpoints for the atomic commit, and the pulls/issues/contents
//! endpoints for everything else.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::api::{HostingApi, HostingResult};
use crate::error::HostingError;
use crate::types::{
    BlobRef, ChangeSource, ChangeStatus, CommitRef, Encoding, FileChange, FileData, GitCommit,
    GitRef, TreeEntry,
};

const PER_PAGE: usize = 100;
const MAX_BLOB_SIZE: usize = 100 * 1024 * 1024;

/// GitHub client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// Repository as `owner/name`
    pub repository: String,
    /// Token sent as a bearer credential
    #[serde(skip_serializing)]
    pub token: String,
}

impl GitHubConfig {
    pub fn new(repository: &str, token: &str) -> Self {
        GitHubConfig {
            api_url: "https://api.github.com".to_string(),
            repository: repository.to_string(),
            token: token.to_string(),
        }
    }

    /// Read `GITHUB_API_URL` and `GITHUB_REPOSITORY` from the runner environment.
    pub fn from_env(token: &str) -> HostingResult<Self> {
        let repository = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| HostingError::not_found("GITHUB_REPOSITORY environment variable"))?;
        let api_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        Ok(GitHubConfig {
            api_url,
            repository,
            token: token.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

/// GitHub REST implementation of [`HostingApi`].
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

// -- wire types ---------------------------------------------------------------

#[derive(Deserialize)]
struct Sha {
    sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    #[serde(rename = "ref")]
    name: String,
    object: Sha,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    tree: Sha,
    message: String,
}

#[derive(Deserialize)]
struct CreatedCommit {
    sha: String,
    html_url: String,
}

#[derive(Deserialize)]
struct ChangedFile {
    filename: String,
    status: String,
    previous_filename: Option<String>,
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Deserialize)]
struct Comment {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Deserialize)]
struct RepoCommit {
    commit: RepoCommitDetail,
}

#[derive(Deserialize)]
struct RepoCommitDetail {
    message: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    path: String,
    content: String,
    encoding: String,
    sha: String,
}

fn to_file_changes(files: Vec<ChangedFile>) -> Vec<FileChange> {
    files
        .into_iter()
        .filter_map(|f| match ChangeStatus::from_github(&f.status) {
            Some(status) => Some(FileChange {
                path: f.filename,
                status,
                previous_path: f.previous_filename,
            }),
            None => {
                debug!(path = %f.filename, status = %f.status, "ignoring unknown file status");
                None
            }
        })
        .collect()
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> HostingResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("svgo-action/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Build `<api>/repos/<owner>/<name>/<segments...>`, percent-encoding each segment.
    ///
    /// Segments may themselves contain `/` (branch names, file paths); they
    /// are split so that only the individual components are encoded.
    fn url(&self, segments: &[&str]) -> HostingResult<Url> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| HostingError::Transport(format!("invalid API URL: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| HostingError::Transport("API URL cannot be a base".to_string()))?;
            path.pop_if_empty().push("repos");
            for part in self.config.repository.split('/') {
                path.push(part);
            }
            for segment in segments {
                for part in segment.split('/').filter(|p| !p.is_empty()) {
                    path.push(part);
                }
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> HostingResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(HostingError::not_found(resource));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HostingError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        resource: &str,
    ) -> HostingResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let mut url = self.url(segments)?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<T> = self.send(self.request(Method::GET, url), resource).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn get_ref(&self, branch: &str) -> HostingResult<GitRef> {
        let url = self.url(&["git", "ref", branch])?;
        let response: RefResponse = self
            .send(self.request(Method::GET, url), &format!("ref {branch}"))
            .await?;
        Ok(GitRef {
            name: response
                .name
                .strip_prefix("refs/")
                .unwrap_or(&response.name)
                .to_string(),
            sha: response.object.sha,
        })
    }

    async fn get_commit(&self, sha: &str) -> HostingResult<GitCommit> {
        let url = self.url(&["git", "commits", sha])?;
        let response: CommitResponse = self
            .send(self.request(Method::GET, url), &format!("commit {sha}"))
            .await?;
        Ok(GitCommit {
            sha: response.sha,
            tree_sha: response.tree.sha,
            message: response.message,
        })
    }

    async fn create_blob(&self, content: &str, encoding: Encoding) -> HostingResult<BlobRef> {
        if content.len() > MAX_BLOB_SIZE {
            return Err(HostingError::BlobTooLarge {
                size: content.len(),
                limit: MAX_BLOB_SIZE,
            });
        }
        let url = self.url(&["git", "blobs"])?;
        let body = json!({ "content": content, "encoding": encoding.as_str() });
        let result: HostingResult<Sha> = self
            .send(self.request(Method::POST, url).json(&body), "blob")
            .await;
        match result {
            Ok(blob) => Ok(BlobRef { sha: blob.sha }),
            Err(HostingError::Http { status: 422, .. }) => Err(HostingError::BlobTooLarge {
                size: content.len(),
                limit: MAX_BLOB_SIZE,
            }),
            Err(e) => Err(e),
        }
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> HostingResult<String> {
        let url = self.url(&["git", "trees"])?;
        let tree: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| json!({ "path": e.path, "mode": e.mode, "type": "blob", "sha": e.blob_sha }))
            .collect();
        let body = json!({ "base_tree": base_tree, "tree": tree });
        let created: Sha = self
            .send(self.request(Method::POST, url).json(&body), "tree")
            .await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> HostingResult<CommitRef> {
        let url = self.url(&["git", "commits"])?;
        let body = json!({ "message": message, "tree": tree_sha, "parents": parents });
        let created: CreatedCommit = self
            .send(self.request(Method::POST, url).json(&body), "commit")
            .await?;
        Ok(CommitRef {
            sha: created.sha,
            url: created.html_url,
        })
    }

    async fn update_ref(&self, branch: &str, sha: &str) -> HostingResult<()> {
        let url = self.url(&["git", "refs", branch])?;
        let body = json!({ "sha": sha, "force": false });
        let _: serde_json::Value = self
            .send(
                self.request(Method::PATCH, url).json(&body),
                &format!("ref {branch}"),
            )
            .await?;
        Ok(())
    }

    async fn list_changes(&self, source: &ChangeSource) -> HostingResult<Vec<FileChange>> {
        match source {
            ChangeSource::PullRequest { number } => {
                let number = number.to_string();
                let files: Vec<ChangedFile> = self
                    .paginate(&["pulls", &number, "files"], &format!("pull request #{number}"))
                    .await?;
                Ok(to_file_changes(files))
            }
            ChangeSource::Compare { base, head } => {
                let range = format!("{base}...{head}");
                let url = self.url(&["compare", &range])?;
                let response: CompareResponse = self
                    .send(self.request(Method::GET, url), &format!("comparison {range}"))
                    .await?;
                Ok(to_file_changes(response.files))
            }
        }
    }

    async fn list_comments(&self, pr_number: u64) -> HostingResult<Vec<String>> {
        let number = pr_number.to_string();
        let comments: Vec<Comment> = self
            .paginate(
                &["issues", &number, "comments"],
                &format!("pull request #{number}"),
            )
            .await?;
        // The API lists oldest first
        Ok(comments
            .into_iter()
            .rev()
            .map(|c| c.body.unwrap_or_default())
            .collect())
    }

    async fn get_commit_message(&self, sha: &str) -> HostingResult<String> {
        let url = self.url(&["commits", sha])?;
        let response: RepoCommit = self
            .send(self.request(Method::GET, url), &format!("commit {sha}"))
            .await?;
        Ok(response.commit.message)
    }

    async fn get_file(&self, path: &str, git_ref: &str) -> HostingResult<FileData> {
        let mut url = self.url(&["contents", path])?;
        url.query_pairs_mut().append_pair("ref", git_ref);
        let value: serde_json::Value = self
            .send(self.request(Method::GET, url), &format!("file {path}"))
            .await?;
        if value.is_array() {
            return Err(HostingError::Decode(format!("{path} is a directory")));
        }
        let response: ContentsResponse = serde_json::from_value(value)?;
        let encoding = Encoding::parse(&response.encoding).ok_or_else(|| {
            HostingError::Decode(format!("unsupported encoding '{}'", response.encoding))
        })?;
        Ok(FileData {
            path: response.path,
            content: response.content,
            encoding,
            sha: response.sha,
        })
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> HostingResult<()> {
        let number = pr_number.to_string();
        let url = self.url(&["issues", &number, "comments"])?;
        let _: serde_json::Value = self
            .send(
                self.request(Method::POST, url).json(&json!({ "body": body })),
                &format!("pull request #{number}"),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        GitHubClient::new(GitHubConfig::new("octo/icons", "secret")).unwrap()
    }

    #[test]
    fn test_config_new_defaults_to_public_api() {
        let config = GitHubConfig::new("octo/icons", "secret");
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.repository, "octo/icons");
    }

    #[test]
    fn test_config_token_is_not_serialized() {
        let config = GitHubConfig::new("octo/icons", "secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_url_splits_branch_names() {
        let url = client().url(&["git", "ref", "heads/feature/icons"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/icons/git/ref/heads/feature/icons"
        );
    }

    #[test]
    fn test_url_encodes_path_components() {
        let url = client().url(&["contents", "assets/my icon.svg"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/icons/contents/assets/my%20icon.svg"
        );
    }

    #[test]
    fn test_url_respects_enterprise_base() {
        let config =
            GitHubConfig::new("octo/icons", "secret").with_api_url("https://ghe.example.com/api/v3/");
        let client = GitHubClient::new(config).unwrap();
        let url = client.url(&["pulls", "7", "files"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/octo/icons/pulls/7/files"
        );
    }

    #[test]
    fn test_unknown_statuses_are_dropped() {
        let files = vec![
            ChangedFile {
                filename: "a.svg".to_string(),
                status: "added".to_string(),
                previous_filename: None,
            },
            ChangedFile {
                filename: "b.svg".to_string(),
                status: "mystery".to_string(),
                previous_filename: None,
            },
        ];
        let changes = to_file_changes(files);
        assert_eq!(changes, vec![FileChange::new("a.svg", ChangeStatus::Added)]);
    }
}
