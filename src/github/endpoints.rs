// URL builders for the proposal repository's REST endpoints.

use crate::config::GitHubConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEndpoints {
    api_base: String,
    owner: String,
    repo: String,
}

impl RepoEndpoints {
    pub fn new(api_base: &str, owner: &str, repo: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
    }

    /// One page of pull requests in every state.
    pub fn pulls_page(&self, page: u32, per_page: usize) -> String {
        format!(
            "{}/pulls?state=all&per_page={}&page={}",
            self.repo_url(),
            per_page,
            page
        )
    }

    pub fn pull(&self, number: u64) -> String {
        format!("{}/pulls/{}", self.repo_url(), number)
    }

    pub fn issue_comments(&self, number: u64) -> String {
        format!("{}/issues/{}/comments", self.repo_url(), number)
    }

    pub fn review_comments(&self, number: u64) -> String {
        format!("{}/pulls/{}/comments", self.repo_url(), number)
    }

    pub fn pull_commits(&self, number: u64) -> String {
        format!("{}/pulls/{}/commits", self.repo_url(), number)
    }

    pub fn commit(&self, sha: &str) -> String {
        format!("{}/commits/{}", self.repo_url(), sha)
    }
}

impl From<&GitHubConfig> for RepoEndpoints {
    fn from(config: &GitHubConfig) -> Self {
        Self::new(&config.api_base, &config.owner, &config.repo)
    }
}
