// Resolves the markdown document for a proposal, falling back to the pull
// request body and finally to generated placeholder content.

use tracing::{info, instrument, warn};

use super::markdown::strip_metadata_table;
use super::{DegradeReason, Fallback, Resolved, SipDigest};
use crate::github::{CommitFile, Fetched};

fn is_sip_markdown(file: &CommitFile) -> bool {
    file.filename.ends_with(".md") && file.filename.to_lowercase().contains("sip")
}

fn is_markdown(file: &CommitFile) -> bool {
    file.filename.ends_with(".md")
}

fn is_added_or_modified(file: &CommitFile) -> bool {
    file.status == "added" || file.status == "modified"
}

/// Filename/status patterns tried in order, loosest last.
const CANDIDATE_PATTERNS: [fn(&CommitFile) -> bool; 3] =
    [is_sip_markdown, is_markdown, is_added_or_modified];

/// Pick the changed file most likely to hold the proposal text.
///
/// For each pattern only the first match is considered, and only if it has
/// a raw URL.
pub fn find_candidate(files: &[CommitFile]) -> Option<&CommitFile> {
    CANDIDATE_PATTERNS.iter().find_map(|pattern| {
        files
            .iter()
            .find(|file| pattern(file))
            .filter(|file| file.raw_url.is_some())
    })
}

impl SipDigest {
    /// Best available markdown for proposal `id`, post-processed.
    ///
    /// Never fails: content from the proposal file is `Fresh`; the pull
    /// request body or the placeholder come back `Degraded`.
    #[instrument(skip(self))]
    pub async fn get_proposal_content(&self, id: u64) -> Resolved<String> {
        match self.resolve_file_content(id).await {
            Ok(content) => Resolved::Fresh(strip_metadata_table(&content)),
            Err(reason) => self.fallback_content(id, reason).await,
        }
    }

    async fn resolve_file_content(&self, id: u64) -> Result<String, DegradeReason> {
        let commits = self.get_commits(id).await;
        let first = commits.first().ok_or(DegradeReason::NoCommits)?;

        let detail = self
            .get_commit_detail(&first.sha)
            .await
            .ok_or(DegradeReason::CommitDetailUnavailable)?;

        let file = find_candidate(&detail.files).ok_or(DegradeReason::NoCandidateFile)?;
        let raw_url = file
            .raw_url
            .as_deref()
            .ok_or(DegradeReason::NoCandidateFile)?;
        info!(id, file = %file.filename, "fetching proposal file");

        match self.fetcher.fetch_raw(raw_url).await {
            Ok(Fetched::Data(content)) => Ok(content),
            Ok(Fetched::RateLimited(_)) => {
                warn!(id, raw_url, "rate limited fetching proposal file");
                Err(DegradeReason::RawContentUnavailable)
            }
            Err(e) => {
                warn!(id, raw_url, error = %e, "failed to fetch proposal file");
                Err(DegradeReason::RawContentUnavailable)
            }
        }
    }

    async fn fallback_content(&self, id: u64, reason: DegradeReason) -> Resolved<String> {
        warn!(id, ?reason, "falling back to pull request body");

        if let Some(proposal) = self.get_proposal(id).await {
            if let Some(body) = proposal.body.as_deref().filter(|body| !body.is_empty()) {
                return Resolved::Degraded {
                    value: strip_metadata_table(&format!("# {}\n\n{}", proposal.title, body)),
                    fallback: Fallback::PullRequestBody,
                    reason,
                };
            }
        }

        info!(id, "pull request body unavailable; using placeholder content");
        Resolved::Degraded {
            value: strip_metadata_table(&placeholder_content(id)),
            fallback: Fallback::Placeholder,
            reason,
        }
    }
}

/// Synthetic proposal document used when nothing can be fetched.
pub fn placeholder_content(id: u64) -> String {
    format!(
        r#"# SIP-{id}: Placeholder Title

| SIP-Number | {id} |
| ---: | :--- |
| Title | SIP-{id}: Placeholder Title |
| Description | This is a placeholder description for SIP-{id}. The actual content could not be fetched from GitHub. |
| Author | Unknown |
| Editor | |
| Type | Standard |
| Category | Framework |
| Created | 2023-01-01 |
| Comments-URI | |
| Status | |
| Requires | |

## Abstract

This is a placeholder content for SIP-{id}. The actual content could not be fetched from GitHub due to API limitations or network issues.

## Motivation

This placeholder is provided to ensure the application can still display something when the GitHub API is unavailable or rate limited.

## Specification

The placeholder includes various sections typically found in a SIP document to maintain the expected format and structure.

### Technical Details
- Feature 1: Description of feature 1
- Feature 2: Description of feature 2
- Feature 3: Description of feature 3

## Rationale

The rationale for this placeholder is to provide a fallback when the GitHub API cannot be accessed.

## Backwards Compatibility

This placeholder maintains the expected format and structure of a SIP document.

## Test Cases

- Test case 1: Description
- Test case 2: Description

## Reference Implementation

```rust
// This is placeholder code
fn example_function() -> bool {{
    println!("This is a placeholder implementation");
    true
}}
```

## Security Considerations

There are no security implications for this placeholder content.

## Copyright

Copyright and related rights waived via [CC0](https://creativecommons.org/publicdomain/zero/1.0/).
"#,
        id = id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::tests::{commit_json, digest_with, proposal_json};
    use crate::github::testing::ScriptedTransport;
    use crate::github::{RawResponse, RepoEndpoints};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    fn file(name: &str, status: &str, raw: Option<&str>) -> CommitFile {
        CommitFile {
            filename: name.to_string(),
            status: status.to_string(),
            raw_url: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_candidate_prefers_sip_markdown() {
        let files = vec![
            file("README.md", "modified", Some("r1")),
            file("sips/SIP-7.md", "added", Some("r2")),
        ];
        assert_eq!(find_candidate(&files).unwrap().filename, "sips/SIP-7.md");
    }

    #[test]
    fn test_candidate_falls_back_through_patterns() {
        let files = vec![
            file("src/lib.rs", "modified", Some("r1")),
            file("docs/notes.md", "removed", Some("r2")),
        ];
        assert_eq!(find_candidate(&files).unwrap().filename, "docs/notes.md");

        let files = vec![
            file("image.png", "removed", Some("r0")),
            file("src/lib.rs", "added", Some("r1")),
        ];
        assert_eq!(find_candidate(&files).unwrap().filename, "src/lib.rs");

        let files = vec![file("image.png", "removed", Some("r0"))];
        assert!(find_candidate(&files).is_none());
    }

    #[test]
    fn test_candidate_without_raw_url_is_skipped() {
        let files = vec![
            file("sip-7.md", "removed", None),
            file("other.rs", "modified", Some("r1")),
        ];
        assert_eq!(find_candidate(&files).unwrap().filename, "other.rs");
    }

    #[test]
    fn test_placeholder_survives_post_processing() {
        let stripped = strip_metadata_table(&placeholder_content(42));
        assert!(stripped.contains("SIP-42: Placeholder Title"));
        assert!(!stripped.contains("| SIP-Number"));
        assert!(stripped.contains("## Abstract"));
        assert!(stripped.contains("fn example_function() -> bool {"));
    }

    #[tokio::test]
    async fn test_content_from_proposal_file() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let raw = "https://github.com/o/r/raw/abc/sips/sip-7.md";
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(&endpoints.pull_commits(7), json!([commit_json("abc", "add")]));
        transport.respond_json(
            &endpoints.commit("abc"),
            json!({
                "sha": "abc",
                "files": [
                    { "filename": "README.md", "status": "modified", "raw_url": "https://github.com/o/r/raw/abc/README.md" },
                    { "filename": "sips/sip-7.md", "status": "added", "raw_url": raw }
                ]
            }),
        );
        transport.respond(
            raw,
            RawResponse::new(
                StatusCode::OK,
                "| SIP-Number | 7 |\n| --- | --- |\n\n## Abstract\nReal content",
            ),
        );

        let digest = digest_with(transport.clone(), &endpoints);
        let resolved = digest.get_proposal_content(7).await;

        assert_eq!(
            resolved,
            Resolved::Fresh("## Abstract\nReal content".to_string())
        );
        assert_eq!(transport.calls_to(&endpoints.pull(7)), 0);
    }

    #[tokio::test]
    async fn test_no_commits_falls_back_to_body() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(&endpoints.pull_commits(7), json!([]));
        transport.respond_json(
            &endpoints.pull(7),
            proposal_json(7, "open", "2024-01-01T00:00:00Z", Some("Hello"), "Test"),
        );

        let digest = digest_with(transport, &endpoints);
        let resolved = digest.get_proposal_content(7).await;

        assert!(resolved.is_degraded());
        assert!(resolved.value().contains("# Test"));
        assert!(resolved.value().contains("Hello"));
        assert!(matches!(
            resolved,
            Resolved::Degraded {
                fallback: Fallback::PullRequestBody,
                reason: DegradeReason::NoCommits,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_no_commits_and_no_body_yields_placeholder() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(&endpoints.pull_commits(7), json!([]));
        transport.respond_json(
            &endpoints.pull(7),
            proposal_json(7, "open", "2024-01-01T00:00:00Z", None, "Test"),
        );

        let digest = digest_with(transport, &endpoints);
        let resolved = digest.get_proposal_content(7).await;

        assert!(resolved.value().contains("SIP-7: Placeholder Title"));
        assert!(matches!(
            resolved,
            Resolved::Degraded {
                fallback: Fallback::Placeholder,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_raw_fetch_falls_back_to_body() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(&endpoints.pull_commits(7), json!([commit_json("abc", "add")]));
        transport.respond_json(
            &endpoints.commit("abc"),
            json!({
                "sha": "abc",
                "files": [{ "filename": "sip-7.md", "status": "added", "raw_url": "https://github.com/o/r/raw/abc/sip-7.md" }]
            }),
        );
        transport.respond_json(
            &endpoints.pull(7),
            proposal_json(
                7,
                "open",
                "2024-01-01T00:00:00Z",
                Some("| SIP-Number | 7 |\n\nBody text"),
                "Test",
            ),
        );

        let digest = digest_with(transport, &endpoints);
        let resolved = digest.get_proposal_content(7).await;

        assert_eq!(resolved.value(), "# Test\n\nBody text");
        assert!(matches!(
            resolved,
            Resolved::Degraded {
                reason: DegradeReason::RawContentUnavailable,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_throttled_commit_detail_falls_back_to_body() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(&endpoints.pull_commits(7), json!([commit_json("abc", "add")]));
        transport.respond(&endpoints.commit("abc"), ScriptedTransport::rate_limited());
        transport.respond_json(
            &endpoints.pull(7),
            proposal_json(7, "open", "2024-01-01T00:00:00Z", Some("Body text"), "Test"),
        );

        let digest = digest_with(transport, &endpoints);
        let resolved = digest.get_proposal_content(7).await;

        assert_eq!(resolved.value(), "# Test\n\nBody text");
        assert!(matches!(
            resolved,
            Resolved::Degraded {
                fallback: Fallback::PullRequestBody,
                reason: DegradeReason::CommitDetailUnavailable,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_commit_without_candidate_file_falls_back_to_body() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(&endpoints.pull_commits(7), json!([commit_json("abc", "cleanup")]));
        transport.respond_json(
            &endpoints.commit("abc"),
            json!({
                "sha": "abc",
                "files": [
                    { "filename": "assets/diagram.png", "status": "removed", "raw_url": "https://github.com/o/r/raw/abc/assets/diagram.png" },
                    { "filename": "scripts/old.sh", "status": "removed", "raw_url": "https://github.com/o/r/raw/abc/scripts/old.sh" }
                ]
            }),
        );
        transport.respond_json(
            &endpoints.pull(7),
            proposal_json(7, "open", "2024-01-01T00:00:00Z", Some("Body text"), "Test"),
        );

        let digest = digest_with(transport.clone(), &endpoints);
        let resolved = digest.get_proposal_content(7).await;

        assert_eq!(resolved.value(), "# Test\n\nBody text");
        assert!(matches!(
            resolved,
            Resolved::Degraded {
                fallback: Fallback::PullRequestBody,
                reason: DegradeReason::NoCandidateFile,
                ..
            }
        ));
        assert_eq!(
            transport.calls_to("https://github.com/o/r/raw/abc/scripts/old.sh"),
            0
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_yields_placeholder() {
        let endpoints = RepoEndpoints::new("https://api.test", "o", "r");
        let transport = Arc::new(ScriptedTransport::new());

        let digest = digest_with(transport, &endpoints);
        let resolved = digest.get_proposal_content(9).await;

        assert!(resolved.value().starts_with("# SIP-9: Placeholder Title"));
        assert!(matches!(
            resolved,
            Resolved::Degraded {
                fallback: Fallback::Placeholder,
                reason: DegradeReason::NoCommits,
                ..
            }
        ));
    }
}
