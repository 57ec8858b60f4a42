pub mod csv;

pub use self::csv::{export_status, to_csv};

use crate::digest::{extract_description, DegradeReason, Fallback, Listing, Resolved, Truncation};
use crate::github::{Comment, Commit, CommitDetail, Proposal, SipStatus};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write output file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Print the listing to the terminal, or write it as CSV when a path is given.
#[instrument(skip(listing), fields(count = listing.proposals.len()))]
pub fn output_listing(listing: &Listing, csv_path: Option<&Path>) -> Result<(), ReportError> {
    match csv_path {
        None => {
            debug!("writing listing to terminal");
            print!("{}", format_listing(listing));
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing listing as CSV");
            std::fs::write(path, to_csv(&listing.proposals))?;
            Ok(())
        }
    }
}

/// Print resolved content to the terminal, or write the markdown to a file.
#[instrument(skip(content))]
pub fn output_content(
    id: u64,
    content: &Resolved<String>,
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing content to terminal");
            print!("{}", format_content(id, content));
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing content to file");
            std::fs::write(path, content.value())?;
            Ok(())
        }
    }
}

pub fn format_listing(listing: &Listing) -> String {
    let mut out = String::new();
    if listing.rate_limited {
        out.push_str(&format!(
            "{}\n",
            "GitHub rate limit reached before any proposals were fetched."
                .yellow()
                .bold()
        ));
    }

    for proposal in &listing.proposals {
        out.push_str(&format!(
            "{:>5}  {}  {}  {}\n",
            format!("#{}", proposal.number).bold(),
            colorize_status(proposal.status()),
            proposal.title,
            format!("({})", proposal.author()).dimmed()
        ));
    }

    match &listing.truncated {
        Some(Truncation::RateLimited { page, .. }) => out.push_str(&format!(
            "{}\n",
            format!("Partial list: rate limited at page {}", page).yellow()
        )),
        Some(Truncation::Failed { page, message }) => out.push_str(&format!(
            "{}\n",
            format!("Partial list: page {} failed ({})", page, message).red()
        )),
        None => {}
    }
    out.push_str(&format!("{} proposals\n", listing.proposals.len()));
    out
}

pub fn format_proposal(proposal: &Proposal) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "SIP #{}: \"{}\"\n",
        proposal.number,
        proposal.title.bold()
    ));
    out.push_str(&format!(
        "Status: {} | Author: {} | Created: {} | Updated: {}\n",
        colorize_status(proposal.status()),
        proposal.author(),
        proposal.created_at.format("%Y-%m-%d"),
        proposal.updated_at.format("%Y-%m-%d")
    ));
    if !proposal.labels.is_empty() {
        let labels: Vec<&str> = proposal.labels.iter().map(|l| l.name.as_str()).collect();
        out.push_str(&format!("Labels: {}\n", labels.join(", ")));
    }
    if let Some(total) = proposal.total_comments {
        out.push_str(&format!("Comments: {}\n", total));
    }
    if !proposal.html_url.is_empty() {
        out.push_str(&format!("{}\n", proposal.html_url.dimmed()));
    }
    out
}

pub fn format_content(id: u64, content: &Resolved<String>) -> String {
    let mut out = String::new();
    if let Resolved::Degraded { fallback, reason, .. } = content {
        out.push_str(&format!(
            "{}\n",
            format!(
                "SIP-{}: showing {} ({})",
                id,
                describe_fallback(*fallback),
                describe_reason(*reason)
            )
            .yellow()
        ));
    }
    out.push_str(&format!(
        "{} {}\n\n",
        "Description:".bold(),
        extract_description(content.value())
    ));
    out.push_str(content.value());
    out.push('\n');
    out
}

pub fn format_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "No comments.\n".to_string();
    }
    let mut out = String::new();
    for comment in comments {
        out.push_str(&format!(
            "{} {}\n",
            comment.author().bold(),
            comment.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        ));
        for line in comment.body.lines() {
            out.push_str(&format!("  {}\n", line));
        }
        out.push('\n');
    }
    out
}

pub fn format_commits(commits: &[Commit]) -> String {
    if commits.is_empty() {
        return "No commits.\n".to_string();
    }
    let mut out = String::new();
    for commit in commits {
        let short_sha: String = commit.sha.chars().take(7).collect();
        let summary = commit.commit.message.lines().next().unwrap_or_default();
        out.push_str(&format!(
            "{}  {}  {}\n",
            short_sha.yellow(),
            summary,
            format!(
                "({}, {})",
                commit.commit.author.name,
                commit.commit.author.date.format("%Y-%m-%d")
            )
            .dimmed()
        ));
    }
    out
}

pub fn format_commit_detail(detail: &CommitDetail) -> String {
    let mut out = format!("Commit {}\n", detail.sha.yellow());
    if detail.files.is_empty() {
        out.push_str("  No files.\n");
    }
    for file in &detail.files {
        out.push_str(&format!("  {:<9} {}\n", file.status, file.filename));
    }
    out
}

fn colorize_status(status: SipStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        SipStatus::Live => label.green().bold(),
        SipStatus::Approved => label.cyan().bold(),
        SipStatus::Draft => label.yellow().bold(),
    }
}

fn describe_fallback(fallback: Fallback) -> &'static str {
    match fallback {
        Fallback::PullRequestBody => "pull request body",
        Fallback::Placeholder => "placeholder content",
    }
}

fn describe_reason(reason: DegradeReason) -> &'static str {
    match reason {
        DegradeReason::NoCommits => "no commits found",
        DegradeReason::CommitDetailUnavailable => "commit details unavailable",
        DegradeReason::NoCandidateFile => "no proposal file in first commit",
        DegradeReason::RawContentUnavailable => "proposal file could not be fetched",
    }
}
