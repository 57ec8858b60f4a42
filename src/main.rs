use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sui_digest::config::Config;
use sui_digest::digest::SipDigest;
use sui_digest::report;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

/// Sui Digest: browse Sui Improvement Proposals mirrored from GitHub.
///
/// Rate limits and upstream failures degrade to partial or placeholder
/// output instead of errors.
#[derive(Parser, Debug)]
#[command(name = "sui-digest", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every proposal, open first then newest first
    List {
        /// Write the listing as CSV to this path instead of printing it
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show one proposal's metadata
    Show { id: u64 },
    /// Show the proposal document
    Content {
        id: u64,

        /// Write the markdown to this path instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show issue and review comments, oldest first
    Comments { id: u64 },
    /// List the commits on a proposal's pull request
    Commits { id: u64 },
    /// Show the files changed by a commit
    Commit { sha: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = Config::load()?;
    let digest = SipDigest::from_config(&config)?;
    let _main_span = info_span!(
        "sui_digest",
        owner = %config.github.owner,
        repo = %config.github.repo
    )
    .entered();

    match cli.command {
        Command::List { csv } => {
            let listing = digest.list_all_proposals().await;
            report::output_listing(&listing, csv.as_deref())?;
        }
        Command::Show { id } => match digest.get_proposal(id).await {
            Some(proposal) => print!("{}", report::format_proposal(&proposal)),
            None => return Err(format!("SIP #{} not found or unavailable", id).into()),
        },
        Command::Content { id, output } => {
            let content = digest.get_proposal_content(id).await;
            report::output_content(id, &content, output.as_deref())?;
        }
        Command::Comments { id } => {
            let comments = digest.get_comments(id).await;
            print!("{}", report::format_comments(&comments));
        }
        Command::Commits { id } => {
            let commits = digest.get_commits(id).await;
            print!("{}", report::format_commits(&commits));
        }
        Command::Commit { sha } => match digest.get_commit_detail(&sha).await {
            Some(detail) => print!("{}", report::format_commit_detail(&detail)),
            None => return Err(format!("commit {} not found or unavailable", sha).into()),
        },
    }

    info!("done");
    Ok(())
}
