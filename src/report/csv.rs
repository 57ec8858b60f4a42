// CSV export of the proposal listing.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::github::Proposal;

const HEADER: &str = "Number,Title,Status,Created Date,Updated Date,Author,Labels";

/// Open, Merged or Closed. Merged wins over the raw closed state.
pub fn export_status(proposal: &Proposal) -> &'static str {
    if proposal.is_open() {
        "Open"
    } else if proposal.merged_at.is_some() {
        "Merged"
    } else {
        "Closed"
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render proposals as CSV, one row per proposal, header first.
pub fn to_csv(proposals: &[Proposal]) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');

    for proposal in proposals {
        let labels = proposal
            .labels
            .iter()
            .map(|label| label.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let row = [
            proposal.number.to_string(),
            quoted(&proposal.title),
            export_status(proposal).to_string(),
            timestamp(&proposal.created_at),
            timestamp(&proposal.updated_at),
            proposal.author().to_string(),
            quoted(&labels),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}
