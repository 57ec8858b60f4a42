// Markdown post-processing for proposal documents.

use regex::Regex;

const NO_DESCRIPTION: &str = "No description available.";

fn is_metadata_marker(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("| SIP-Number") || trimmed.starts_with("|SIP-Number")
}

/// Remove the leading SIP metadata table, if any.
///
/// The table starts at the first line beginning with `| SIP-Number` and runs
/// over every contiguous line starting with `|`, plus one trailing blank
/// line. Text before and after the table is kept, with leading whitespace
/// trimmed. Without a marker line the input is returned unchanged.
pub fn strip_metadata_table(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = match lines.iter().position(|line| is_metadata_marker(line)) {
        Some(start) => start,
        None => return content.to_string(),
    };

    let mut end = start;
    for (i, line) in lines.iter().enumerate().skip(start) {
        let trimmed = line.trim();
        if trimmed.starts_with('|') {
            end = i;
            continue;
        }
        if trimmed.is_empty() {
            end = i;
        }
        break;
    }

    let kept: Vec<&str> = lines[..start]
        .iter()
        .chain(lines[end + 1..].iter())
        .copied()
        .collect();
    kept.join("\n").trim_start().to_string()
}

/// Short plain-text description of a proposal document.
///
/// Prefers the `## Abstract` section, then `## Summary`, then the prose
/// following the first heading (capped at roughly 200 characters).
pub fn extract_description(content: &str) -> String {
    if content.trim().is_empty() {
        return NO_DESCRIPTION.to_string();
    }

    if let Some(text) = section(content, "Abstract").or_else(|| section(content, "Summary")) {
        return clean_markdown_text(&text);
    }

    let mut description = String::new();
    let mut found_title = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("---") || trimmed.starts_with('|') {
            continue;
        }
        if trimmed.starts_with('#') {
            found_title = true;
            continue;
        }
        if found_title {
            description.push_str(trimmed);
            description.push(' ');
            if description.len() > 200 {
                break;
            }
        }
    }

    let cleaned = clean_markdown_text(description.trim());
    if cleaned.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        cleaned
    }
}

/// Body of a `## <name>` section, up to the next heading.
fn section(content: &str, name: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?is)##\s*{}\s*\n(.*?)(?:\n#|\z)", name)).ok()?;
    let captures = pattern.captures(content)?;
    Some(captures.get(1)?.as_str().trim().to_string())
}

/// Flatten emphasis, inline code and links, and collapse whitespace.
fn clean_markdown_text(text: &str) -> String {
    let replacements = [
        (r"\*\*(.*?)\*\*", "$1"),
        (r"\*(.*?)\*", "$1"),
        (r"`(.*?)`", "$1"),
        (r"\[(.*?)\]\(.*?\)", "$1"),
        (r"\s+", " "),
    ];

    let mut cleaned = text.to_string();
    for (pattern, replacement) in replacements {
        if let Ok(re) = Regex::new(pattern) {
            cleaned = re.replace_all(&cleaned, replacement).into_owned();
        }
    }
    cleaned.trim().to_string()
}
