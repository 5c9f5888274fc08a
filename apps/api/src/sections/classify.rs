//! Line cleaning and classification.

/// A line with emphasis and markdown heading markers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanLine {
    pub text: String,
    /// The raw line started with `#` markers.
    pub markdown_heading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    TopicHeading(&'a str),
    ItemHeading(&'a str),
    DetailLabel { title: &'a str, rest: &'a str },
    PlainLine(&'a str),
}

/// Strips `*` emphasis characters, surrounding whitespace and any leading `#` heading marker.
pub fn clean_line(raw: &str) -> CleanLine {
    let stripped: String = raw.chars().filter(|&c| c != '*').collect();
    let trimmed = stripped.trim();

    let hashes = trimmed.len() - trimmed.trim_start_matches('#').len();
    let after = &trimmed[hashes..];
    if hashes > 0 && (after.is_empty() || after.starts_with(char::is_whitespace)) {
        return CleanLine {
            text: after.trim().to_string(),
            markdown_heading: true,
        };
    }

    CleanLine {
        text: trimmed.to_string(),
        markdown_heading: false,
    }
}

/// Classifies a cleaned, non-blank line. Item headings win over topic headings.
pub fn classify(line: &CleanLine) -> LineClass<'_> {
    let text = line.text.as_str();
    if let Some(name) = item_heading(text) {
        return LineClass::ItemHeading(name);
    }
    if let Some(name) = topic_heading(text, line.markdown_heading) {
        return LineClass::TopicHeading(name);
    }
    if let Some((title, rest)) = detail_label(text) {
        return LineClass::DetailLabel { title, rest };
    }
    LineClass::PlainLine(text)
}

/// `name` or `name:` where name starts with a lowercase letter and continues with
/// letters of either case, digits, `-` or `_` (`my-repo`, `reactApp`).
fn item_heading(text: &str) -> Option<&str> {
    let name = text.strip_suffix(':').unwrap_or(text);
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_lowercase()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(name)
}

/// Capitalized words-only line, cued either by a trailing colon or a markdown `#` marker.
fn topic_heading(text: &str, markdown_heading: bool) -> Option<&str> {
    let (name, has_colon) = match text.strip_suffix(':') {
        Some(name) => (name, true),
        None => (text, false),
    };
    if !has_colon && !markdown_heading {
        return None;
    }

    let mut chars = name.chars();
    let first = chars.next()?;
    let rest = chars.as_str();
    let valid = first.is_ascii_uppercase()
        && !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace());
    valid.then(|| name.trim_end())
}

/// `Label: rest` where the label is letters and spaces only.
fn detail_label(text: &str) -> Option<(&str, &str)> {
    let (label, rest) = text.split_once(':')?;
    let valid = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace());
    valid.then(|| (label.trim(), rest.trim()))
}
