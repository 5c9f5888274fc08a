//! Clean-up passes over raw model output before it is shown to the user.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// An ATS score pulled out of the model's answer, e.g. `85/100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsScore {
    pub score: u32,
    pub total: u32,
}

static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)/(\d+)|Score:\s*(\d+)|(\d+)%|(\d+)\s*out\s*of\s*(\d+)")
        .expect("score regex is valid")
});

static FRACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+/\d+").expect("fraction regex is valid"));
static SCORE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Score:\s*\d+").expect("score label regex is valid"));
static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+%").expect("percent regex is valid"));
static OUT_OF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+\s*out\s*of\s*\d+").expect("out-of regex is valid"));
static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank run regex is valid"));

static LOWER_UPPER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("camel case regex is valid"));
static UPPER_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").expect("capital run regex is valid"));

/// Returns the first score-like pattern in `text`.
///
/// Recognized forms, in order of precedence within a single match:
/// `N/M`, `Score: N` (out of 100), `N%` (out of 100), `N out of M`.
pub fn extract_score(text: &str) -> Option<AtsScore> {
    let caps = SCORE_RE.captures(text)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    if let (Some(score), Some(total)) = (num(1), num(2)) {
        return Some(AtsScore { score, total });
    }
    if let Some(score) = num(3).or_else(|| num(4)) {
        return Some(AtsScore { score, total: 100 });
    }
    if let (Some(score), Some(total)) = (num(5), num(6)) {
        return Some(AtsScore { score, total });
    }
    None
}

/// Removes every score-like pattern and collapses the blank lines left behind.
pub fn strip_score(text: &str) -> String {
    let text = FRACTION_RE.replace_all(text, "");
    let text = SCORE_LABEL_RE.replace_all(&text, "");
    let text = PERCENT_RE.replace_all(&text, "");
    let text = OUT_OF_RE.replace_all(&text, "");
    let text = BLANK_RUN_RE.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Splits glued words (`ImprovementTips` → `Improvement Tips`) and turns loose lines
/// into `- ` bullets. Headings, existing bullets, `Label:` lines and score lines stay as-is.
pub fn bulletize(text: &str) -> String {
    let text = LOWER_UPPER_RE.replace_all(text, "$1 $2");
    let text = UPPER_RUN_RE.replace_all(&text, "$1 $2");

    text.split('\n')
        .map(|line| {
            let trimmed = line.trim();
            let keep = trimmed.is_empty()
                || line.starts_with('#')
                || line.starts_with('-')
                || line.starts_with('*')
                || line.contains(':')
                || FRACTION_RE.is_match(line);
            if keep {
                line.to_string()
            } else {
                format!("- {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_score_fraction() {
        let score = extract_score("## ATS Score: 78/100\n- Clear layout").unwrap();
        assert_eq!(score, AtsScore { score: 78, total: 100 });
    }

    #[test]
    fn test_extract_score_label_only() {
        let score = extract_score("Overall score: 64 with room to grow").unwrap();
        assert_eq!(score, AtsScore { score: 64, total: 100 });
    }

    #[test]
    fn test_extract_score_percent() {
        assert_eq!(
            extract_score("Keyword match 55%"),
            Some(AtsScore { score: 55, total: 100 })
        );
    }

    #[test]
    fn test_extract_score_out_of() {
        assert_eq!(
            extract_score("Rated 7 out of 10"),
            Some(AtsScore { score: 7, total: 10 })
        );
    }

    #[test]
    fn test_extract_score_none() {
        assert_eq!(extract_score("No numbers here"), None);
    }


    #[test]
    fn test_strip_score_removes_patterns_and_blank_lines() {
        let text = "## ATS Score: 78/100\n\n## Strengths\n- 90% keyword match\n\n\n- Rated 8 out of 10";
        assert_eq!(
            strip_score(text),
            "## ATS Score: \n## Strengths\n-  keyword match\n- Rated"
        );
    }

    #[test]
    fn test_bulletize_splits_camel_case() {
        assert_eq!(bulletize("## ImprovementTips"), "## Improvement Tips");
        assert_eq!(bulletize("## ATSScore"), "## ATS Score");
    }

    #[test]
    fn test_bulletize_prefixes_loose_lines() {
        let text = "## Strengths\nSolid fundamentals\n- already bullet\nAction Plan: practice\n85/100\n";
        assert_eq!(
            bulletize(text),
            "## Strengths\n- Solid fundamentals\n- already bullet\nAction Plan: practice\n85/100\n"
        );
    }
}
