// Prompt templates for the three analyses.
// Placeholders in `{braces}` are substituted by the builders below.

use crate::github::GitHubData;
use crate::llm_client::prompts::{BULLET_STYLE_INSTRUCTION, MARKDOWN_HEADINGS_INSTRUCTION};

/// Number of repositories summarized in the GitHub prompt.
pub const TOP_REPO_COUNT: usize = 4;

/// Characters of resume text included in the prompt.
pub const RESUME_EXCERPT_CHARS: usize = 1500;

pub const GITHUB_PROMPT_TEMPLATE: &str = r#"Analyze this GitHub profile. {style} {format}

Profile: {name} | {public_repos} repos | {followers} followers
Top repos: {repo_summaries}

Structure:
## Repository Analysis
- [3 short bullet points about repos]

## Improvement Tips
- [3 actionable tips, max 8 words each]"#;

pub const LEETCODE_PROMPT_TEMPLATE: &str = r#"Analyze LeetCode progress. {style} {format}

Stats: {total} solved (Easy: {easy}, Medium: {medium}, Hard: {hard})
Categories: {categories}

Structure:
## Strengths
- [2 bullet points, max 8 words each]

## Areas to Improve
- [2 bullet points, max 8 words each]

## Action Plan
- [3 specific tips, max 8 words each]"#;

/// Grading rubric placed ahead of the resume prompt.
pub const ATS_RUBRIC: &str = "[Analyze the attached resume and provide an Applicant Tracking System (ATS) \
    score that is realistic and accurate, assuming the resume is being evaluated for a typical \
    mid-level software development or tech internship role. Use standard ATS evaluation criteria \
    such as formatting, keyword relevance, section organization (contact, education, experience, \
    skills, etc.), and overall readability. Do not overinflate or deflate the score. Score should \
    be on a 0 to 100 scale. Justify the score with key positives (action verbs, relevant skills, \
    consistent formatting) and key issues (missing keywords, poor layout, excessive white space, \
    lack of measurable impact). The score should represent what a real ATS would likely assign.]";

pub const RESUME_PROMPT_TEMPLATE: &str = r#"{rubric}

Score resume out of 100. {style} {format}

Resume content: {resume_text}...

Structure:
## ATS Score: [X/100]

## Strengths
- [2 bullet points, max 8 words each]

## Weaknesses
- [2 bullet points, max 8 words each]

## Quick Fixes
- [4 actionable tips, max 8 words each]"#;

fn apply_style(template: &str) -> String {
    template
        .replace("{style}", BULLET_STYLE_INSTRUCTION)
        .replace("{format}", MARKDOWN_HEADINGS_INSTRUCTION)
}

/// `name (language) - N⭐` for the first repositories, in API order.
pub fn summarize_repos(data: &GitHubData) -> String {
    data.repos
        .iter()
        .take(TOP_REPO_COUNT)
        .map(|repo| {
            format!(
                "{} ({}) - {}⭐",
                repo.name,
                repo.language.as_deref().unwrap_or("N/A"),
                repo.stargazers_count
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The display name is user-controlled, so it is inserted last.
pub fn build_github_prompt(data: &GitHubData) -> String {
    let name = data
        .profile
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&data.profile.login);

    apply_style(GITHUB_PROMPT_TEMPLATE)
        .replace("{public_repos}", &data.profile.public_repos.to_string())
        .replace("{followers}", &data.profile.followers.to_string())
        .replace("{repo_summaries}", &summarize_repos(data))
        .replace("{name}", name)
}

pub fn build_leetcode_prompt(
    total: u32,
    easy: u32,
    medium: u32,
    hard: u32,
    categories: &[String],
) -> String {
    let categories = serde_json::to_string(categories).unwrap_or_else(|_| "[]".to_string());
    apply_style(LEETCODE_PROMPT_TEMPLATE)
        .replace("{total}", &total.to_string())
        .replace("{easy}", &easy.to_string())
        .replace("{medium}", &medium.to_string())
        .replace("{hard}", &hard.to_string())
        .replace("{categories}", &categories)
}

/// `excerpt` is inserted last so braces inside resume text are never treated as placeholders.
pub fn build_resume_prompt(excerpt: &str) -> String {
    apply_style(RESUME_PROMPT_TEMPLATE)
        .replace("{rubric}", ATS_RUBRIC)
        .replace("{resume_text}", excerpt)
}
