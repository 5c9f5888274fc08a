// Shared prompt fragments.
// Each analysis defines its own template in analysis/prompts.rs; this file holds the
// cross-cutting style rules so every answer parses into the same section shape.

/// Style rule prepended to every analysis prompt.
pub const BULLET_STYLE_INSTRUCTION: &str =
    "Use ONLY bullet points. Keep each point under 8 words.";

/// Asks for markdown output with `##` headings, which the section parser treats as topic headings.
pub const MARKDOWN_HEADINGS_INSTRUCTION: &str = "Format as markdown with proper headings.";
