// Analysis API: GitHub profile, LeetCode progress and resume ATS review.
// Every route ends the same way: prompt → llm_client → sections::parse → render.
// All LLM calls go through llm_client; nothing here talks to Gemini directly.

pub mod handlers;
pub mod postprocess;
pub mod prompts;
