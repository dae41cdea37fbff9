use serde::Serialize;

use crate::models::Chunk;

pub const COMMIT_MESSAGE_PROMPT: &str = r#"You are an experienced software engineer writing git commit messages.
Given a diff (or a part of a larger diff), write a single commit message:
- A concise subject line in the imperative mood, at most 72 characters
- A blank line, then a short body explaining what changed and why, wrapped at 72 characters
- Do not describe files you cannot see in the diff
Respond with the commit message only, without code fences or commentary."#;

pub const CODE_REVIEW_PROMPT: &str = r#"You are a meticulous senior engineer reviewing a code change.
Given a diff (or a part of a larger diff), point out:
- Bugs, incorrect logic and unhandled edge cases
- Security or concurrency problems
- Readability and maintainability issues worth fixing
Reference file names and the relevant lines. Be specific and brief; skip praise.
If nothing needs attention, say so in one sentence."#;

pub const PULL_REQUEST_PROMPT: &str = r#"You are a software engineer preparing a pull request description.
Given a diff between a branch and its base (or a part of it), write:
- A short title
- A summary paragraph of the change
- A bulleted list of notable changes
- Anything reviewers should pay special attention to
Use Markdown. Do not invent changes that are not in the diff."#;

/// What the model is asked to produce from a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    CommitMessage,
    CodeReview,
    PullRequestSummary,
}

impl GenerationTask {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            GenerationTask::CommitMessage => COMMIT_MESSAGE_PROMPT,
            GenerationTask::CodeReview => CODE_REVIEW_PROMPT,
            GenerationTask::PullRequestSummary => PULL_REQUEST_PROMPT,
        }
    }

    pub fn max_output_tokens(&self) -> u32 {
        match self {
            GenerationTask::CommitMessage => 500,
            GenerationTask::CodeReview => 2_000,
            GenerationTask::PullRequestSummary => 1_500,
        }
    }

    pub fn to_prompt(&self, chunk: &Chunk) -> String {
        let intro = match self {
            GenerationTask::CommitMessage => "Write a commit message for the following changes",
            GenerationTask::CodeReview => "Review the following changes",
            GenerationTask::PullRequestSummary => "Describe the following branch changes",
        };

        let mut prompt = format!("{} ({}):\n\n", intro, chunk.label);
        if chunk.part.is_some() {
            prompt.push_str("Note: this is one part of a larger change to the same file.\n\n");
        }
        prompt.push_str("```diff\n");
        prompt.push_str(&chunk.content);
        if !chunk.content.ends_with('\n') {
            prompt.push('\n');
        }
        prompt.push_str("```\n");
        prompt
    }
}

impl std::fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationTask::CommitMessage => write!(f, "commit message"),
            GenerationTask::CodeReview => write!(f, "code review"),
            GenerationTask::PullRequestSummary => write!(f, "pull request summary"),
        }
    }
}
