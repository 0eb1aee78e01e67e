//! Prompt assembly for commit message generation.

use super::GenerateOptions;

/// Placeholder in the user prompt that the staged diff replaces.
pub const DIFF_PLACEHOLDER: &str = "{diff}";

/// System prompt establishing the output contract with the model.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a Git commit message generator. Analyze the provided diff and generate commit messages following Conventional Commits specification.

## Rules
1. Format: <type>(<scope>): <description>
2. Types: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
3. Scope: Infer from semantic context; use file paths as hints when unclear (e.g., src/auth/ -> auth). Omit if no clear scope.
4. Description: imperative mood, lowercase, no period, keep under 72 characters for the first line
5. No emojis

## Split Detection
If the diff contains multiple unrelated changes (different features, fixes, or concerns, etc.), set suggest_split: true and provide separate commit messages.

## Output JSON
You MUST respond with valid JSON only, no other text:
{
  "suggest_split": boolean,
  "commits": [
    {
      "message": "feat(auth): add JWT token validation",
      "files": ["src/auth/jwt.rs"],
      "reasoning": "Brief explanation for logging"
    }
  ]
}"#;

/// User prompt template wrapping the diff in a fenced block.
pub const DEFAULT_USER_PROMPT: &str =
    "Analyze this git diff and generate commit message(s):\n\n```diff\n{diff}\n```";

/// Assemble the full prompt: system section, separator, then user section
/// with the diff substituted in.
pub fn build_prompt(options: &GenerateOptions, diff: &str) -> String {
    let user = options.user_prompt.replace(DIFF_PLACEHOLDER, diff);
    format!("{}\n\n---\n\n{}", options.system_prompt, user)
}
