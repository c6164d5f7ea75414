//! Request constants for the describe call.

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub const MAX_TOKENS: u32 = 1024;

pub const DESCRIBE_PROMPT: &str = "\
Describe what is shown in this screenshot. Start with a one-sentence summary, \
then list any readable text, UI elements, charts or code you can identify. \
Be concise and do not speculate about things that are not visible.";
