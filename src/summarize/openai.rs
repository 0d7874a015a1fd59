//! OpenAI-compatible chat-completions summarizer.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{SummarizeError, Summarizer, SummaryContext};
use crate::domain::{SummaryConfig, TextChunk};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that provides concise, technically \
accurate code summaries for LLM context.";

/// Longest error body kept in a diagnostic.
const MAX_ERROR_BODY: usize = 300;

/// Summarizer backed by a `chat/completions` endpoint.
#[derive(Debug)]
pub struct OpenAiSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    api_key_env: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiSummarizer {
    /// Build a client from config. The API key is read from the environment
    /// variable named in `api_key_env` (a `.env` file is honored); a missing key
    /// surfaces as a permanent error on first use.
    pub fn from_config(config: &SummaryConfig) -> Result<Self, SummarizeError> {
        dotenvy::dotenv().ok();
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SummarizeError::Permanent(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&config.api_base),
            model: config.model.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            temperature: config.temperature,
            max_tokens: config.max_response_tokens,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(
        &self,
        chunk: &TextChunk,
        context: &SummaryContext<'_>,
    ) -> Result<String, SummarizeError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| SummarizeError::Permanent(format!("{} not set", self.api_key_env)))?;

        let prompt = build_prompt(chunk, context);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| SummarizeError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| SummarizeError::Transient(format!("malformed response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| SummarizeError::Transient("response contained no summary".to_string()))
    }
}

/// Map a non-success HTTP status to the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> SummarizeError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body.trim(), MAX_ERROR_BODY));
    match status.as_u16() {
        408 | 409 | 429 => SummarizeError::Transient(detail),
        _ if status.is_server_error() => SummarizeError::Transient(detail),
        401 | 403 => SummarizeError::Permanent(format!("authentication failed ({detail})")),
        _ => SummarizeError::Permanent(detail),
    }
}

/// User prompt for one chunk.
pub fn build_prompt(chunk: &TextChunk, context: &SummaryContext<'_>) -> String {
    let part = if context.total_chunks > 1 {
        format!(
            "\nPart: {} of {} (lines {}-{}); summarize only this part.",
            context.chunk_index + 1,
            context.total_chunks,
            chunk.start_line,
            chunk.end_line
        )
    } else {
        String::new()
    };
    format!(
        "Analyze this file from the '{project}' project. These summaries will be used as \
context for an LLM to understand the codebase.

File path: {filename}{part}

For your summary:
1. Explain the primary purpose of this file
2. Mention key functionality or components it implements
3. Note any important dependencies or relationships to other files (if apparent)
4. Focus on what would be most helpful for understanding the code's role in the project

Content:
{content}

Provide a concise, informative summary in 1-3 sentences.",
        project = context.project,
        filename = context.filename,
        content = chunk.content,
    )
}

fn chat_endpoint(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> TextChunk {
        TextChunk {
            id: "abc".to_string(),
            path: "src/lib.rs".to_string(),
            index: 1,
            start_line: 10,
            end_line: 20,
            content: content.to_string(),
            token_estimate: 3,
        }
    }

    #[test]
    fn status_classification() {
        assert!(!classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_permanent());
        assert!(!classify_status(StatusCode::BAD_GATEWAY, "").is_permanent());
        assert!(!classify_status(StatusCode::REQUEST_TIMEOUT, "").is_permanent());
        assert!(classify_status(StatusCode::UNAUTHORIZED, "").is_permanent());
        assert!(classify_status(StatusCode::FORBIDDEN, "").is_permanent());
        assert!(classify_status(StatusCode::NOT_FOUND, "no such model").is_permanent());
    }

    #[test]
    fn error_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let SummarizeError::Transient(detail) = err else {
            panic!("expected transient");
        };
        assert!(detail.len() < 400);
    }

    #[test]
    fn prompt_names_project_file_and_part() {
        let context = SummaryContext {
            project: "demo",
            filename: "src/lib.rs",
            chunk_index: 1,
            total_chunks: 3,
        };
        let prompt = build_prompt(&chunk("pub fn hello() {}"), &context);
        assert!(prompt.contains("'demo' project"));
        assert!(prompt.contains("File path: src/lib.rs"));
        assert!(prompt.contains("Part: 2 of 3 (lines 10-20)"));
        assert!(prompt.contains("pub fn hello() {}"));
    }

    #[test]
    fn single_chunk_prompt_has_no_part_line() {
        let context =
            SummaryContext { project: "demo", filename: "a.txt", chunk_index: 0, total_chunks: 1 };
        assert!(!build_prompt(&chunk("x"), &context).contains("Part:"));
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(
            chat_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn missing_key_is_a_permanent_error() {
        let config = SummaryConfig {
            api_key_env: "TREE_CONTEXT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..SummaryConfig::default()
        };
        let summarizer = OpenAiSummarizer::from_config(&config).expect("client builds");
        assert!(!summarizer.has_api_key());

        let context =
            SummaryContext { project: "demo", filename: "a.txt", chunk_index: 0, total_chunks: 1 };
        let err = summarizer.summarize(&chunk("x"), &context).expect_err("no key");
        assert_eq!(
            err,
            SummarizeError::Permanent("TREE_CONTEXT_TEST_KEY_THAT_IS_NEVER_SET not set".to_string())
        );
    }
}
