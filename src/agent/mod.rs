//! Question answering over the fetched yield table.
//!
//! The conversation is a plain value threaded through each turn: callers
//! pass the current `Conversation` in and get the extended one back. The
//! agent sees the wide table exactly as fetched, never the long form.

use std::fmt::Write as _;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::domain::WideSeriesTable;
use crate::error::AppError;

pub const WELCOME: &str = "Welcome to Treasury Yield Tracker!";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You answer questions about US Treasury constant-maturity yields. \
Values are annual yields in percent, one row per trading day. \
Answer only from the table below; say so when it does not contain the answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Message history of one chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation holding the assistant's welcome line.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, WELCOME)],
        }
    }

    /// Drop the history and start over.
    pub fn cleared(self) -> Self {
        Self::new()
    }

    pub fn with_user(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(Role::User, prompt));
        self
    }

    pub fn with_assistant(mut self, reply: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(Role::Assistant, reply));
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Something that can answer a question about a yield table.
pub trait Agent {
    fn respond(&self, table: &WideSeriesTable, history: &[ChatMessage]) -> Result<String, AppError>;
}

/// Run one question/answer turn and return the extended conversation.
///
/// The input conversation is left as it was, so a failed turn records nothing.
pub fn ask(
    agent: &dyn Agent,
    table: &WideSeriesTable,
    conversation: &Conversation,
    prompt: &str,
) -> Result<Conversation, AppError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::new(2, "Question is empty."));
    }
    let pending = conversation.clone().with_user(prompt);
    let reply = agent.respond(table, pending.messages())?;
    Ok(pending.with_assistant(reply))
}

/// Render the wide table as CSV for the model's context.
pub fn table_context(table: &WideSeriesTable, floor: Option<NaiveDate>) -> String {
    let table = match floor {
        Some(floor) => table.since(floor),
        None => table.clone(),
    };
    let series: Vec<_> = table.series().collect();

    let mut out = String::from("date");
    for s in &series {
        out.push(',');
        out.push_str(s.label());
    }
    out.push('\n');

    for (row, date) in table.dates().iter().enumerate() {
        let _ = write!(out, "{date}");
        for &s in &series {
            out.push(',');
            if let Some(v) = table.column(s).and_then(|cells| cells[row]) {
                let _ = write!(out, "{v}");
            }
        }
        out.push('\n');
    }
    out
}

/// OpenAI-compatible chat completions client.
pub struct ChatCompletionsAgent {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    context_floor: Option<NaiveDate>,
}

impl ChatCompletionsAgent {
    pub fn from_env(model: &str, context_floor: Option<NaiveDate>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AppError::new(2, "Missing OPENAI_API_KEY in environment (.env)."))?;
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
            model: model.to_string(),
            context_floor,
        })
    }

    fn request_body(&self, table: &WideSeriesTable, history: &[ChatMessage]) -> ChatRequest {
        let context = table_context(table, self.context_floor);
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::new(
            Role::System,
            format!("{SYSTEM_PROMPT}\n\n{context}"),
        ));
        messages.extend(history.iter().cloned());
        ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages,
        }
    }
}

impl Agent for ChatCompletionsAgent {
    fn respond(&self, table: &WideSeriesTable, history: &[ChatMessage]) -> Result<String, AppError> {
        let body = self.request_body(table, history);
        log::info!(
            "asking {} ({} messages, {} table rows)",
            self.model,
            body.messages.len(),
            table.len()
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| AppError::new(4, format!("Agent request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Agent request failed with status {}.", resp.status()),
            ));
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse agent response: {e}")))?;
        extract_reply(parsed)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

fn extract_reply(resp: ChatResponse) -> Result<String, AppError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(4, "Agent returned an empty reply."))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::domain::SeriesName;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table() -> WideSeriesTable {
        WideSeriesTable::from_series(vec![
            (SeriesName::FiveYear, vec![(d(2023, 1, 30), 3.6)]),
            (SeriesName::TenYear, vec![(d(2023, 1, 30), 3.55), (d(2023, 1, 31), 3.52)]),
        ])
    }

    struct Canned {
        seen: RefCell<Vec<usize>>,
        reply: Result<String, AppError>,
    }

    impl Agent for Canned {
        fn respond(&self, _table: &WideSeriesTable, history: &[ChatMessage]) -> Result<String, AppError> {
            self.seen.borrow_mut().push(history.len());
            self.reply.clone()
        }
    }

    #[test]
    fn conversation_starts_with_welcome_and_clears() {
        let convo = Conversation::new().with_user("hi").with_assistant("hello");
        assert_eq!(convo.messages().len(), 3);
        assert_eq!(convo.messages()[0], ChatMessage::new(Role::Assistant, WELCOME));
        assert_eq!(convo.cleared(), Conversation::new());
    }

    #[test]
    fn ask_threads_history_through_one_turn() {
        let agent = Canned {
            seen: RefCell::new(Vec::new()),
            reply: Ok("3.52".to_string()),
        };
        let convo = ask(&agent, &table(), &Conversation::new(), "  10y at month end?  ").unwrap();
        assert_eq!(*agent.seen.borrow(), vec![2]);
        let msgs = convo.messages();
        assert_eq!(msgs[1], ChatMessage::new(Role::User, "10y at month end?"));
        assert_eq!(convo.last(), Some(&ChatMessage::new(Role::Assistant, "3.52")));
    }

    #[test]
    fn failed_turn_is_an_error_and_empty_prompt_is_rejected() {
        let agent = Canned {
            seen: RefCell::new(Vec::new()),
            reply: Err(AppError::new(4, "down")),
        };
        assert_eq!(ask(&agent, &table(), &Conversation::new(), "q").unwrap_err().exit_code(), 4);
        assert_eq!(ask(&agent, &table(), &Conversation::new(), "   ").unwrap_err().exit_code(), 2);
        assert_eq!(agent.seen.borrow().len(), 1);
    }

    #[test]
    fn table_context_renders_wide_csv() {
        assert_eq!(
            table_context(&table(), None),
            "date,5 Year,10 Year\n2023-01-30,3.6,3.55\n2023-01-31,,3.52\n"
        );
        assert_eq!(
            table_context(&table(), Some(d(2023, 1, 31))),
            "date,5 Year,10 Year\n2023-01-31,,3.52\n"
        );
    }

    #[test]
    fn request_serializes_roles_lowercase() {
        let msg = serde_json::to_value(ChatMessage::new(Role::User, "x")).unwrap();
        assert_eq!(msg, serde_json::json!({"role": "user", "content": "x"}));
    }

    #[test]
    fn reply_extraction() {
        let ok: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":" 4.0 "}}]}"#).unwrap();
        assert_eq!(extract_reply(ok).unwrap(), "4.0");
        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(extract_reply(empty).unwrap_err().exit_code(), 4);
    }
}
