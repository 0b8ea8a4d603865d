//! Console channel for local development

use async_trait::async_trait;
use std::io::Write;

use crate::application::errors::BotError;
use crate::domain::entities::Message;
use crate::domain::traits::Channel;

/// Channel that talks through stdin/stdout
pub struct ConsoleChannel {
    id: String,
    identity: String,
    prefix: String,
}

impl ConsoleChannel {
    pub fn new(id: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            identity: identity.into(),
            prefix: "!".to_string(),
        }
    }

    /// Lines starting with the prefix are addressed to the bot
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Turn an input line into a message, `None` for blank lines
    pub fn parse_line(&self, line: &str) -> Option<Message> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let message = match line.strip_prefix(self.prefix.as_str()) {
            Some(body) => Message::direct(self.id.as_str(), self.identity.as_str(), body.trim_start()),
            None => Message::new(self.id.as_str(), self.identity.as_str(), line),
        };
        Some(message)
    }

    pub fn prompt(&self) {
        print!("> ");
        let _ = std::io::stdout().flush();
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn say(&self, _message: &Message, response: &str) -> Result<(), BotError> {
        println!("[bot] {}", response);
        Ok(())
    }

    async fn reply(&self, message: &Message, response: &str) -> Result<(), BotError> {
        println!("[bot] {}: {}", message.user, response);
        Ok(())
    }

    async fn action(&self, _message: &Message, response: &str) -> Result<(), BotError> {
        println!("* {}", response);
        Ok(())
    }
}
