use async_trait::async_trait;
use crate::domain::entities::Message;
use crate::application::errors::BotError;

/// Channel trait - a transport that messages arrive on and responses go out through
#[async_trait]
pub trait Channel: Send + Sync {
    /// Identifier messages carry in their `channel` field
    fn id(&self) -> &str;

    /// Send a response into the conversation the message came from
    async fn say(&self, message: &Message, response: &str) -> Result<(), BotError>;

    /// Respond addressed to the sender
    async fn reply(&self, message: &Message, response: &str) -> Result<(), BotError> {
        self.say(message, response).await
    }

    /// Respond as an emote / action line
    async fn action(&self, message: &Message, response: &str) -> Result<(), BotError> {
        self.say(message, response).await
    }
}
