use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbound chat message as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Identifier of the channel the message arrived on
    pub channel: String,
    /// Channel-qualified sender identity, e.g. `irc@alice`
    pub user: String,
    pub body: String,
    /// True when the message was explicitly addressed to the bot
    pub direct: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(channel: impl Into<String>, user: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel: channel.into(),
            user: user.into(),
            body: body.into(),
            direct: false,
            timestamp: Utc::now(),
        }
    }

    /// Message addressed to the bot
    pub fn direct(channel: impl Into<String>, user: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(channel, user, body).with_direct(true)
    }

    pub fn with_direct(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}
