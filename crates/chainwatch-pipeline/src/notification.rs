//! Outbound message model and the filter outcome that carries it.

use serde::{Deserialize, Serialize};

/// A URL call-to-action rendered under the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

impl LinkButton {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// A rendered message plus its optional action links.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Notification {
    /// Markdown body.
    pub text: String,
    /// Rows of buttons.
    #[serde(default)]
    pub buttons: Vec<Vec<LinkButton>>,
    /// Target channel; `None` means the notifier's default.
    #[serde(default)]
    pub channel: Option<String>,
}

impl Notification {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn button_row(mut self, row: Vec<LinkButton>) -> Self {
        if !row.is_empty() {
            self.buttons.push(row);
        }
        self
    }

    pub fn to_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }
}

/// Terminal classification of one decoded event. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Suppressed(String),
    Notify(Notification),
}

impl FilterDecision {
    pub fn suppressed(reason: impl Into<String>) -> Self {
        Self::Suppressed(reason.into())
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Notify(n) => Some(n),
            Self::Suppressed(_) => None,
        }
    }
}
