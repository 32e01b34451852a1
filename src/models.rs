use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub label_type: String, // 'system' or 'user'
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// One node of the MIME tree. `body_data` holds the body as delivered by the
/// remote store, usually URL-safe base64.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePart {
    pub mime_type: String,
    pub body_data: Option<Vec<u8>>,
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    pub fn has_body(&self) -> bool {
        self.body_data.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// Snapshot of a message, fetched once per id and never mutated locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub headers: Vec<Header>,
    pub label_ids: HashSet<String>,
    pub payload: Option<MessagePart>,
}

impl Message {
    pub fn has_label(&self, label_id: &str) -> bool {
        self.label_ids.contains(label_id)
    }
}

/// Answer to "Do you want to unsubscribe from this email?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    #[default]
    Yes,
    No,
    /// Sticky whitelist for the sender.
    Never,
}

impl Decision {
    pub const CHOICES: [&'static str; 3] = ["yes", "no", "never"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Yes => "yes",
            Decision::No => "no",
            Decision::Never => "never",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => Ok(Decision::Yes),
            "no" | "n" => Ok(Decision::No),
            "never" => Ok(Decision::Never),
            other => Err(format!(
                "expected one of {}, got {:?}",
                Decision::CHOICES.join(", "),
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeTarget {
    Mailto {
        recipient: String,
        subject: Option<String>,
        body: Option<String>,
    },
    /// An `http` or `https` URL.
    Web { url: String },
}

impl fmt::Display for UnsubscribeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsubscribeTarget::Mailto { recipient, .. } => write!(f, "mailto:{}", recipient),
            UnsubscribeTarget::Web { url } => f.write_str(url),
        }
    }
}
