use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "settings.toml";

#[derive(Debug, Parser)]
#[command(name = "gmail-unsubscribe", version, about = "Unsubscribe from bulk mail, one sender at a time")]
pub struct Cli {
    /// Check this many messages for links
    #[arg(long)]
    pub count: Option<usize>,

    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log remote calls
    #[arg(long)]
    pub debug: bool,

    /// Forget the stored OAuth token and exit
    #[arg(long)]
    pub reset_token: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credentials_path: PathBuf,
    pub default_count: usize,
    pub search_term: String,
    pub labels: LabelNames,
    pub mailto: MailtoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelNames {
    pub unsubscribed: String,
    pub subscription: String,
    pub inbox: String,
}

/// Used when a `mailto:` target carries no subject or body of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailtoConfig {
    pub subject: String,
    pub body: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("credentials.json"),
            default_count: 10,
            search_term: "unsubscribe".to_string(),
            labels: LabelNames::default(),
            mailto: MailtoConfig::default(),
        }
    }
}

impl Default for LabelNames {
    fn default() -> Self {
        Self {
            unsubscribed: "Unsubscribed".to_string(),
            subscription: "Subscription".to_string(),
            inbox: "INBOX".to_string(),
        }
    }
}

impl Default for MailtoConfig {
    fn default() -> Self {
        Self {
            subject: "Unsubscribe request".to_string(),
            body: "Please unsubscribe me from this list".to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        use std::fs;
        let path = path.as_ref();
        if let Ok(content) = fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!("ignoring {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Inbox messages mentioning the search term that carry neither decision label.
    pub fn candidate_query(&self) -> String {
        [
            self.search_term.clone(),
            format!("-label:{}", self.labels.unsubscribed),
            format!("-label:{}", self.labels.subscription),
            format!("label:{}", self.labels.inbox),
        ]
        .join(" ")
    }
}
