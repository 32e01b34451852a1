//! In-memory collaborators for unit tests.

use crate::mailbox::Mailbox;
use crate::models::{Decision, Header, Label, Message};
use crate::prompt::Prompter;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Modify {
        id: String,
        add: Vec<String>,
        remove: Vec<String>,
    },
    Batch {
        ids: Vec<String>,
        add: Vec<String>,
        remove: Vec<String>,
    },
    Send(String),
}

#[derive(Default)]
struct State {
    messages: Vec<Message>,
    labels: Vec<Label>,
    created_labels: Vec<String>,
    calls: Vec<Call>,
    batches_before_failure: Option<usize>,
    fail_send: bool,
}

pub struct FakeMailbox {
    state: Mutex<State>,
    page_size: usize,
}

pub fn message(id: &str, from: &str, labels: &[&str]) -> Message {
    Message {
        id: id.to_string(),
        headers: vec![
            Header {
                name: "From".to_string(),
                value: from.to_string(),
            },
            Header {
                name: "Subject".to_string(),
                value: format!("Newsletter {}", id),
            },
        ],
        label_ids: labels.iter().map(|l| l.to_string()).collect(),
        payload: None,
    }
}

impl FakeMailbox {
    pub fn new() -> Self {
        let state = State {
            labels: vec![Label {
                id: "INBOX".to_string(),
                name: "INBOX".to_string(),
                label_type: "system".to_string(),
            }],
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
            page_size: 100,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Batch calls after the first `n` fail.
    pub fn fail_batches_after(&self, n: usize) {
        self.lock().batches_before_failure = Some(n);
    }

    pub fn fail_send(&self) {
        self.lock().fail_send = true;
    }

    pub fn add_message(&self, message: Message) {
        self.lock().messages.push(message);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Send(_)))
            .collect()
    }

    pub fn created_labels(&self) -> Vec<String> {
        self.lock().created_labels.clone()
    }

    pub fn labels_of(&self, id: &str) -> Vec<String> {
        let state = self.lock();
        let mut labels: Vec<String> = state
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.label_ids.iter().cloned().collect())
            .unwrap_or_default();
        labels.sort();
        labels
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn apply(state: &mut State, id: &str, add: &[String], remove: &[String]) {
        if let Some(m) = state.messages.iter_mut().find(|m| m.id == id) {
            m.label_ids.extend(add.iter().cloned());
            for label in remove {
                m.label_ids.remove(label);
            }
        }
    }
}

#[async_trait]
impl Mailbox for FakeMailbox {
    async fn list_labels(&self) -> Result<Vec<Label>> {
        Ok(self.lock().labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<Label> {
        let mut state = self.lock();
        let label = Label {
            id: format!("Label_{}", state.labels.len()),
            name: name.to_string(),
            label_type: "user".to_string(),
        };
        state.labels.push(label.clone());
        state.created_labels.push(name.to_string());
        Ok(label)
    }

    async fn list_messages(
        &self,
        query: &str,
        max_results: Option<u32>,
        page_token: Option<String>,
    ) -> Result<(Vec<String>, Option<String>)> {
        let state = self.lock();
        let matching: Vec<String> = state
            .messages
            .iter()
            .filter(|m| match query.strip_prefix("from:") {
                Some(sender) => crate::header::header_value(m, "From") == Some(sender),
                None => true,
            })
            .map(|m| m.id.clone())
            .collect();

        let start: usize = match page_token {
            Some(token) => token.parse()?,
            None => 0,
        };
        let size = max_results
            .map(|m| (m as usize).min(self.page_size))
            .unwrap_or(self.page_size);
        let end = (start + size).min(matching.len());
        let next = (end < matching.len()).then(|| end.to_string());
        Ok((matching[start..end].to_vec(), next))
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        self.lock()
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no such message {}", id))
    }

    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Modify {
            id: id.to_string(),
            add: add.to_vec(),
            remove: remove.to_vec(),
        });
        Self::apply(&mut state, id, add, remove);
        Ok(())
    }

    async fn batch_modify_labels(
        &self,
        ids: &[String],
        add: &[String],
        remove: &[String],
    ) -> Result<()> {
        let mut state = self.lock();
        if let Some(remaining) = state.batches_before_failure {
            if remaining == 0 {
                bail!("rate limit exceeded");
            }
            state.batches_before_failure = Some(remaining - 1);
        }
        state.calls.push(Call::Batch {
            ids: ids.to_vec(),
            add: add.to_vec(),
            remove: remove.to_vec(),
        });
        for id in ids {
            Self::apply(&mut state, id, add, remove);
        }
        Ok(())
    }

    async fn send_raw(&self, rfc822: &str) -> Result<()> {
        let mut state = self.lock();
        if state.fail_send {
            bail!("connection reset");
        }
        state.calls.push(Call::Send(rfc822.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct Script {
    decisions: VecDeque<Decision>,
    confirmations: VecDeque<bool>,
    prompts: Vec<(String, String)>,
    opened: Vec<String>,
}

/// Answers prompts from a script and fails on any prompt it was not given an
/// answer for.
#[derive(Default)]
pub struct FakePrompter {
    script: Mutex<Script>,
}

impl FakePrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decision(self, decision: Decision) -> Self {
        self.script.lock().unwrap().decisions.push_back(decision);
        self
    }

    pub fn with_confirmation(self, answer: bool) -> Self {
        self.script.lock().unwrap().confirmations.push_back(answer);
        self
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().prompts.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.script.lock().unwrap().opened.clone()
    }
}

#[async_trait]
impl Prompter for FakePrompter {
    async fn decide(&self, subject: &str, sender: &str) -> Result<Decision> {
        let mut script = self.script.lock().unwrap();
        script.prompts.push((subject.to_string(), sender.to_string()));
        script
            .decisions
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected prompt for {}", sender))
    }

    async fn confirm_link(&self, url: &str) -> Result<bool> {
        let mut script = self.script.lock().unwrap();
        script.opened.push(url.to_string());
        script
            .confirmations
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected confirmation for {}", url))
    }
}
