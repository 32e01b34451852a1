use crate::batch::batch_apply;
use crate::config::MailtoConfig;
use crate::executor::Executor;
use crate::header::header_value;
use crate::mailbox::{LabelSet, Mailbox, collect_message_ids};
use crate::memory::SenderMemory;
use crate::models::{Decision, Message};
use crate::prompt::Prompter;
use anyhow::Result;
use std::fmt;
use tracing::{debug, info, warn};

/// How a single message was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already labelled `Subscription`.
    AlreadySubscribed,
    /// Sender was whitelisted earlier in the run; this message got the label.
    MarkedSubscribed,
    /// Already labelled `Unsubscribed`.
    AlreadyUnsubscribed,
    /// Sender was unsubscribed earlier in the run; this message got the label.
    MarkedUnsubscribed,
    /// User answered `no`.
    Skipped,
    /// No `From` header to key a decision on.
    NoSender,
    /// User answered `never`.
    Whitelisted,
    Unsubscribed,
    /// User answered `yes` but no unsubscribe target worked.
    Failed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: usize,
    pub already_subscribed: usize,
    pub already_unsubscribed: usize,
    pub caught_up: usize,
    pub skipped: usize,
    pub no_sender: usize,
    pub whitelisted: usize,
    pub unsubscribed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: Outcome) {
        self.scanned += 1;
        match outcome {
            Outcome::AlreadySubscribed => self.already_subscribed += 1,
            Outcome::AlreadyUnsubscribed => self.already_unsubscribed += 1,
            Outcome::MarkedSubscribed | Outcome::MarkedUnsubscribed => self.caught_up += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::NoSender => self.no_sender += 1,
            Outcome::Whitelisted => self.whitelisted += 1,
            Outcome::Unsubscribed => self.unsubscribed += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scanned: {} unsubscribed, {} whitelisted, {} caught up, {} already decided, {} skipped, {} without sender, {} failed",
            self.scanned,
            self.unsubscribed,
            self.whitelisted,
            self.caught_up,
            self.already_subscribed + self.already_unsubscribed,
            self.skipped,
            self.no_sender,
            self.failed
        )
    }
}

/// Decides, message by message, whether a sender gets unsubscribed, and
/// records the decision as labels on all of that sender's mail.
pub struct Engine<'a, M: ?Sized, P: ?Sized> {
    mailbox: &'a M,
    prompter: &'a P,
    labels: &'a LabelSet,
    executor: Executor<'a, M, P>,
}

impl<'a, M, P> Engine<'a, M, P>
where
    M: Mailbox + ?Sized,
    P: Prompter + ?Sized,
{
    pub fn new(mailbox: &'a M, prompter: &'a P, labels: &'a LabelSet, mailto: &'a MailtoConfig) -> Self {
        Self {
            mailbox,
            prompter,
            labels,
            executor: Executor::new(mailbox, prompter, mailto),
        }
    }

    /// Classifies up to `count` messages matching `query`, strictly in order.
    /// Any remote failure aborts the rest of the queue.
    pub async fn run(&self, query: &str, count: usize) -> Result<RunSummary> {
        let mut memory = SenderMemory::default();
        let mut summary = RunSummary::default();

        let ids = collect_message_ids(self.mailbox, query, Some(count)).await?;
        info!("found {} candidate messages", ids.len());

        for id in ids {
            let message = self.mailbox.get_message(&id).await?;
            let outcome = self.classify(&message, &mut memory).await?;
            summary.record(outcome);
        }

        info!(
            "{} senders whitelisted, {} unsubscribed this run",
            memory.whitelisted_count(),
            memory.unsubscribed_count()
        );
        Ok(summary)
    }

    /// The checks run in a fixed order and the first match wins.
    pub async fn classify(&self, message: &Message, memory: &mut SenderMemory) -> Result<Outcome> {
        let subject = header_value(message, "Subject").unwrap_or_default();
        let Some(sender) = header_value(message, "From") else {
            warn!(message = %message.id, "message has no From header, skipping");
            return Ok(Outcome::NoSender);
        };
        info!("parsing {} from {}", subject, sender);

        let labels = self.labels;

        if message.has_label(&labels.subscription) {
            memory.mark_whitelisted(sender);
            return Ok(Outcome::AlreadySubscribed);
        }

        if memory.is_whitelisted(sender) {
            info!("\tmarking \"{}\" as subscribed", sender);
            self.mailbox
                .modify_labels(&message.id, &[labels.subscription.clone()], &[])
                .await?;
            return Ok(Outcome::MarkedSubscribed);
        }

        if message.has_label(&labels.unsubscribed) {
            memory.mark_unsubscribed(sender);
            return Ok(Outcome::AlreadyUnsubscribed);
        }

        if memory.is_unsubscribed(sender) {
            info!("\tmarking \"{}\" as unsubscribed", sender);
            self.mailbox
                .modify_labels(
                    &message.id,
                    &[labels.unsubscribed.clone()],
                    &[labels.inbox.clone()],
                )
                .await?;
            return Ok(Outcome::MarkedUnsubscribed);
        }

        let decision = self.prompter.decide(subject, sender).await?;
        debug!(%decision, sender, "decision");
        match decision {
            Decision::No => Ok(Outcome::Skipped),
            Decision::Never => {
                memory.mark_whitelisted(sender);
                info!("\tmarking all \"{}\" as subscribed", sender);
                let n = batch_apply(self.mailbox, sender, &[labels.subscription.clone()], &[]).await?;
                info!("\t{} messages labelled {}", n, labels.subscription);
                Ok(Outcome::Whitelisted)
            }
            Decision::Yes => match self.executor.unsubscribe(message).await {
                Ok(true) => {
                    memory.mark_unsubscribed(sender);
                    info!("\tmarking all \"{}\" as unsubscribed", sender);
                    let n = batch_apply(
                        self.mailbox,
                        sender,
                        &[labels.unsubscribed.clone()],
                        &[labels.inbox.clone()],
                    )
                    .await?;
                    info!("\t{} messages moved out of the inbox", n);
                    Ok(Outcome::Unsubscribed)
                }
                Ok(false) => {
                    warn!("\tcould not unsubscribe from \"{}\"", sender);
                    Ok(Outcome::Failed)
                }
                Err(e) if e.is_per_message() => {
                    warn!("\tunsubscribe from \"{}\" aborted: {}", sender, e);
                    Ok(Outcome::Failed)
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}
