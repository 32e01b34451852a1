use crate::models;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// The remote message store. Every call is a blocking round trip from the
/// pipeline's point of view; failures are returned as-is, never retried.
#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn list_labels(&self) -> Result<Vec<models::Label>>;

    async fn create_label(&self, name: &str) -> Result<models::Label>;

    /// One page of ids matching a free-text query.
    async fn list_messages(
        &self,
        query: &str,
        max_results: Option<u32>,
        page_token: Option<String>,
    ) -> Result<(Vec<String>, Option<String>)>;

    async fn get_message(&self, id: &str) -> Result<models::Message>;

    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> Result<()>;

    /// At most [`MAX_BATCH_IDS`] ids per call.
    async fn batch_modify_labels(
        &self,
        ids: &[String],
        add: &[String],
        remove: &[String],
    ) -> Result<()>;

    /// Delivers an RFC-822 message as the authenticated user.
    async fn send_raw(&self, rfc822: &str) -> Result<()>;
}

/// Upper bound of ids accepted by one batch modification.
pub const MAX_BATCH_IDS: usize = 1000;

/// Follows continuation tokens until the query is exhausted or `limit` ids
/// have been collected.
pub async fn collect_message_ids<M: Mailbox + ?Sized>(
    mailbox: &M,
    query: &str,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut page_token = None;

    loop {
        let remaining = limit.map(|l| l.saturating_sub(ids.len()));
        if remaining == Some(0) {
            break;
        }
        let max_results = remaining.map(|r| u32::try_from(r).unwrap_or(u32::MAX));

        let (page, next_page_token) = mailbox
            .list_messages(query, max_results, page_token)
            .await?;
        debug!(query, page = page.len(), more = next_page_token.is_some(), "listed messages");
        ids.extend(page);

        match next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    if let Some(limit) = limit {
        ids.truncate(limit);
    }
    Ok(ids)
}

pub async fn get_or_create_label_id<M: Mailbox + ?Sized>(mailbox: &M, name: &str) -> Result<String> {
    let labels = mailbox.list_labels().await?;
    if let Some(label) = labels.into_iter().find(|l| l.name == name) {
        return Ok(label.id);
    }

    let label = mailbox
        .create_label(name)
        .await
        .with_context(|| format!("Failed to create label {}", name))?;
    debug!(name, id = %label.id, kind = %label.label_type, "created label");
    Ok(label.id)
}

/// Label ids the pipeline needs, resolved once per run.
#[derive(Debug, Clone)]
pub struct LabelSet {
    pub inbox: String,
    pub unsubscribed: String,
    pub subscription: String,
}

impl LabelSet {
    pub async fn resolve<M: Mailbox + ?Sized>(
        mailbox: &M,
        names: &crate::config::LabelNames,
    ) -> Result<Self> {
        Ok(Self {
            inbox: get_or_create_label_id(mailbox, &names.inbox).await?,
            unsubscribed: get_or_create_label_id(mailbox, &names.unsubscribed).await?,
            subscription: get_or_create_label_id(mailbox, &names.subscription).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelNames;
    use crate::testing::FakeMailbox;

    #[tokio::test]
    async fn test_collect_stops_at_limit_across_pages() {
        let mailbox = FakeMailbox::new().with_page_size(3);
        for i in 0..10 {
            mailbox.add_message(crate::testing::message(&format!("m{}", i), "a@x.com", &[]));
        }

        let ids = collect_message_ids(&mailbox, "anything", Some(7)).await.unwrap();
        assert_eq!(ids.len(), 7);
        assert_eq!(ids[0], "m0");
        assert_eq!(ids[6], "m6");
    }

    #[tokio::test]
    async fn test_collect_without_limit_reads_every_page() {
        let mailbox = FakeMailbox::new().with_page_size(4);
        for i in 0..10 {
            mailbox.add_message(crate::testing::message(&format!("m{}", i), "a@x.com", &[]));
        }

        let ids = collect_message_ids(&mailbox, "anything", None).await.unwrap();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn test_missing_labels_are_created_once() {
        let mailbox = FakeMailbox::new();
        let names = LabelNames::default();

        let first = LabelSet::resolve(&mailbox, &names).await.unwrap();
        let second = LabelSet::resolve(&mailbox, &names).await.unwrap();

        assert_eq!(first.inbox, "INBOX");
        assert_eq!(first.unsubscribed, second.unsubscribed);
        assert_eq!(first.subscription, second.subscription);
        assert_eq!(mailbox.created_labels(), vec!["Unsubscribed", "Subscription"]);
    }
}
