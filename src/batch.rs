use crate::mailbox::{MAX_BATCH_IDS, Mailbox, collect_message_ids};
use anyhow::{Context, Result};
use tracing::debug;

pub fn sender_query(sender: &str) -> String {
    format!("from:{}", sender)
}

/// Applies one label change to every message from `sender`, one remote call
/// per chunk of [`MAX_BATCH_IDS`]. Chunks already applied stay applied when a
/// later one fails. Returns the number of messages touched.
pub async fn batch_apply<M: Mailbox + ?Sized>(
    mailbox: &M,
    sender: &str,
    add: &[String],
    remove: &[String],
) -> Result<usize> {
    if add.is_empty() && remove.is_empty() {
        return Ok(0);
    }

    let ids = collect_message_ids(mailbox, &sender_query(sender), None).await?;
    for (i, chunk) in ids.chunks(MAX_BATCH_IDS).enumerate() {
        debug!(sender, chunk = i, size = chunk.len(), "batch modify");
        mailbox
            .batch_modify_labels(chunk, add, remove)
            .await
            .with_context(|| format!("Failed to relabel messages from {} (chunk {})", sender, i))?;
    }

    Ok(ids.len())
}
