use std::collections::HashSet;

/// What this run has learned about senders, keyed by the literal `From` value.
/// Lives for one run only; the labels in the mailbox are the durable record.
#[derive(Debug, Default)]
pub struct SenderMemory {
    whitelisted: HashSet<String>,
    unsubscribed: HashSet<String>,
}

impl SenderMemory {
    pub fn is_whitelisted(&self, sender: &str) -> bool {
        self.whitelisted.contains(sender)
    }

    pub fn is_unsubscribed(&self, sender: &str) -> bool {
        self.unsubscribed.contains(sender)
    }

    /// The two sets stay disjoint: the latest decision for a sender wins.
    pub fn mark_whitelisted(&mut self, sender: &str) {
        self.unsubscribed.remove(sender);
        self.whitelisted.insert(sender.to_string());
    }

    pub fn mark_unsubscribed(&mut self, sender: &str) {
        self.whitelisted.remove(sender);
        self.unsubscribed.insert(sender.to_string());
    }

    pub fn whitelisted_count(&self) -> usize {
        self.whitelisted.len()
    }

    pub fn unsubscribed_count(&self) -> usize {
        self.unsubscribed.len()
    }
}
