use crate::config::MailtoConfig;
use crate::error::UnsubscribeError;
use crate::header::{LIST_UNSUBSCRIBE, header_value, parse_target, parse_unsubscribe_header};
use crate::links::{html_parts, unsubscribe_links};
use crate::mailbox::Mailbox;
use crate::models::{Message, UnsubscribeTarget};
use crate::prompt::Prompter;
use base64::{Engine as _, engine::general_purpose};
use tracing::{debug, info, warn};

/// Carries out unsubscribe requests against one mailbox, asking the user to
/// confirm anything that happens in a browser.
pub struct Executor<'a, M: ?Sized, P: ?Sized> {
    mailbox: &'a M,
    prompter: &'a P,
    mailto: &'a MailtoConfig,
}

impl<'a, M, P> Executor<'a, M, P>
where
    M: Mailbox + ?Sized,
    P: Prompter + ?Sized,
{
    pub fn new(mailbox: &'a M, prompter: &'a P, mailto: &'a MailtoConfig) -> Self {
        Self {
            mailbox,
            prompter,
            mailto,
        }
    }

    /// Tries the `List-Unsubscribe` header first and the HTML body second.
    /// Returns on the first candidate that succeeds.
    pub async fn unsubscribe(&self, message: &Message) -> Result<bool, UnsubscribeError> {
        if let Some(value) = header_value(message, LIST_UNSUBSCRIBE) {
            for uri in parse_unsubscribe_header(value) {
                if self.execute_uri(&uri).await? {
                    return Ok(true);
                }
            }
        }

        for part in html_parts(message) {
            let links = unsubscribe_links(part);
            debug!(message = %message.id, count = links.len(), "unsubscribe links in html part");
            for link in links {
                match self.execute_uri(&link).await {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(UnsubscribeError::InvalidTarget { target, source }) => {
                        warn!("\tskipping link {:?}: {}", target, source);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(false)
    }

    pub async fn execute_uri(&self, uri: &str) -> Result<bool, UnsubscribeError> {
        let target = parse_target(uri)?;
        self.execute(&target).await
    }

    pub async fn execute(&self, target: &UnsubscribeTarget) -> Result<bool, UnsubscribeError> {
        debug!(%target, "trying unsubscribe target");
        match target {
            UnsubscribeTarget::Mailto {
                recipient,
                subject,
                body,
            } => {
                info!("sending unsubscribe email to {}", recipient);
                let subject = subject.as_deref().unwrap_or(&self.mailto.subject);
                let body = body.as_deref().unwrap_or(&self.mailto.body);
                self.mailbox
                    .send_raw(&compose_email(recipient, subject, body))
                    .await?;
                info!("unsubscribe email sent");
                Ok(true)
            }
            UnsubscribeTarget::Web { url } => Ok(self.prompter.confirm_link(url).await?),
        }
    }
}

pub fn compose_email(to: &str, subject: &str, body: &str) -> String {
    format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        encode_header(to),
        encode_header(subject),
        body
    )
}

/// Header text on a single line. Control characters become spaces and
/// non-ASCII text is sent as RFC 2047 encoded words.
fn encode_header(value: &str) -> String {
    let line: String = value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if line.is_ascii() {
        return line;
    }

    // Encoded words are capped at 75 characters; 39 bytes encode to 52.
    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in line.chars() {
        if chunk.len() + c.len_utf8() > 39 {
            words.push(std::mem::take(&mut chunk));
        }
        chunk.push(c);
    }
    words.push(chunk);

    words
        .iter()
        .map(|w| format!("=?UTF-8?B?{}?=", general_purpose::STANDARD.encode(w)))
        .collect::<Vec<_>>()
        .join("\r\n ")
}
