use crate::mailbox::Mailbox;
use crate::models;
use anyhow::{Context, Result};
use async_trait::async_trait;
use google_gmail1::Gmail;
use google_gmail1::api::{
    BatchModifyMessagesRequest, Label, Message, MessagePart, ModifyMessageRequest, Scope,
};
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use std::io::Cursor;
use tracing::debug;

const USER_ID: &str = "me";

#[derive(Clone)]
pub struct GmailClient {
    hub: Gmail<HttpsConnector<HttpConnector>>,
}

impl GmailClient {
    pub fn new(hub: Gmail<HttpsConnector<HttpConnector>>) -> Self {
        Self { hub }
    }
}

fn label_ids(ids: &[String]) -> Option<Vec<String>> {
    (!ids.is_empty()).then(|| ids.to_vec())
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn list_labels(&self) -> Result<Vec<models::Label>> {
        let (_, label_list) = self
            .hub
            .users()
            .labels_list(USER_ID)
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context("Failed to list labels")?;

        let labels = label_list
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(convert_label)
            .collect();

        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<models::Label> {
        let req = Label {
            name: Some(name.to_string()),
            ..Default::default()
        };
        let (_, label) = self
            .hub
            .users()
            .labels_create(req, USER_ID)
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context("Failed to create label")?;

        Ok(convert_label(label))
    }

    async fn list_messages(
        &self,
        query: &str,
        max_results: Option<u32>,
        page_token: Option<String>,
    ) -> Result<(Vec<String>, Option<String>)> {
        let mut req = self
            .hub
            .users()
            .messages_list(USER_ID)
            .q(query)
            .include_spam_trash(false)
            .add_scope(Scope::Modify);

        if let Some(max_results) = max_results {
            req = req.max_results(max_results);
        }

        if let Some(token) = &page_token {
            req = req.page_token(token);
        }

        let (_, message_list) = req.doit().await.context("Failed to list messages")?;

        let ids = message_list
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();

        Ok((ids, message_list.next_page_token))
    }

    async fn get_message(&self, id: &str) -> Result<models::Message> {
        let (_, msg) = self
            .hub
            .users()
            .messages_get(USER_ID, id)
            .format("full")
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context(format!("Failed to get message {}", id))?;

        Ok(convert_message(msg))
    }

    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> Result<()> {
        if add.is_empty() && remove.is_empty() {
            return Ok(());
        }
        debug!(id, ?add, ?remove, "modify labels");

        let req = ModifyMessageRequest {
            add_label_ids: label_ids(add),
            remove_label_ids: label_ids(remove),
        };
        self.hub
            .users()
            .messages_modify(req, USER_ID, id)
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context(format!("Failed to modify labels of message {}", id))?;
        Ok(())
    }

    async fn batch_modify_labels(
        &self,
        ids: &[String],
        add: &[String],
        remove: &[String],
    ) -> Result<()> {
        if ids.is_empty() || (add.is_empty() && remove.is_empty()) {
            return Ok(());
        }

        let req = BatchModifyMessagesRequest {
            ids: Some(ids.to_vec()),
            add_label_ids: label_ids(add),
            remove_label_ids: label_ids(remove),
        };
        self.hub
            .users()
            .messages_batch_modify(req, USER_ID)
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context("Failed to batch modify messages")?;
        Ok(())
    }

    async fn send_raw(&self, rfc822: &str) -> Result<()> {
        debug!(length = rfc822.len(), "sending message");
        let cursor = Cursor::new(rfc822.as_bytes().to_vec());

        self.hub
            .users()
            .messages_send(Message::default(), USER_ID)
            .add_scope(Scope::Modify)
            .upload(cursor, "message/rfc822".parse().context("Invalid mime type")?)
            .await
            .context("Failed to send message")?;

        Ok(())
    }
}

fn convert_label(l: Label) -> models::Label {
    models::Label {
        id: l.id.unwrap_or_default(),
        name: l.name.unwrap_or_default(),
        label_type: l.type_.unwrap_or_default(),
    }
}

fn convert_message(msg: Message) -> models::Message {
    let headers = msg
        .payload
        .as_ref()
        .and_then(|p| p.headers.as_ref())
        .map(|headers| {
            headers
                .iter()
                .filter_map(|h| {
                    Some(models::Header {
                        name: h.name.clone()?,
                        value: h.value.clone().unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    models::Message {
        id: msg.id.unwrap_or_default(),
        headers,
        label_ids: msg.label_ids.unwrap_or_default().into_iter().collect(),
        payload: msg.payload.map(convert_part),
    }
}

fn convert_part(part: MessagePart) -> models::MessagePart {
    models::MessagePart {
        mime_type: part.mime_type.unwrap_or_default(),
        body_data: part.body.and_then(|b| b.data),
        parts: part
            .parts
            .unwrap_or_default()
            .into_iter()
            .map(convert_part)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_gmail1::api::{MessagePartBody, MessagePartHeader};

    #[test]
    fn test_convert_message_flattens_payload_headers() {
        let msg = Message {
            id: Some("18c".to_string()),
            label_ids: Some(vec!["INBOX".to_string(), "UNREAD".to_string()]),
            payload: Some(MessagePart {
                mime_type: Some("multipart/alternative".to_string()),
                headers: Some(vec![
                    MessagePartHeader {
                        name: Some("From".to_string()),
                        value: Some("news@x.com".to_string()),
                    },
                    MessagePartHeader {
                        name: None,
                        value: Some("dropped".to_string()),
                    },
                ]),
                parts: Some(vec![MessagePart {
                    mime_type: Some("text/html".to_string()),
                    body: Some(MessagePartBody {
                        data: Some(b"<a>unsubscribe</a>".to_vec()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let converted = convert_message(msg);
        assert_eq!(converted.id, "18c");
        assert!(converted.has_label("UNREAD"));
        assert_eq!(converted.headers.len(), 1);
        assert_eq!(converted.headers[0].value, "news@x.com");

        let payload = converted.payload.unwrap();
        assert!(!payload.has_body());
        assert_eq!(payload.parts[0].mime_type, "text/html");
        assert!(payload.parts[0].has_body());
    }

    #[test]
    fn test_empty_label_sets_are_omitted() {
        assert_eq!(label_ids(&[]), None);
        assert_eq!(label_ids(&["INBOX".to_string()]), Some(vec!["INBOX".to_string()]));
    }
}
