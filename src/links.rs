use crate::models::{Message, MessagePart};
use base64::{Engine as _, engine::general_purpose};
use scraper::{Html, Selector};

const HTML_MIME: &str = "text/html";
const UNSUBSCRIBE_TEXT: &str = "unsubscribe";

/// Top-level payload if it carries a body, then its immediate children.
/// Deeper levels are not visited.
pub fn content_parts(message: &Message) -> impl Iterator<Item = &MessagePart> {
    let payload = message.payload.as_ref();
    let top = payload.filter(|p| p.has_body());
    let children = payload.into_iter().flat_map(|p| p.parts.iter());
    top.into_iter().chain(children)
}

pub fn html_parts(message: &Message) -> impl Iterator<Item = &MessagePart> {
    content_parts(message).filter(|p| p.mime_type == HTML_MIME)
}

/// Hrefs of anchors whose visible text mentions unsubscribing, in document
/// order. Parsing happens on every call.
pub fn unsubscribe_links(part: &MessagePart) -> Vec<String> {
    let Some(html) = part.body_data.as_deref().map(decode_body) else {
        return Vec::new();
    };
    find_unsubscribe_links(&html)
}

pub fn find_unsubscribe_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor_sel) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&anchor_sel)
        .filter(|a| {
            a.text()
                .collect::<String>()
                .to_lowercase()
                .contains(UNSUBSCRIBE_TEXT)
        })
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Bodies normally arrive as URL-safe base64. Some transports hand them over
/// already decoded, in which case the bytes are used as they are.
pub fn decode_body(data: &[u8]) -> String {
    let data_str = String::from_utf8_lossy(data);
    let trimmed = data_str.trim();

    let decoded = general_purpose::URL_SAFE
        .decode(trimmed)
        .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(trimmed))
        .or_else(|_| general_purpose::STANDARD.decode(trimmed))
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(trimmed));

    match decoded {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => data_str.into_owned(),
    }
}
