use crate::error::UnsubscribeError;
use crate::models::{Message, UnsubscribeTarget};
use url::Url;

pub const LIST_UNSUBSCRIBE: &str = "List-Unsubscribe";

/// First header whose name matches exactly (case-sensitive).
pub fn header_value<'a>(message: &'a Message, name: &str) -> Option<&'a str> {
    message
        .headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

/// Extracts every `<...>` token of a `List-Unsubscribe` value. Web URIs are
/// moved to the front, everything else keeps its relative order.
pub fn parse_unsubscribe_header(value: &str) -> Vec<String> {
    let mut web = Vec::new();
    let mut other = Vec::new();

    let mut rest = value;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            break;
        };
        let uri = after[..close].trim();
        if !uri.is_empty() {
            if is_web_uri(uri) {
                web.push(uri.to_string());
            } else {
                other.push(uri.to_string());
            }
        }
        rest = &after[close + 1..];
    }

    web.extend(other);
    web
}

fn is_web_uri(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:")
}

/// Turns a URI into something the executor can act on. Anything that is not
/// `mailto`, `http` or `https` is rejected.
pub fn parse_target(uri: &str) -> Result<UnsubscribeTarget, UnsubscribeError> {
    let url = Url::parse(uri.trim()).map_err(|source| UnsubscribeError::InvalidTarget {
        target: uri.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(UnsubscribeTarget::Web {
            url: url.to_string(),
        }),
        "mailto" => {
            let mut subject = None;
            let mut body = None;
            for (key, value) in url.query_pairs() {
                match key.to_ascii_lowercase().as_str() {
                    "subject" if subject.is_none() => subject = Some(value.into_owned()),
                    "body" if body.is_none() => body = Some(value.into_owned()),
                    _ => {}
                }
            }
            Ok(UnsubscribeTarget::Mailto {
                recipient: url.path().to_string(),
                subject,
                body,
            })
        }
        other => Err(UnsubscribeError::UnsupportedScheme(other.to_string())),
    }
}
