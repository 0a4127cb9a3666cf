//! v2 protocol: JSON `POST /v2/room/{room}/notification` with bearer auth

use super::http::{drain, endpoint, server_base_url};
use super::rooms::RoomTarget;
use crate::errors::{NotifyError, NotifyResult};
use crate::model::{Card, Notification};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use tracing::{debug, info, warn};
use url::Url;

/// Longest message the v2 API accepts, in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

const ELLIPSIS: &str = "...";

/// Cut `message` to [`MAX_MESSAGE_LENGTH`] characters, ending in `...`
pub fn truncate_message(message: &str) -> Cow<'_, str> {
    if message.chars().count() <= MAX_MESSAGE_LENGTH {
        return Cow::Borrowed(message);
    }
    info!("HipChat notification message was too long, truncating to maximum message length");
    let keep = MAX_MESSAGE_LENGTH - ELLIPSIS.len();
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}

/// Per-room notification endpoint; the room id is percent-encoded
pub fn endpoint_url(target: &RoomTarget) -> NotifyResult<Url> {
    let base = server_base_url(&target.server)?;
    endpoint(&base, &["v2", "room", target.room_id.as_str(), "notification"])
}

/// JSON document for a notification, message already truncated
pub fn request_body(notification: &Notification) -> Value {
    let mut body = json!({
        "message": truncate_message(&notification.message),
        "color": notification.color.as_str(),
        "notify": notification.notify,
        "message_format": notification.format.as_str(),
    });
    if let (Some(card), Value::Object(map)) = (&notification.card, &mut body) {
        map.insert("card".to_string(), card_json(card));
    }
    body
}

fn card_json(card: &Card) -> Value {
    let attributes: Vec<Value> = card
        .attributes
        .iter()
        .map(|attribute| {
            let mut value = Map::new();
            value.insert("label".to_string(), json!(attribute.value));
            if let Some(style) = attribute.style {
                value.insert("style".to_string(), json!(style.as_str()));
            }
            if let Some(url) = &attribute.url {
                value.insert("url".to_string(), json!(url));
            }
            json!({ "label": attribute.label, "value": value })
        })
        .collect();

    json!({
        "style": card.style,
        "url": card.url,
        "format": card.format,
        "id": card.id,
        "title": card.title,
        "icon": { "url": card.icon },
        "attributes": attributes,
        "activity": {
            "html": card.activity_html,
            "icon": { "url": card.icon },
        },
    })
}

/// Deliver to one room
pub fn send(client: &Client, target: &RoomTarget, notification: &Notification) -> NotifyResult<()> {
    let url = endpoint_url(target)?;
    debug!(
        "Posting v2 notification to room {} ({}, {})",
        target.room_id,
        notification.color,
        notification.format.as_str()
    );

    let response = client
        .post(url)
        .header(AUTHORIZATION, format!("Bearer {}", target.token))
        .header(CONTENT_TYPE, "application/json")
        .body(request_body(notification).to_string())
        .send()
        .map_err(|source| NotifyError::Transport {
            room: target.room_id.clone(),
            source,
        })?;

    let (status, body) = drain(&target.room_id, response)?;
    if status != 204 {
        warn!(
            "HipChat post may have failed. Response code: {}, response: {}",
            status, body
        );
        return Err(NotifyError::InvalidResponseCode {
            room: target.room_id.clone(),
            code: status,
        });
    }
    Ok(())
}
