//! Legacy v1 protocol: form-encoded `POST /v1/rooms/message`

use super::http::{drain, endpoint, server_base_url};
use super::rooms::RoomTarget;
use crate::errors::{NotifyError, NotifyResult};
use crate::model::Notification;
use reqwest::blocking::Client;
use tracing::{debug, warn};
use url::Url;

/// Marker the v1 API puts in the body of a delivered message
const SENT_MARKER: &str = "sent";

/// Endpoint for `target`, carrying the token as `auth_token` query parameter
pub fn endpoint_url(target: &RoomTarget) -> NotifyResult<Url> {
    let base = server_base_url(&target.server)?;
    let mut url = endpoint(&base, &["v1", "rooms", "message"])?;
    url.query_pairs_mut().append_pair("auth_token", &target.token);
    Ok(url)
}

/// Form fields in wire order
pub fn form_params<'a>(target: &'a RoomTarget, notification: &'a Notification) -> [(&'static str, &'a str); 5] {
    [
        ("from", target.send_as.as_str()),
        ("room_id", target.room_id.as_str()),
        ("message", notification.message.as_str()),
        ("color", notification.color.as_str()),
        ("notify", if notification.notify { "1" } else { "0" }),
    ]
}

/// Deliver to one room
pub fn send(client: &Client, target: &RoomTarget, notification: &Notification) -> NotifyResult<()> {
    let url = endpoint_url(target)?;
    debug!(
        "Posting v1 message to room {} as {} ({})",
        target.room_id, target.send_as, notification.color
    );

    let response = client
        .post(url)
        .form(&form_params(target, notification))
        .send()
        .map_err(|source| NotifyError::Transport {
            room: target.room_id.clone(),
            source,
        })?;

    let (status, body) = drain(&target.room_id, response)?;
    check_response(&target.room_id, status, &body)
}

fn check_response(room: &str, status: u16, body: &str) -> NotifyResult<()> {
    if status != 200 {
        warn!(
            "HipChat post may have failed. Response code: {}, response: {}",
            status, body
        );
        return Err(NotifyError::InvalidResponseCode {
            room: room.to_string(),
            code: status,
        });
    }
    if !body.contains(SENT_MARKER) {
        warn!("HipChat did not confirm delivery to room {}: {}", room, body);
        return Err(NotifyError::UnconfirmedDelivery {
            room: room.to_string(),
        });
    }
    Ok(())
}
