use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ROOM_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("room separator pattern is valid"));

/// One destination room and the parameters needed to reach it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomTarget {
    pub room_id: String,
    pub server: String,
    #[serde(skip)]
    pub token: String,
    /// Sender name, only sent by the v1 protocol
    pub send_as: String,
}

/// Split a comma separated room list into targets, dropping blank entries
pub fn room_targets(rooms: &str, server: &str, token: &str, send_as: &str) -> Vec<RoomTarget> {
    ROOM_SEPARATOR
        .split(rooms.trim())
        .map(str::trim)
        .filter(|room| !room.is_empty())
        .map(|room| RoomTarget {
            room_id: room.to_string(),
            server: server.to_string(),
            token: token.to_string(),
            send_as: send_as.to_string(),
        })
        .collect()
}
