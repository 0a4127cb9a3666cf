//! Room publisher
//!
//! Serializes a [`Notification`] for the selected protocol version and
//! delivers it to every [`RoomTarget`]. Rooms are attempted one after the
//! other; a failing room never stops delivery to the rest, and the call
//! only reports failure once every room has been tried. No retries.

pub mod http;
pub mod rooms;
pub mod v1;
pub mod v2;

use crate::errors::{NotifyError, NotifyResult, RoomFailure};
use crate::model::Notification;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

pub use http::{ProxySettings, DEFAULT_TIMEOUT};
pub use rooms::{room_targets, RoomTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V1,
    V2,
}

impl ProtocolVersion {
    pub fn from_v2_flag(v2_enabled: bool) -> Self {
        if v2_enabled {
            ProtocolVersion::V2
        } else {
            ProtocolVersion::V1
        }
    }
}

/// Outcome of a publish call that reached every room
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Publisher {
    protocol: ProtocolVersion,
    timeout: Duration,
    proxy: ProxySettings,
}

impl Publisher {
    pub fn new(protocol: ProtocolVersion) -> Self {
        Self {
            protocol,
            timeout: DEFAULT_TIMEOUT,
            proxy: ProxySettings::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    /// Deliver `notification` to each target.
    ///
    /// An empty target list succeeds without any network activity.
    /// Otherwise a [`NotifyError::PublishFailed`] lists every room that
    /// failed after all rooms were attempted.
    pub fn publish(
        &self,
        targets: &[RoomTarget],
        notification: &Notification,
    ) -> NotifyResult<PublishReport> {
        if targets.is_empty() {
            info!("No rooms configured, skipping notification");
            return Ok(PublishReport::default());
        }

        let client = http::build_client(self.timeout, &self.proxy)?;
        let mut report = PublishReport::default();
        let mut failures = Vec::new();

        for target in targets {
            let result = match self.protocol {
                ProtocolVersion::V1 => v1::send(&client, target, notification),
                ProtocolVersion::V2 => v2::send(&client, target, notification),
            };
            match result {
                Ok(()) => {
                    info!("Notification delivered to room {}", target.room_id);
                    report.delivered.push(target.room_id.clone());
                }
                Err(error) => {
                    warn!(
                        "Failed to notify room {} ({}): {}",
                        target.room_id,
                        error.category(),
                        error
                    );
                    failures.push(RoomFailure {
                        room: target.room_id.clone(),
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(NotifyError::PublishFailed {
                attempted: targets.len(),
                failures,
            })
        }
    }
}
