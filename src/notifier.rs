//! The notification pipeline
//!
//! run event → classification → category settings → variables and template
//! → card → publish. [`Notifier`] wires those stages together from an
//! explicit [`NotifierSettings`] value and applies the fail-on-error policy
//! to whatever the stages report.

use crate::cards::{select_card_builder, CardBuilder};
use crate::classifier::classify_run;
use crate::config::Config;
use crate::credentials::{resolve_token, CredentialStore};
use crate::errors::{NotifyError, NotifyResult};
use crate::model::{Color, MessageFormat, Notification, NotificationCategory, Run};
use crate::notifications::NotificationTable;
use crate::publisher::{
    room_targets, ProtocolVersion, ProxySettings, PublishReport, Publisher, RoomTarget,
};
use crate::templates;
use crate::variables::{VariableCollector, VariableSet};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle callbacks invoked by the orchestrator
pub trait RunListener {
    fn on_run_started(&self, run: &dyn Run) -> NotifyResult<()>;

    fn on_run_completed(&self, run: &dyn Run) -> NotifyResult<()>;
}

/// Everything the pipeline needs, resolved up front
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub server: String,
    pub rooms: String,
    pub auth_token: Option<String>,
    pub credential_id: Option<String>,
    pub send_as: String,
    pub protocol: ProtocolVersion,
    pub timeout: Duration,
    pub proxy: ProxySettings,
    pub fail_on_error: bool,
    pub build_server_url: Option<String>,
    pub notifications: NotificationTable,
}

impl NotifierSettings {
    pub fn from_config(config: &Config) -> NotifyResult<Self> {
        let hipchat = &config.hipchat;
        Ok(Self {
            server: hipchat.server.clone(),
            rooms: hipchat.room.clone(),
            auth_token: hipchat.auth_token.clone(),
            credential_id: hipchat.credential_id.clone(),
            send_as: hipchat.send_as.clone(),
            protocol: hipchat.protocol(),
            timeout: hipchat.timeout(),
            proxy: config.proxy.clone(),
            fail_on_error: hipchat.fail_on_error,
            build_server_url: hipchat.build_server_url.clone(),
            notifications: config.notification_table()?,
        })
    }
}

/// Ad-hoc message with optional overrides of the configured destination
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub message: String,
    /// Defaults to gray
    pub color: Option<Color>,
    /// Defaults to alerting for anything but green
    pub notify: Option<bool>,
    pub text_format: bool,
    pub icon: Option<String>,
    pub room: Option<String>,
    pub server: Option<String>,
    pub token: Option<String>,
    pub credential_id: Option<String>,
    pub v2_enabled: Option<bool>,
    pub send_as: Option<String>,
    pub fail_on_error: Option<bool>,
}

struct Destination<'a> {
    rooms: &'a str,
    server: &'a str,
    credential_id: Option<&'a str>,
    auth_token: Option<&'a str>,
    send_as: &'a str,
    protocol: ProtocolVersion,
}

pub struct Notifier {
    settings: NotifierSettings,
    card_builder: Box<dyn CardBuilder>,
    credentials: Box<dyn CredentialStore>,
    collector: VariableCollector,
}

impl Notifier {
    pub fn new(
        settings: NotifierSettings,
        card_builder: Box<dyn CardBuilder>,
        credentials: Box<dyn CredentialStore>,
    ) -> Self {
        let collector = VariableCollector::new(settings.build_server_url.clone());
        Self {
            settings,
            card_builder,
            credentials,
            collector,
        }
    }

    /// Pipeline using the configured card provider and `[credentials]` table
    pub fn from_config(config: &Config) -> NotifyResult<Self> {
        Ok(Self::new(
            NotifierSettings::from_config(config)?,
            select_card_builder(config.hipchat.card_provider.as_deref()),
            Box::new(config.credentials.clone()),
        ))
    }

    pub fn settings(&self) -> &NotifierSettings {
        &self.settings
    }

    /// Resolve the notification for `run` without sending it.
    ///
    /// Returns `None` when the category is absent or disabled.
    pub fn prepare(
        &self,
        run: &dyn Run,
        category: NotificationCategory,
    ) -> NotifyResult<Option<Notification>> {
        let Some(config) = self.settings.notifications.select(category) else {
            debug!("Notifications for {} are disabled", category);
            return Ok(None);
        };

        let variables = templates::with_computed(category, &self.collector.collect(run));
        let message = templates::resolve_message(category, &config.message_template, &variables);
        let card = self
            .card_builder
            .build(Some(run), &variables, &message, config.icon.as_deref())?;

        Ok(Some(Notification::new(
            message,
            config.color,
            config.notify,
            config.format(),
            card,
        )))
    }

    /// Prepare and publish the notification for `category`
    pub fn notify(
        &self,
        run: &dyn Run,
        category: NotificationCategory,
    ) -> NotifyResult<Option<PublishReport>> {
        let result = self.prepare(run, category).and_then(|notification| match notification {
            Some(notification) => self.deliver(&self.default_destination(), &notification).map(Some),
            None => Ok(None),
        });
        apply_failure_policy(result, self.settings.fail_on_error)
    }

    /// Publish an ad-hoc message, resolving `${...}` references against `run`
    pub fn send_message(
        &self,
        request: &SendRequest,
        run: Option<&dyn Run>,
    ) -> NotifyResult<Option<PublishReport>> {
        let fail_on_error = request.fail_on_error.unwrap_or(self.settings.fail_on_error);

        if request.message.trim().is_empty() {
            if fail_on_error {
                return Err(NotifyError::MessageRequired);
            }
            warn!("Empty notification message, nothing sent");
            return Ok(None);
        }

        let result = self.build_message(request, run).and_then(|notification| {
            let destination = Destination {
                rooms: request.room.as_deref().unwrap_or(&self.settings.rooms),
                server: request.server.as_deref().unwrap_or(&self.settings.server),
                // An explicit token replaces the configured credential id
                credential_id: match (&request.credential_id, &request.token) {
                    (Some(id), _) => Some(id.as_str()),
                    (None, Some(_)) => None,
                    (None, None) => self.settings.credential_id.as_deref(),
                },
                auth_token: request.token.as_deref().or(self.settings.auth_token.as_deref()),
                send_as: request.send_as.as_deref().unwrap_or(&self.settings.send_as),
                protocol: request
                    .v2_enabled
                    .map(ProtocolVersion::from_v2_flag)
                    .unwrap_or(self.settings.protocol),
            };
            self.deliver(&destination, &notification).map(Some)
        });
        apply_failure_policy(result, fail_on_error)
    }

    fn build_message(&self, request: &SendRequest, run: Option<&dyn Run>) -> NotifyResult<Notification> {
        let variables = run
            .map(|run| self.collector.collect(run))
            .unwrap_or_else(VariableSet::new);
        let message = templates::resolve(&request.message, &variables).into_owned();
        let color = request.color.unwrap_or(Color::Gray);
        let card = self
            .card_builder
            .build(run, &variables, &message, request.icon.as_deref())?;

        let notification = match request.notify {
            Some(notify) => Notification::new(
                message,
                color,
                notify,
                MessageFormat::from_text_flag(request.text_format),
                card,
            ),
            None => Notification {
                format: MessageFormat::from_text_flag(request.text_format),
                card,
                ..Notification::legacy(message, color)
            },
        };
        Ok(notification)
    }

    fn default_destination(&self) -> Destination<'_> {
        Destination {
            rooms: &self.settings.rooms,
            server: &self.settings.server,
            credential_id: self.settings.credential_id.as_deref(),
            auth_token: self.settings.auth_token.as_deref(),
            send_as: &self.settings.send_as,
            protocol: self.settings.protocol,
        }
    }

    fn deliver(
        &self,
        destination: &Destination<'_>,
        notification: &Notification,
    ) -> NotifyResult<PublishReport> {
        let publisher = Publisher::new(destination.protocol)
            .with_timeout(self.settings.timeout)
            .with_proxy(self.settings.proxy.clone());

        let targets = room_targets(destination.rooms, destination.server, "", destination.send_as);
        if targets.is_empty() {
            return publisher.publish(&targets, notification);
        }

        let token = resolve_token(
            self.credentials.as_ref(),
            destination.credential_id,
            destination.auth_token,
            destination.server,
        )?;
        let targets: Vec<RoomTarget> = targets
            .into_iter()
            .map(|target| RoomTarget {
                token: token.clone(),
                ..target
            })
            .collect();
        publisher.publish(&targets, notification)
    }
}

impl RunListener for Notifier {
    fn on_run_started(&self, run: &dyn Run) -> NotifyResult<()> {
        self.notify(run, NotificationCategory::Started).map(|_| ())
    }

    fn on_run_completed(&self, run: &dyn Run) -> NotifyResult<()> {
        let category = classify_run(run)?;
        info!("Run {} classified as {}", run.display_name(), category);
        self.notify(run, category).map(|_| ())
    }
}

/// Log failures instead of returning them unless `fail_on_error` is set.
/// Classification errors always propagate.
fn apply_failure_policy<T>(result: NotifyResult<Option<T>>, fail_on_error: bool) -> NotifyResult<Option<T>> {
    match result {
        Err(error @ NotifyError::InvalidState { .. }) => Err(error),
        Err(error) if !fail_on_error => {
            warn!("Unable to send HipChat notification ({}): {}", error.category(), error);
            Ok(None)
        }
        other => other,
    }
}
