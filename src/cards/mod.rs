//! Card builders
//!
//! A card is the structured attachment shown next to a V2 room message.
//! Exactly one builder is active, chosen by name from configuration.

pub mod default;
pub mod noop;

use crate::errors::NotifyResult;
use crate::model::{Card, Run};
use crate::variables::VariableSet;
use tracing::warn;

pub use default::DefaultCardBuilder;
pub use noop::NoopCardBuilder;

/// Icon used when a notification does not configure its own
pub const DEFAULT_ICON_URL: &str = "https://bit.ly/2ctIstd";

/// Strategy producing an optional card for a notification
pub trait CardBuilder: Send + Sync {
    /// Name used to select this builder from configuration
    fn name(&self) -> &'static str;

    /// Build a card, or `None` when there is nothing worth attaching.
    ///
    /// Missing optional data never makes this fail; errors are reserved for
    /// unexpected evaluation failures.
    fn build(
        &self,
        run: Option<&dyn Run>,
        variables: &VariableSet,
        message: &str,
        icon: Option<&str>,
    ) -> NotifyResult<Option<Card>>;
}

/// Builder registered under `name`, or the no-op builder when nothing matches
pub fn select_card_builder(name: Option<&str>) -> Box<dyn CardBuilder> {
    match name.map(str::trim) {
        Some(name) if name.eq_ignore_ascii_case(DefaultCardBuilder::NAME) => {
            Box::new(DefaultCardBuilder::new())
        }
        Some(name) if name.is_empty() || name.eq_ignore_ascii_case(NoopCardBuilder::NAME) => {
            Box::new(NoopCardBuilder)
        }
        None => Box::new(NoopCardBuilder),
        Some(name) => {
            warn!("Unknown card provider '{}', falling back to no cards", name);
            Box::new(NoopCardBuilder)
        }
    }
}
