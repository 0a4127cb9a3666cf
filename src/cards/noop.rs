use super::CardBuilder;
use crate::errors::NotifyResult;
use crate::model::{Card, Run};
use crate::variables::VariableSet;

/// Never attaches a card
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCardBuilder;

impl NoopCardBuilder {
    pub const NAME: &'static str = "noop";
}

impl CardBuilder for NoopCardBuilder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn build(
        &self,
        _run: Option<&dyn Run>,
        _variables: &VariableSet,
        _message: &str,
        _icon: Option<&str>,
    ) -> NotifyResult<Option<Card>> {
        Ok(None)
    }
}
