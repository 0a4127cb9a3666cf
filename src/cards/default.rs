use super::{CardBuilder, DEFAULT_ICON_URL};
use crate::errors::{NotifyError, NotifyResult};
use crate::model::{AttributeStyle, Card, CardAttribute, Run};
use crate::variables::{keys, VariableSet};
use handlebars::Handlebars;
use tracing::debug;
use uuid::Uuid;

const TITLE_TEMPLATE: &str = "{{{JOB_DISPLAY_NAME}}} - {{{BUILD_DISPLAY_NAME}}}";
const DEFAULT_REPORT_PATH: &str = "testReport/";

/// Summarizes test counts of a run as lozenge attributes
#[derive(Debug, Clone)]
pub struct DefaultCardBuilder {
    handlebars: Handlebars<'static>,
}

impl DefaultCardBuilder {
    pub const NAME: &'static str = "default";

    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        Self { handlebars }
    }

    fn attributes(&self, run: Option<&dyn Run>, variables: &VariableSet) -> Vec<CardAttribute> {
        let mut attributes = Vec::new();

        if let Some(count) = non_empty(variables, keys::SUCCESS_TEST_COUNT) {
            let style = if count == "0" {
                AttributeStyle::LozengeError
            } else {
                AttributeStyle::LozengeSuccess
            };
            attributes.push(CardAttribute::styled("Tests successful", count, style));
        }
        if let Some(count) = non_empty(variables, keys::FAILED_TEST_COUNT) {
            let style = if count == "0" {
                AttributeStyle::LozengeSuccess
            } else {
                AttributeStyle::LozengeError
            };
            attributes.push(CardAttribute::styled("Tests failed", count, style));
        }
        if let Some(count) = non_empty(variables, keys::SKIPPED_TEST_COUNT) {
            let style = if count == "0" {
                AttributeStyle::LozengeSuccess
            } else {
                AttributeStyle::LozengeCurrent
            };
            attributes.push(CardAttribute::styled("Tests skipped", count, style));
        }
        if let Some(count) = non_empty(variables, keys::TEST_COUNT) {
            attributes.push(CardAttribute {
                label: "Tests total".to_string(),
                value: count.to_string(),
                style: None,
                url: None,
            });
        }

        if !attributes.is_empty() {
            attributes.push(CardAttribute::link(
                "Test report",
                "here",
                report_url(run, variables),
            ));
        }
        attributes
    }
}

impl Default for DefaultCardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CardBuilder for DefaultCardBuilder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn build(
        &self,
        run: Option<&dyn Run>,
        variables: &VariableSet,
        message: &str,
        icon: Option<&str>,
    ) -> NotifyResult<Option<Card>> {
        let attributes = self.attributes(run, variables);
        if attributes.is_empty() {
            debug!("No test data available, skipping card");
            return Ok(None);
        }

        let title = self
            .handlebars
            .render_template(TITLE_TEMPLATE, variables)
            .map_err(|e| NotifyError::macro_evaluation_with_source("Failed to render card title", e))?;

        Ok(Some(Card {
            style: "application".to_string(),
            url: variables.get(keys::URL).unwrap_or_default().to_string(),
            format: "medium".to_string(),
            id: Uuid::new_v4().to_string(),
            title,
            icon: icon
                .filter(|icon| !icon.trim().is_empty())
                .unwrap_or(DEFAULT_ICON_URL)
                .to_string(),
            attributes,
            activity_html: message.to_string(),
        }))
    }
}

fn non_empty<'a>(variables: &'a VariableSet, key: &str) -> Option<&'a str> {
    variables.get(key).filter(|value| !value.is_empty())
}

fn report_url(run: Option<&dyn Run>, variables: &VariableSet) -> String {
    if let Some(url) = non_empty(variables, keys::TEST_REPORT_URL) {
        return url.to_string();
    }
    let path = run
        .and_then(|run| run.test_results())
        .map(|tests| tests.url_name.as_str())
        .unwrap_or(DEFAULT_REPORT_PATH);
    format!("{}{}", variables.get(keys::URL).unwrap_or_default(), path)
}
