//! Message template resolution
//!
//! Templates reference run variables as `${NAME}`. A reference may carry
//! modifiers after a comma; `${NAME,escape=true}` HTML-escapes the value.
//! `COMMIT_MESSAGE` is escaped unless the reference says `escape=false`.
//! Unknown names resolve to an empty string.

use crate::model::{status_text, NotificationCategory};
use crate::variables::{keys, VariableSet};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Default message for start-type categories
pub const DEFAULT_START_TEMPLATE: &str =
    r#"${JOB_DISPLAY_NAME} - ${BUILD_DISPLAY_NAME}: ${STATUS} (${CHANGES_OR_CAUSE}) (<a href="${URL}">Open</a>)"#;

/// Default message for completion categories
pub const DEFAULT_COMPLETED_TEMPLATE: &str =
    r#"${JOB_DISPLAY_NAME} - ${BUILD_DISPLAY_NAME}: ${STATUS} after ${DURATION} (<a href="${URL}">Open</a>)"#;

static VARIABLE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)((?:,[^}]*)?)\}")
        .expect("variable reference pattern is valid")
});

/// Substitute every `${NAME}` reference in `template`
pub fn resolve<'a>(template: &'a str, variables: &VariableSet) -> Cow<'a, str> {
    if !template.contains("${") {
        return Cow::Borrowed(template);
    }

    VARIABLE_REF.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        let escape = escape_modifier(&caps[2]);
        if name == keys::COMMIT_MESSAGE {
            // stored escaped; `escape=false` selects the raw text
            let key = match escape {
                Some(false) => keys::COMMIT_MESSAGE_TEXT,
                _ => keys::COMMIT_MESSAGE,
            };
            return variables.get(key).unwrap_or_default().to_string();
        }

        let value = variables.get(name).unwrap_or_default();
        if escape == Some(true) {
            handlebars::html_escape(value)
        } else {
            value.to_string()
        }
    })
}

/// Value of the `escape` flag in a `,key=value,...` modifier list, if given
fn escape_modifier(modifiers: &str) -> Option<bool> {
    modifiers
        .split(',')
        .filter_map(|modifier| modifier.split_once('='))
        .filter(|(key, _)| key.trim() == "escape")
        .last()
        .map(|(_, value)| value.trim().trim_matches('"').eq_ignore_ascii_case("true"))
}

/// Variables for one category with the computed `STATUS` and
/// `PRINT_FULL_ENV` entries layered on top
pub fn with_computed(category: NotificationCategory, variables: &VariableSet) -> VariableSet {
    let with_status = variables.merged([(keys::STATUS, status_text(category))]);
    let dump = with_status.to_string();
    with_status.merged([(keys::PRINT_FULL_ENV, dump)])
}

/// Built-in template for a category
pub fn default_template(category: NotificationCategory) -> &'static str {
    if category.is_start_type() {
        DEFAULT_START_TEMPLATE
    } else {
        DEFAULT_COMPLETED_TEMPLATE
    }
}

/// Resolve the message for a category, falling back to the built-in
/// template when `template` is blank
pub fn resolve_message(
    category: NotificationCategory,
    template: &str,
    variables: &VariableSet,
) -> String {
    let template = if template.trim().is_empty() {
        default_template(category)
    } else {
        template
    };
    resolve(template, &with_computed(category, variables)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> VariableSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_simple_substitution() {
        let variables = vars(&[("JOB_DISPLAY_NAME", "demo"), ("STATUS", "Success")]);
        assert_eq!(
            resolve("Build ${JOB_DISPLAY_NAME} is ${STATUS}", &variables),
            "Build demo is Success"
        );
    }

    #[test]
    fn test_unknown_variable_is_empty() {
        assert_eq!(resolve("[${NOPE}]", &VariableSet::new()), "[]");
    }

    #[test]
    fn test_templates_without_references_are_untouched() {
        let variables = vars(&[("A", "1")]);
        for template in ["", "plain text", "$A {A} $ {", "cost: $5 {maybe}", "${", "${}"] {
            assert_eq!(resolve(template, &variables), template);
        }
    }

    #[test]
    fn test_escape_modifier() {
        let variables = vars(&[("COMMIT_MESSAGE_TEXT", "<b>fix</b> & more")]);
        assert_eq!(
            resolve("${COMMIT_MESSAGE_TEXT,escape=true}", &variables),
            "&lt;b&gt;fix&lt;/b&gt; &amp; more"
        );
        assert_eq!(
            resolve("${COMMIT_MESSAGE_TEXT,escape=false}", &variables),
            "<b>fix</b> & more"
        );
        assert_eq!(
            resolve("${COMMIT_MESSAGE_TEXT}", &variables),
            "<b>fix</b> & more"
        );
    }

    #[test]
    fn test_commit_message_escape_selects_form() {
        let variables = vars(&[
            ("COMMIT_MESSAGE", "Fix &lt;b&gt;x&lt;/b&gt;"),
            ("COMMIT_MESSAGE_TEXT", "Fix <b>x</b>"),
        ]);
        assert_eq!(
            resolve("${COMMIT_MESSAGE}", &variables),
            "Fix &lt;b&gt;x&lt;/b&gt;"
        );
        assert_eq!(
            resolve("${COMMIT_MESSAGE,escape=true}", &variables),
            "Fix &lt;b&gt;x&lt;/b&gt;"
        );
        assert_eq!(
            resolve("${COMMIT_MESSAGE,escape=false}", &variables),
            "Fix <b>x</b>"
        );
    }

    #[test]
    fn test_status_overrides_external_value() {
        let variables = vars(&[("STATUS", "spoofed"), ("JOB_DISPLAY_NAME", "demo")]);
        let computed = with_computed(NotificationCategory::BackToNormal, &variables);
        assert_eq!(computed.get(keys::STATUS), Some("Back to normal"));

        let dump = computed.get(keys::PRINT_FULL_ENV).unwrap();
        assert!(dump.contains("JOB_DISPLAY_NAME=demo"));
        assert!(dump.contains("STATUS=Back to normal"));
    }

    #[test]
    fn test_blank_template_uses_default() {
        let variables = vars(&[
            ("JOB_DISPLAY_NAME", "demo"),
            ("BUILD_DISPLAY_NAME", "#3"),
            ("DURATION", "5 sec"),
            ("URL", "https://ci/job/demo/3/"),
            ("CHANGES_OR_CAUSE", "Started by user admin"),
        ]);

        assert_eq!(
            resolve_message(NotificationCategory::Failure, "  ", &variables),
            r#"demo - #3: FAILURE after 5 sec (<a href="https://ci/job/demo/3/">Open</a>)"#
        );
        assert_eq!(
            resolve_message(NotificationCategory::Started, "", &variables),
            r#"demo - #3: Starting... (Started by user admin) (<a href="https://ci/job/demo/3/">Open</a>)"#
        );
        assert_eq!(
            resolve_message(NotificationCategory::Success, "${STATUS}!", &variables),
            "Success!"
        );
    }
}
