use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Background color of a room message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Yellow,
    Green,
    Red,
    Purple,
    Gray,
    Random,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Red => "red",
            Color::Purple => "purple",
            Color::Gray => "gray",
            Color::Random => "random",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "red" => Ok(Color::Red),
            "purple" => Ok(Color::Purple),
            "gray" | "grey" => Ok(Color::Gray),
            "random" => Ok(Color::Random),
            other => Err(format!(
                "unknown color '{other}' (expected yellow, green, red, purple, gray or random)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Text,
    #[default]
    Html,
}

impl MessageFormat {
    pub fn from_text_flag(text_format: bool) -> Self {
        if text_format {
            MessageFormat::Text
        } else {
            MessageFormat::Html
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageFormat::Text => "text",
            MessageFormat::Html => "html",
        }
    }
}

/// Value style of a card attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeStyle {
    LozengeSuccess,
    LozengeError,
    LozengeCurrent,
}

impl AttributeStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeStyle::LozengeSuccess => "lozenge-success",
            AttributeStyle::LozengeError => "lozenge-error",
            AttributeStyle::LozengeCurrent => "lozenge-current",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAttribute {
    pub label: String,
    pub value: String,
    pub style: Option<AttributeStyle>,
    pub url: Option<String>,
}

impl CardAttribute {
    pub fn styled(label: impl Into<String>, value: impl Into<String>, style: AttributeStyle) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            style: Some(style),
            url: None,
        }
    }

    pub fn link(label: impl Into<String>, value: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            style: None,
            url: Some(url.into()),
        }
    }
}

/// Structured attachment rendered by V2 clients next to the message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub style: String,
    pub url: String,
    pub format: String,
    pub id: String,
    pub title: String,
    pub icon: String,
    pub attributes: Vec<CardAttribute>,
    pub activity_html: String,
}

/// Fully resolved payload handed to the publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub color: Color,
    pub notify: bool,
    pub format: MessageFormat,
    pub card: Option<Card>,
}

impl Notification {
    pub fn new(
        message: impl Into<String>,
        color: Color,
        notify: bool,
        format: MessageFormat,
        card: Option<Card>,
    ) -> Self {
        Self {
            message: message.into(),
            color,
            notify,
            format,
            card,
        }
    }

    /// Legacy shape without an explicit notify flag: alert on anything but green
    pub fn legacy(message: impl Into<String>, color: Color) -> Self {
        Self::new(message, color, color != Color::Green, MessageFormat::Html, None)
    }
}
