use std::fmt;

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::object::TypedParameter;

const ACTIVE: &str = "ACTIVE";
const COMPLETED: &str = "COMPLETED";
const EXPIRED: &str = "EXPIRED";
const INACTIVE: &str = "INACTIVE";

/// Language of localized strings when none is given.
pub const DEFAULT_LANGUAGE: &str = "en-EN";

/// Lifecycle state of a wallet object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Active,
    Completed,
    Expired,
    Inactive,
    Other(String),
}

impl State {
    pub fn as_str(&self) -> &str {
        match self {
            State::Active => ACTIVE,
            State::Completed => COMPLETED,
            State::Expired => EXPIRED,
            State::Inactive => INACTIVE,
            State::Other(o) => o,
        }
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        match s.as_str() {
            ACTIVE => State::Active,
            COMPLETED => State::Completed,
            EXPIRED => State::Expired,
            INACTIVE => State::Inactive,
            _ => State::Other(s),
        }
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl TypedParameter for State {
    const KEY: &'static str = "state";
}

impl TryFrom<Json> for State {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        let s: String = serde_json::from_value(value)?;
        Ok(s.into())
    }
}

impl From<State> for Json {
    fn from(value: State) -> Self {
        Json::String(value.as_str().to_string())
    }
}

/// `{language, value}` entry of a [LocalizedString].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedString {
    pub language: String,
    pub value: String,
}

/// A string shown to the holder, `{"defaultValue": {"language", "value"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedString {
    pub default_value: TranslatedString,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translated_values: Vec<TranslatedString>,
}

impl LocalizedString {
    pub fn new(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            default_value: TranslatedString {
                language: language.into(),
                value: value.into(),
            },
            translated_values: vec![],
        }
    }

    pub fn with_translation(mut self, value: impl Into<String>, language: impl Into<String>) -> Self {
        self.translated_values.push(TranslatedString {
            language: language.into(),
            value: value.into(),
        });
        self
    }
}

impl From<&str> for LocalizedString {
    fn from(value: &str) -> Self {
        Self::new(value, DEFAULT_LANGUAGE)
    }
}

impl From<String> for LocalizedString {
    fn from(value: String) -> Self {
        Self::new(value, DEFAULT_LANGUAGE)
    }
}

impl TryFrom<LocalizedString> for Json {
    type Error = Error;

    fn try_from(value: LocalizedString) -> Result<Json, Self::Error> {
        serde_json::to_value(value).context("Failed to serialize LocalizedString")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTitle(pub LocalizedString);

impl TypedParameter for CardTitle {
    const KEY: &'static str = "cardTitle";
}

impl TryFrom<Json> for CardTitle {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map(Self).map_err(Into::into)
    }
}

impl TryFrom<CardTitle> for Json {
    type Error = Error;

    fn try_from(value: CardTitle) -> Result<Json, Self::Error> {
        value.0.try_into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header(pub LocalizedString);

impl TypedParameter for Header {
    const KEY: &'static str = "header";
}

impl TryFrom<Json> for Header {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map(Self).map_err(Into::into)
    }
}

impl TryFrom<Header> for Json {
    type Error = Error;

    fn try_from(value: Header) -> Result<Json, Self::Error> {
        value.0.try_into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subheader(pub LocalizedString);

impl TypedParameter for Subheader {
    const KEY: &'static str = "subheader";
}

impl TryFrom<Json> for Subheader {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map(Self).map_err(Into::into)
    }
}

impl TryFrom<Subheader> for Json {
    type Error = Error;

    fn try_from(value: Subheader) -> Result<Json, Self::Error> {
        value.0.try_into()
    }
}

/// Card background, `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBackgroundColor(pub String);

impl TypedParameter for HexBackgroundColor {
    const KEY: &'static str = "hexBackgroundColor";
}

impl TryFrom<Json> for HexBackgroundColor {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<HexBackgroundColor> for Json {
    fn from(value: HexBackgroundColor) -> Self {
        Json::String(value.0)
    }
}

/// The `barcode` of a wallet object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    /// `QR_CODE`, `PDF_417`, `AZTEC`, `CODE_128`, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_text: Option<String>,
}

impl Barcode {
    pub const QR_CODE: &'static str = "QR_CODE";

    pub fn new(value: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            alternate_text: None,
        }
    }

    pub fn qr(value: impl Into<String>) -> Self {
        Self::new(value, Self::QR_CODE)
    }

    pub fn with_alternate_text(mut self, text: impl Into<String>) -> Self {
        self.alternate_text = Some(text.into());
        self
    }
}

impl TypedParameter for Barcode {
    const KEY: &'static str = "barcode";
}

impl TryFrom<Json> for Barcode {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(Into::into)
    }
}

impl TryFrom<Barcode> for Json {
    type Error = Error;

    fn try_from(value: Barcode) -> Result<Json, Self::Error> {
        serde_json::to_value(value).context("Failed to serialize Barcode")
    }
}
