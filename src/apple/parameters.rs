use std::fmt;

use anyhow::{Context, Error};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::core::object::TypedParameter;

const GENERIC: &str = "generic";
const BOARDING_PASS: &str = "boardingPass";
const COUPON: &str = "coupon";
const EVENT_TICKET: &str = "eventTicket";
const STORE_CARD: &str = "storeCard";

/// `strftime` layout of `relevantDate`, W3C date with a numeric offset.
pub const RELEVANT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTypeIdentifier(pub String);

impl TypedParameter for PassTypeIdentifier {
    const KEY: &'static str = "passTypeIdentifier";
}

impl TryFrom<Json> for PassTypeIdentifier {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<PassTypeIdentifier> for Json {
    fn from(value: PassTypeIdentifier) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamIdentifier(pub String);

impl TypedParameter for TeamIdentifier {
    const KEY: &'static str = "teamIdentifier";
}

impl TryFrom<Json> for TeamIdentifier {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<TeamIdentifier> for Json {
    fn from(value: TeamIdentifier) -> Self {
        Json::String(value.0)
    }
}

/// Unique within the pass type, also the name of the downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialNumber(pub String);

impl TypedParameter for SerialNumber {
    const KEY: &'static str = "serialNumber";
}

impl TryFrom<Json> for SerialNumber {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<SerialNumber> for Json {
    fn from(value: SerialNumber) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(pub String);

impl TypedParameter for Description {
    const KEY: &'static str = "description";
}

impl TryFrom<Json> for Description {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<Description> for Json {
    fn from(value: Description) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationName(pub String);

impl TypedParameter for OrganizationName {
    const KEY: &'static str = "organizationName";
}

impl TryFrom<Json> for OrganizationName {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<OrganizationName> for Json {
    fn from(value: OrganizationName) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoText(pub String);

impl TypedParameter for LogoText {
    const KEY: &'static str = "logoText";
}

impl TryFrom<Json> for LogoText {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<LogoText> for Json {
    fn from(value: LogoText) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatVersion(pub u8);

impl Default for FormatVersion {
    fn default() -> Self {
        Self(1)
    }
}

impl TypedParameter for FormatVersion {
    const KEY: &'static str = "formatVersion";
}

impl TryFrom<Json> for FormatVersion {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<FormatVersion> for Json {
    fn from(value: FormatVersion) -> Self {
        Json::from(value.0)
    }
}

/// A CSS-style `rgb(r, g, b)` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundColor(pub String);

impl From<Rgb> for ForegroundColor {
    fn from(rgb: Rgb) -> Self {
        Self(rgb.to_string())
    }
}

impl TypedParameter for ForegroundColor {
    const KEY: &'static str = "foregroundColor";
}

impl TryFrom<Json> for ForegroundColor {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<ForegroundColor> for Json {
    fn from(value: ForegroundColor) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundColor(pub String);

impl From<Rgb> for BackgroundColor {
    fn from(rgb: Rgb) -> Self {
        Self(rgb.to_string())
    }
}

impl TypedParameter for BackgroundColor {
    const KEY: &'static str = "backgroundColor";
}

impl TryFrom<Json> for BackgroundColor {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<BackgroundColor> for Json {
    fn from(value: BackgroundColor) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelColor(pub String);

impl From<Rgb> for LabelColor {
    fn from(rgb: Rgb) -> Self {
        Self(rgb.to_string())
    }
}

impl TypedParameter for LabelColor {
    const KEY: &'static str = "labelColor";
}

impl TryFrom<Json> for LabelColor {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<LabelColor> for Json {
    fn from(value: LabelColor) -> Self {
        Json::String(value.0)
    }
}

/// When the pass becomes relevant, shown on the lock screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantDate(pub String);

impl RelevantDate {
    pub fn from_datetime<Tz>(date: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(date.format(RELEVANT_DATE_FORMAT).to_string())
    }
}

impl TypedParameter for RelevantDate {
    const KEY: &'static str = "relevantDate";
}

impl TryFrom<Json> for RelevantDate {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl From<RelevantDate> for Json {
    fn from(value: RelevantDate) -> Self {
        Json::String(value.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BarcodeFormat {
    #[default]
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

/// The `barcode` dictionary of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: BarcodeFormat,
    pub message: String,
    pub message_encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Barcode {
    pub const DEFAULT_ENCODING: &'static str = "iso-8859-1";

    pub fn new(message: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            format,
            message: message.into(),
            message_encoding: Self::DEFAULT_ENCODING.to_string(),
            alt_text: None,
        }
    }

    /// A QR code with the default `iso-8859-1` encoding.
    pub fn qr(message: impl Into<String>) -> Self {
        Self::new(message, BarcodeFormat::Qr)
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.message_encoding = encoding.into();
        self
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
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

/// The `barcodes` array, preferred over `barcode` by recent iOS versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcodes(pub Vec<Barcode>);

impl TypedParameter for Barcodes {
    const KEY: &'static str = "barcodes";
}

impl TryFrom<Json> for Barcodes {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map(Self).map_err(Into::into)
    }
}

impl TryFrom<Barcodes> for Json {
    type Error = Error;

    fn try_from(value: Barcodes) -> Result<Json, Self::Error> {
        serde_json::to_value(value.0).context("Failed to serialize Barcodes")
    }
}

/// The pass style, which is also the key holding the field groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PassStyle {
    #[default]
    Generic,
    BoardingPass,
    Coupon,
    EventTicket,
    StoreCard,
    Other(String),
}

impl PassStyle {
    pub fn as_str(&self) -> &str {
        match self {
            PassStyle::Generic => GENERIC,
            PassStyle::BoardingPass => BOARDING_PASS,
            PassStyle::Coupon => COUPON,
            PassStyle::EventTicket => EVENT_TICKET,
            PassStyle::StoreCard => STORE_CARD,
            PassStyle::Other(o) => o,
        }
    }

    /// The container a freshly selected style starts with.
    ///
    /// Only `generic` is pre-seeded with its five empty field groups.
    pub fn initial_container(&self) -> Json {
        let mut container = Map::new();
        if *self == PassStyle::Generic {
            for group in FieldGroup::ALL {
                container.insert(group.as_str().to_string(), Json::Array(vec![]));
            }
        }
        Json::Object(container)
    }
}

impl From<String> for PassStyle {
    fn from(s: String) -> Self {
        match s.as_str() {
            GENERIC => PassStyle::Generic,
            BOARDING_PASS => PassStyle::BoardingPass,
            COUPON => PassStyle::Coupon,
            EVENT_TICKET => PassStyle::EventTicket,
            STORE_CARD => PassStyle::StoreCard,
            _ => PassStyle::Other(s),
        }
    }
}

impl From<&str> for PassStyle {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl fmt::Display for PassStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    Header,
    Primary,
    Secondary,
    Auxiliary,
    Back,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 5] = [
        FieldGroup::Header,
        FieldGroup::Primary,
        FieldGroup::Secondary,
        FieldGroup::Auxiliary,
        FieldGroup::Back,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Header => "headerFields",
            FieldGroup::Primary => "primaryFields",
            FieldGroup::Secondary => "secondaryFields",
            FieldGroup::Auxiliary => "auxiliaryFields",
            FieldGroup::Back => "backFields",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// A field descriptor: `{key, label, value, ...extra}`.
///
/// Extra attributes (`textAlignment`, `dateStyle`, `changeMessage`, ...) are written after the
/// three base keys and win over them on collision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub value: Json,
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl Field {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: impl Into<Json>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Json>) -> Self {
        self.extra.extend(extra);
        self
    }
}

impl From<Field> for Json {
    fn from(field: Field) -> Self {
        let mut descriptor = Map::new();
        descriptor.insert("key".into(), Json::String(field.key));
        descriptor.insert("label".into(), Json::String(field.label));
        descriptor.insert("value".into(), field.value);
        descriptor.extend(field.extra);
        Json::Object(descriptor)
    }
}
