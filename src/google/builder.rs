use serde_json::Value as Json;
use tracing::warn;
use url::Url;

use crate::{
    core::object::{TypedParameter, UntypedObject},
    error::WalletResult,
};

use super::{
    object::{GenericObject, WalletObject, IDENTITY_KEYS},
    parameters::{
        Barcode, CardTitle, Header, HexBackgroundColor, LocalizedString, State, Subheader,
    },
    GoogleWallet,
};

/// A generic object being assembled for one issuance.
#[derive(Debug, Clone)]
#[must_use]
pub struct ObjectBuilder<'a> {
    id: String,
    class_id: String,
    fields: UntypedObject,
    wallet: &'a GoogleWallet,
}

impl<'a> ObjectBuilder<'a> {
    pub(crate) fn new(wallet: &'a GoogleWallet, id: String, class_id: String) -> Self {
        let mut fields = UntypedObject::new();
        fields.insert(State::default());
        Self {
            id,
            class_id,
            fields,
            wallet,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn fields(&self) -> &UntypedObject {
        &self.fields
    }

    pub fn with_parameter<T: TypedParameter>(mut self, t: T) -> Self {
        if self.is_identity(T::KEY) {
            return self;
        }
        self.fields.insert(t);
        self
    }

    /// Set any key of the object, see the `genericObject` REST reference for the available ones.
    ///
    /// `id` and `classId` are fixed when the builder is created and cannot be overwritten.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        let key = key.into();
        if self.is_identity(&key) {
            return self;
        }
        self.fields.insert_raw(key, value.into());
        self
    }

    fn is_identity(&self, key: &str) -> bool {
        let identity = IDENTITY_KEYS.contains(&key);
        if identity {
            warn!(id = %self.id, "ignoring attempt to overwrite '{key}'");
        }
        identity
    }

    pub fn with_state(self, state: impl Into<State>) -> Self {
        self.with_parameter(state.into())
    }

    /// Set `key` to a localized string, e.g. `with_localized_string("subheader", "Seat", "en-US")`.
    pub fn with_localized_string(
        self,
        key: impl Into<String>,
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        match Json::try_from(LocalizedString::new(value, language)) {
            Ok(json) => self.with_field(key, json),
            Err(e) => {
                warn!("{e:#}");
                self
            }
        }
    }

    /// Strings are localized in `en-EN`; pass a [LocalizedString] for another language.
    pub fn with_card_title(self, title: impl Into<LocalizedString>) -> Self {
        self.with_parameter(CardTitle(title.into()))
    }

    pub fn with_header(self, header: impl Into<LocalizedString>) -> Self {
        self.with_parameter(Header(header.into()))
    }

    pub fn with_subheader(self, subheader: impl Into<LocalizedString>) -> Self {
        self.with_parameter(Subheader(subheader.into()))
    }

    pub fn with_hex_background_color(self, color: impl Into<String>) -> Self {
        self.with_parameter(HexBackgroundColor(color.into()))
    }

    pub fn with_barcode(self, barcode: Barcode) -> Self {
        self.with_parameter(barcode)
    }

    pub fn build(self) -> GenericObject {
        GenericObject::new(self.id, self.class_id, self.fields)
    }

    /// Insert the object, failing if it already exists.
    pub async fn create(self) -> WalletResult<GenericObject> {
        let wallet = self.wallet;
        wallet.create(&self.build()).await
    }

    /// The existing object with this id, or the newly created one.
    pub async fn find_or_create(self) -> WalletResult<GenericObject> {
        let wallet = self.wallet;
        wallet.find_or_create(self.build()).await
    }

    /// "Add to Google Wallet" link for this object.
    ///
    /// The object itself is not published; call [find_or_create](Self::find_or_create) first.
    pub fn save_link(&self) -> WalletResult<Url> {
        self.wallet
            .save_link_for(GenericObject::SAVE_KEY, &self.id, &self.class_id)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::json;

    use crate::{
        config::WalletsConfig, core::util::ReqwestClient, google::credentials::ServiceAccountKey,
    };

    use super::*;

    const SERVICE_ACCOUNT: &[u8] = include_bytes!("../../tests/examples/service_account.json");

    fn wallet() -> GoogleWallet {
        let mut config = WalletsConfig::default();
        config.google_wallet.issuer_id = "issuer1".into();
        let key = ServiceAccountKey::from_slice(SERVICE_ACCOUNT).unwrap();
        GoogleWallet::with_key(&config, key, Arc::new(ReqwestClient::new().unwrap())).unwrap()
    }

    #[test]
    fn object_payload() {
        let wallet = wallet();
        let object = wallet
            .build_object("abc123", "xyz")
            .with_card_title("Summer Festival")
            .with_header(LocalizedString::new("Ada Lovelace", "fr-FR"))
            .with_hex_background_color("#4285f4")
            .with_barcode(Barcode::qr("abc"))
            .with_field("logo", json!({ "sourceUri": { "uri": "https://example.com/logo.png" } }))
            .build();

        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({
                "id": "issuer1.abc123",
                "classId": "issuer1.xyz",
                "state": "ACTIVE",
                "cardTitle": { "defaultValue": { "language": "en-EN", "value": "Summer Festival" } },
                "header": { "defaultValue": { "language": "fr-FR", "value": "Ada Lovelace" } },
                "hexBackgroundColor": "#4285f4",
                "barcode": { "type": "QR_CODE", "value": "abc" },
                "logo": { "sourceUri": { "uri": "https://example.com/logo.png" } }
            })
        );
    }

    #[test]
    fn identity_cannot_be_overwritten() {
        let wallet = wallet();
        let object = wallet
            .build_object("abc123", "xyz")
            .with_field("id", "issuer1.other")
            .with_field("classId", "issuer1.other")
            .build();

        assert_eq!(object.id(), "issuer1.abc123");
        assert_eq!(object.class_id(), "issuer1.xyz");
        assert!(!object.fields().contains_key("id"));
    }

    #[derive(Debug, Clone)]
    struct ObjectId(String);

    impl TypedParameter for ObjectId {
        const KEY: &'static str = "id";
    }

    impl TryFrom<Json> for ObjectId {
        type Error = anyhow::Error;

        fn try_from(value: Json) -> Result<Self, Self::Error> {
            Ok(Self(serde_json::from_value(value)?))
        }
    }

    impl From<ObjectId> for Json {
        fn from(value: ObjectId) -> Self {
            Json::String(value.0)
        }
    }

    #[test]
    fn identity_parameter_is_ignored() {
        let wallet = wallet();
        let object = wallet
            .build_object("abc123", "xyz")
            .with_parameter(ObjectId("issuer1.other".into()))
            .build();

        assert_eq!(
            serde_json::to_string(&object).unwrap(),
            r#"{"id":"issuer1.abc123","classId":"issuer1.xyz","state":"ACTIVE"}"#
        );
    }

    #[test]
    fn state_and_localized_strings() {
        let wallet = wallet();
        let object = wallet
            .build_object("abc123", "xyz")
            .with_state(State::Inactive)
            .with_localized_string("subheader", "Attendee", "de-DE")
            .build();

        assert_eq!(object.get::<State>().unwrap().unwrap(), State::Inactive);
        assert_eq!(
            object.get::<Subheader>().unwrap().unwrap().0,
            LocalizedString::new("Attendee", "de-DE")
        );
    }
}
