use std::path::PathBuf;

use serde_json::{Map, Value as Json};
use tracing::{error, info, warn};

use crate::{
    core::object::{TypedParameter, UntypedObject},
    error::WalletResult,
};

use super::{
    assets::AssetBundle,
    package::{package, PkPass},
    parameters::{
        Barcode, Field, FieldGroup, PassStyle, PassTypeIdentifier, SerialNumber, TeamIdentifier,
    },
    AppleWallet,
};

const IDENTITY_KEYS: [&str; 3] = [
    PassTypeIdentifier::KEY,
    TeamIdentifier::KEY,
    SerialNumber::KEY,
];

/// A pass being assembled for one issuance.
#[derive(Debug, Clone)]
#[must_use]
pub struct PassBuilder<'a> {
    pass: UntypedObject,
    style: PassStyle,
    assets: AssetBundle,
    wallet: &'a AppleWallet,
}

impl<'a> PassBuilder<'a> {
    pub(crate) fn new(wallet: &'a AppleWallet, pass: UntypedObject, assets: AssetBundle) -> Self {
        Self {
            pass,
            style: PassStyle::default(),
            assets,
            wallet,
        }
    }

    /// Set a known top-level key.
    ///
    /// Identity keys are taken from the overrides given to [AppleWallet::build_pass] and are
    /// ignored here.
    pub fn with_parameter<T: TypedParameter>(mut self, t: T) -> Self {
        if self.is_identity(T::KEY) {
            return self;
        }
        self.pass.insert(t);
        self
    }

    /// Set or overwrite any top-level key of `pass.json`.
    ///
    /// The key is not checked against the pass schema. `passTypeIdentifier`, `teamIdentifier`
    /// and `serialNumber` are fixed when the builder is created and cannot be overwritten.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        let key = key.into();
        if self.is_identity(&key) {
            return self;
        }
        self.pass.insert_raw(key, value.into());
        self
    }

    fn is_identity(&self, key: &str) -> bool {
        let identity = IDENTITY_KEYS.contains(&key);
        if identity {
            warn!("ignoring attempt to overwrite '{key}'");
        }
        identity
    }

    pub fn with_barcode(self, barcode: Barcode) -> Self {
        self.with_parameter(barcode)
    }

    /// Select the pass style fields are added to and reset its container.
    ///
    /// `generic` starts with its five empty field groups, other styles with an empty container.
    /// Selecting a style again discards the fields already added to it.
    pub fn with_pass_style(mut self, style: impl Into<PassStyle>) -> Self {
        self.style = style.into();
        self.pass
            .insert_raw(self.style.as_str(), self.style.initial_container());
        self
    }

    /// Append a field to a group of the active pass style.
    ///
    /// The style container and the group are created if needed. Fields keep the order in which
    /// they were added.
    pub fn add_field(mut self, group: FieldGroup, field: Field) -> Self {
        let style = self.style.as_str();
        let container = self
            .pass
            .0
            .entry(style)
            .or_insert_with(|| Json::Object(Map::new()));
        if !container.is_object() {
            warn!("replacing non-object '{style}' entry to hold field groups");
            *container = Json::Object(Map::new());
        }

        if let Some(container) = container.as_object_mut() {
            let fields = container
                .entry(group.as_str())
                .or_insert_with(|| Json::Array(vec![]));
            if !fields.is_array() {
                warn!("replacing non-array '{style}.{group}' entry");
                *fields = Json::Array(vec![]);
            }
            if let Some(fields) = fields.as_array_mut() {
                fields.push(field.into());
            }
        }
        self
    }

    pub fn add_header_field(
        self,
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<Json>,
    ) -> Self {
        self.add_field(FieldGroup::Header, Field::new(key, label, value))
    }

    pub fn add_primary_field(
        self,
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<Json>,
    ) -> Self {
        self.add_field(FieldGroup::Primary, Field::new(key, label, value))
    }

    pub fn add_secondary_field(
        self,
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<Json>,
    ) -> Self {
        self.add_field(FieldGroup::Secondary, Field::new(key, label, value))
    }

    pub fn add_auxiliary_field(
        self,
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<Json>,
    ) -> Self {
        self.add_field(FieldGroup::Auxiliary, Field::new(key, label, value))
    }

    pub fn add_back_field(
        self,
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<Json>,
    ) -> Self {
        self.add_field(FieldGroup::Back, Field::new(key, label, value))
    }

    /// Bundle in-memory content, e.g. a per-pass `thumbnail.png`.
    pub fn with_asset(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.assets.add_bytes(name, bytes);
        self
    }

    /// Bundle a file; a missing file is logged and skipped.
    pub fn with_asset_file(mut self, path: impl Into<PathBuf>) -> Self {
        if let Err(e) = self.assets.add_file(path) {
            error!("{e}");
        }
        self
    }

    pub fn pass_style(&self) -> &PassStyle {
        &self.style
    }

    pub fn pass(&self) -> &UntypedObject {
        &self.pass
    }

    pub fn assets(&self) -> &AssetBundle {
        &self.assets
    }

    /// The `pass.json` content, without packaging.
    pub fn build(self) -> UntypedObject {
        self.pass
    }

    /// Sign and zip the pass.
    ///
    /// Failures are logged and returned; nothing is retried.
    pub async fn download(self) -> WalletResult<PkPass> {
        let serial_number = match self.pass.get::<SerialNumber>() {
            Some(Ok(serial_number)) => serial_number.0,
            _ => "pass".to_string(),
        };

        match package(&self.pass, &self.assets, self.wallet.signer()).await {
            Ok(bytes) => {
                info!(
                    serial_number,
                    assets = self.assets.len(),
                    "created Apple Wallet pass"
                );
                Ok(PkPass::new(bytes, serial_number))
            }
            Err(e) => {
                error!("unable to create Apple Wallet pass {serial_number}: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::{
        apple::signer::ManifestSigner,
        config::WalletsConfig,
        error::{WalletError, WalletResult},
    };

    use super::*;

    #[derive(Debug)]
    struct FailingSigner;

    #[async_trait]
    impl ManifestSigner for FailingSigner {
        async fn sign(&self, _manifest: &[u8]) -> WalletResult<Vec<u8>> {
            Err(WalletError::signing("hardware token unplugged"))
        }
    }

    fn wallet() -> AppleWallet {
        let mut config = WalletsConfig::default();
        config.apple_wallet.pass_identifier = Some("pass.com.example.test".into());
        config.apple_wallet.team_identifier = Some("ABCDE12345".into());
        config.apple_wallet.assets_path.0 = "/nonexistent/assets".into();
        AppleWallet::with_signer(&config, Arc::new(FailingSigner)).unwrap()
    }

    fn group(pass: &UntypedObject, style: &str, group: FieldGroup) -> Json {
        pass.get_raw(style).unwrap()[group.as_str()].clone()
    }

    #[test]
    fn fields_keep_call_order() {
        let wallet = wallet();
        let pass = wallet
            .build_pass(UntypedObject::new())
            .add_secondary_field("b", "B", "2")
            .add_secondary_field("a", "A", "1")
            .add_secondary_field("b", "B", "2")
            .build();

        assert_eq!(
            group(&pass, "generic", FieldGroup::Secondary),
            json!([
                { "key": "b", "label": "B", "value": "2" },
                { "key": "a", "label": "A", "value": "1" },
                { "key": "b", "label": "B", "value": "2" }
            ])
        );
    }

    #[test]
    fn lazily_creates_style_container() {
        let wallet = wallet();
        let pass = wallet
            .build_pass(UntypedObject::new())
            .with_pass_style("eventTicket")
            .add_back_field("terms", "Terms", "No refunds")
            .build();

        assert_eq!(
            pass.get_raw("eventTicket").unwrap(),
            &json!({ "backFields": [{ "key": "terms", "label": "Terms", "value": "No refunds" }] })
        );
        assert!(!pass.contains_key("generic"));
    }

    #[test]
    fn reselecting_style_overwrites_groups() {
        let wallet = wallet();
        let pass = wallet
            .build_pass(UntypedObject::new())
            .with_pass_style(PassStyle::Generic)
            .add_header_field("seat", "Seat", "12A")
            .with_pass_style(PassStyle::Generic)
            .build();

        assert_eq!(pass.get_raw("generic").unwrap(), &PassStyle::Generic.initial_container());
    }

    #[test]
    fn replaces_non_object_container() {
        let wallet = wallet();
        let pass = wallet
            .build_pass(UntypedObject::new())
            .with_field("generic", "oops")
            .add_primary_field("name", "Name", "Ada")
            .build();

        assert_eq!(
            group(&pass, "generic", FieldGroup::Primary),
            json!([{ "key": "name", "label": "Name", "value": "Ada" }])
        );
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let wallet = wallet();
        let overrides: UntypedObject = json!({
            "serialNumber": "ticket-42",
            "organizationName": "Example Org"
        })
        .try_into()
        .unwrap();

        let pass = wallet.build_pass(overrides).build();

        assert_eq!(pass.get_raw("serialNumber").unwrap(), "ticket-42");
        assert_eq!(pass.get_raw("organizationName").unwrap(), "Example Org");
        assert_eq!(pass.get_raw("passTypeIdentifier").unwrap(), "pass.com.example.test");
        assert_eq!(pass.get_raw("teamIdentifier").unwrap(), "ABCDE12345");
        assert_eq!(pass.get_raw("formatVersion").unwrap(), 1);
        assert_eq!(pass.get_raw("description").unwrap(), "Wallet");
        assert_eq!(pass.get_raw("foregroundColor").unwrap(), "rgb(0, 0, 0)");
        assert_eq!(pass.get_raw("backgroundColor").unwrap(), "rgb(255, 255, 255)");
        assert!(pass.contains_key("relevantDate"));
    }

    #[test]
    fn barcode_is_stored_under_barcode() {
        let wallet = wallet();
        let pass = wallet
            .build_pass(UntypedObject::new())
            .with_barcode(Barcode::qr("hello"))
            .build();

        assert_eq!(
            pass.get_raw("barcode").unwrap(),
            &json!({
                "format": "PKBarcodeFormatQR",
                "message": "hello",
                "messageEncoding": "iso-8859-1"
            })
        );
    }

    #[test]
    fn identity_cannot_be_overwritten() {
        let wallet = wallet();
        let overrides: UntypedObject = json!({ "serialNumber": "ticket-42" }).try_into().unwrap();
        let pass = wallet
            .build_pass(overrides)
            .with_field("passTypeIdentifier", "pass.com.example.other")
            .with_field("teamIdentifier", "ZZZZZ99999")
            .with_parameter(SerialNumber("changed".into()))
            .with_field("organizationName", "Example Org")
            .build();

        assert_eq!(pass.get_raw("passTypeIdentifier").unwrap(), "pass.com.example.test");
        assert_eq!(pass.get_raw("teamIdentifier").unwrap(), "ABCDE12345");
        assert_eq!(pass.get_raw("serialNumber").unwrap(), "ticket-42");
        assert_eq!(pass.get_raw("organizationName").unwrap(), "Example Org");
    }

    #[tokio::test]
    async fn signing_failure_is_returned() {
        let wallet = wallet();
        let err = wallet
            .build_pass(UntypedObject::new())
            .download()
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::Signing { .. }));
    }
}
