//! Apple Wallet passes.
//!
//! An [AppleWallet] holds the signing identity and the pass defaults. Each issuance starts a
//! [PassBuilder] with [AppleWallet::build_pass], sets fields on it and consumes it with
//! [PassBuilder::download], which returns the signed `.pkpass` archive.
//!
//! ```ignore
//! let wallet = AppleWallet::new(&WalletsConfig::from_env()?)?;
//! let mut overrides = UntypedObject::new();
//! overrides.insert(SerialNumber("ticket-42".into()));
//!
//! let pkpass = wallet
//!     .build_pass(overrides)
//!     .with_barcode(Barcode::qr("ticket-42"))
//!     .with_pass_style(PassStyle::Generic)
//!     .add_primary_field("event", "Event", "RustConf")
//!     .download()
//!     .await?;
//! ```

use std::sync::Arc;

use chrono::Local;

use crate::{
    config::{AppConfig, AppleWalletConfig, WalletsConfig},
    core::object::UntypedObject,
    error::{WalletError, WalletResult},
};

use self::{
    assets::AssetBundle,
    parameters::{
        BackgroundColor, Description, ForegroundColor, FormatVersion, LogoText, OrganizationName,
        PassTypeIdentifier, RelevantDate, Rgb, SerialNumber, TeamIdentifier,
    },
    signer::{CertificateSigner, ManifestSigner},
};

pub use self::{builder::PassBuilder, package::PkPass};

pub mod assets;
mod builder;
pub mod package;
pub mod parameters;
pub mod signer;

const DEFAULT_SERIAL_NUMBER: &str = "12345678";

/// Issues Apple Wallet passes for one pass type identifier.
#[derive(Debug, Clone)]
pub struct AppleWallet {
    pass_type_identifier: String,
    team_identifier: String,
    config: AppleWalletConfig,
    app: AppConfig,
    signer: Arc<dyn ManifestSigner + Send + Sync>,
}

impl AppleWallet {
    /// Create a wallet signing with the configured PKCS#12 bundle.
    ///
    /// # Errors
    /// Fails when the identifiers are not configured or the bundle cannot be loaded.
    pub fn new(config: &WalletsConfig) -> WalletResult<Self> {
        let apple = &config.apple_wallet;
        let Some(bundle) = &apple.certificates_file_path else {
            return Err(WalletError::config(
                "the Apple Wallet certificate bundle path is not configured",
            ));
        };
        let signer = CertificateSigner::from_files(
            bundle,
            apple.certificates_password.as_deref().unwrap_or_default(),
            apple.wwdr_certificate_path.as_deref(),
        )?;
        Self::with_signer(config, Arc::new(signer))
    }

    /// Create a wallet signing through a custom [ManifestSigner].
    pub fn with_signer(
        config: &WalletsConfig,
        signer: Arc<dyn ManifestSigner + Send + Sync>,
    ) -> WalletResult<Self> {
        let apple = &config.apple_wallet;
        let Some(pass_type_identifier) = apple.pass_identifier.clone() else {
            return Err(WalletError::config(
                "the Apple Wallet pass type identifier is not configured",
            ));
        };
        let Some(team_identifier) = apple.team_identifier.clone() else {
            return Err(WalletError::config(
                "the Apple Wallet team identifier is not configured",
            ));
        };

        Ok(Self {
            pass_type_identifier,
            team_identifier,
            config: apple.clone(),
            app: config.app.clone(),
            signer,
        })
    }

    /// Begin a new pass.
    ///
    /// `overrides` replaces the defaults key by key (shallow merge). The images of the configured
    /// assets directory are registered; missing ones are logged and skipped.
    pub fn build_pass(&self, overrides: UntypedObject) -> PassBuilder<'_> {
        let mut pass = self.default_pass();
        pass.merge(overrides);
        let assets = AssetBundle::from_directory(&self.config.assets_path);
        PassBuilder::new(self, pass, assets)
    }

    pub(crate) fn signer(&self) -> &(dyn ManifestSigner + Send + Sync) {
        self.signer.as_ref()
    }

    fn default_pass(&self) -> UntypedObject {
        let mut pass = UntypedObject::new();
        pass.insert(PassTypeIdentifier(self.pass_type_identifier.clone()));
        pass.insert(TeamIdentifier(self.team_identifier.clone()));
        pass.insert(LogoText(String::new()));
        pass.insert(Description(self.app.name.clone()));
        pass.insert(FormatVersion::default());
        pass.insert(OrganizationName(String::new()));
        pass.insert(SerialNumber(DEFAULT_SERIAL_NUMBER.to_string()));
        pass.insert(ForegroundColor::from(Rgb(0, 0, 0)));
        pass.insert(BackgroundColor::from(Rgb(255, 255, 255)));
        pass.insert(RelevantDate::from_datetime(&Local::now()));
        pass
    }
}
