use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

use crate::error::{WalletError, WalletResult};

pub const GOOGLE_WALLET_APPLICATION_CREDENTIALS: &str = "GOOGLE_WALLET_APPLICATION_CREDENTIALS";
pub const GOOGLE_WALLET_ISSUER_ID: &str = "GOOGLE_WALLET_ISSUER_ID";
pub const GOOGLE_WALLET_API_BASE_URL: &str = "GOOGLE_WALLET_API_BASE_URL";
pub const APPLE_WALLET_CERTIFICATES_FILE_PATH: &str = "APPLE_WALLET_CERTIFICATES_FILE_PATH";
pub const APPLE_WALLET_CERTIFICATES_PASSWORD: &str = "APPLE_WALLET_CERTIFICATES_PASSWORD";
pub const APPLE_WALLET_PASS_IDENTIFIER: &str = "APPLE_WALLET_PASS_IDENTIFIER";
pub const APPLE_WALLET_TEAM_IDENTIFIER: &str = "APPLE_WALLET_TEAM_IDENTIFIER";
pub const APPLE_WALLET_WWDR_CERTIFICATE_PATH: &str = "APPLE_WALLET_WWDR_CERTIFICATE_PATH";
pub const APPLE_WALLET_ASSETS_PATH: &str = "APPLE_WALLET_ASSETS_PATH";
pub const APP_NAME: &str = "APP_NAME";
pub const APP_URL: &str = "APP_URL";

const DEFAULT_APPLE_ASSETS_PATH: &str = "public/images/wallets/apple-assets/pass/";
const DEFAULT_GOOGLE_API_BASE_URL: &str = "https://walletobjects.googleapis.com/";
const DEFAULT_APP_NAME: &str = "Wallet";
const DEFAULT_APP_URL: &str = "http://localhost";

/// Process-wide wallet configuration, read once at startup.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WalletsConfig {
    pub app: AppConfig,
    pub apple_wallet: AppleWalletConfig,
    pub google_wallet: GoogleWalletConfig,
}

/// Identity of the issuing application.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Used as the default pass description.
    pub name: String,
    /// Used as the `origins` claim of save links.
    pub url: Url,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppleWalletConfig {
    /// PKCS#12 bundle holding the pass type certificate and its private key.
    pub certificates_file_path: Option<PathBuf>,
    pub certificates_password: Option<String>,
    pub pass_identifier: Option<String>,
    pub team_identifier: Option<String>,
    /// Apple WWDR intermediate certificate, PEM or DER.
    pub wwdr_certificate_path: Option<PathBuf>,
    pub assets_path: AssetsPath,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GoogleWalletConfig {
    /// Service-account key file from the Google Cloud console.
    pub auth_file_path: PathBuf,
    /// Prefix of every object and class id: `{issuer_id}.{suffix}`.
    pub issuer_id: String,
    pub api_base_url: BaseUrl,
}

/// Directory the pass images are read from.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct AssetsPath(pub PathBuf);

/// A url that is always a base (can be safely join()'ed with further path elements without
/// mangling).
#[derive(Deserialize, Debug, Clone, Hash, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct BaseUrl(Url);

impl WalletsConfig {
    /// Load the configuration from the process environment.
    ///
    /// Unset and empty variables fall back to their defaults. Whether the values are usable is
    /// only checked when a wallet service is constructed.
    pub fn from_env() -> WalletResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> WalletResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let app = AppConfig {
            name: var(APP_NAME).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            url: var(APP_URL)
                .unwrap_or_else(|| DEFAULT_APP_URL.to_string())
                .parse()
                .map_err(|e| WalletError::config(format!("{APP_URL} is not a valid url: {e}")))?,
        };

        let apple_wallet = AppleWalletConfig {
            certificates_file_path: var(APPLE_WALLET_CERTIFICATES_FILE_PATH).map(PathBuf::from),
            certificates_password: var(APPLE_WALLET_CERTIFICATES_PASSWORD),
            pass_identifier: var(APPLE_WALLET_PASS_IDENTIFIER),
            team_identifier: var(APPLE_WALLET_TEAM_IDENTIFIER),
            wwdr_certificate_path: var(APPLE_WALLET_WWDR_CERTIFICATE_PATH).map(PathBuf::from),
            assets_path: var(APPLE_WALLET_ASSETS_PATH)
                .map(|p| AssetsPath(p.into()))
                .unwrap_or_default(),
        };

        let google_wallet = GoogleWalletConfig {
            auth_file_path: var(GOOGLE_WALLET_APPLICATION_CREDENTIALS)
                .map(PathBuf::from)
                .unwrap_or_default(),
            issuer_id: var(GOOGLE_WALLET_ISSUER_ID).unwrap_or_default(),
            api_base_url: match var(GOOGLE_WALLET_API_BASE_URL) {
                Some(url) => BaseUrl::try_from(url).map_err(|e| {
                    WalletError::config(format!("{GOOGLE_WALLET_API_BASE_URL} is not a valid url: {e}"))
                })?,
                None => BaseUrl::default(),
            },
        };

        Ok(Self {
            app,
            apple_wallet,
            google_wallet,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            url: Url::parse(DEFAULT_APP_URL).expect("default app url is valid"),
        }
    }
}

impl Default for GoogleWalletConfig {
    fn default() -> Self {
        Self {
            auth_file_path: PathBuf::new(),
            issuer_id: String::new(),
            api_base_url: BaseUrl::default(),
        }
    }
}

impl Default for AssetsPath {
    fn default() -> Self {
        Self(DEFAULT_APPLE_ASSETS_PATH.into())
    }
}

impl std::ops::Deref for AssetsPath {
    type Target = PathBuf;

    fn deref(&self) -> &PathBuf {
        &self.0
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self(Url::parse(DEFAULT_GOOGLE_API_BASE_URL).expect("default api url is valid"))
    }
}

impl std::ops::Deref for BaseUrl {
    type Target = Url;

    fn deref(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = url::ParseError;

    fn try_from(mut url: String) -> Result<Self, Self::Error> {
        // Make URL a base.
        if !url.ends_with('/') {
            url += "/"
        }
        url.parse().map(Self)
    }
}
