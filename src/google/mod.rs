//! Google Wallet generic passes.
//!
//! A [GoogleWallet] holds the issuer's service-account credentials. Objects are assembled with an
//! [ObjectBuilder], published through the Wallet Objects REST API and handed to the holder as an
//! "Add to Google Wallet" link.
//!
//! ```ignore
//! let wallet = GoogleWallet::new(&WalletsConfig::from_env()?)?;
//! let object = wallet
//!     .build_object("ticket-42", "summer-festival")
//!     .with_card_title("Summer Festival")
//!     .with_header("Ada Lovelace")
//!     .with_barcode(Barcode::qr("ticket-42"))
//!     .find_or_create()
//!     .await?;
//! let link = wallet.save_link(object.id(), object.class_id())?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};
use url::Url;

use crate::{
    config::WalletsConfig,
    core::util::{AsyncHttpClient, ReqwestClient},
    error::{WalletError, WalletResult},
};

use self::{
    client::WalletObjectsClient,
    credentials::{ServiceAccountKey, TokenSource, WALLET_OBJECT_ISSUER_SCOPE},
    save_link::{ObjectReference, SaveClaims},
};

pub use self::{
    builder::ObjectBuilder,
    object::{GenericObject, WalletObject},
};

mod builder;
pub mod client;
pub mod credentials;
pub mod object;
pub mod parameters;
pub mod save_link;

/// Issues Google Wallet objects for one issuer account.
#[derive(Debug, Clone)]
pub struct GoogleWallet {
    issuer_id: String,
    origin: String,
    tokens: Arc<TokenSource>,
    client: WalletObjectsClient,
}

impl GoogleWallet {
    /// Create a wallet from the configured service-account key file.
    ///
    /// # Errors
    /// Fails when the issuer id is missing or the key file cannot be read or parsed.
    pub fn new(config: &WalletsConfig) -> WalletResult<Self> {
        let key = ServiceAccountKey::from_file(&config.google_wallet.auth_file_path)?;
        let http_client = ReqwestClient::new().map_err(|e| WalletError::Network {
            message: format!("{e:#}"),
        })?;
        Self::with_key(config, key, Arc::new(http_client))
    }

    /// Create a wallet from an already loaded key.
    pub fn with_key(
        config: &WalletsConfig,
        key: ServiceAccountKey,
        http_client: Arc<dyn AsyncHttpClient + Send + Sync>,
    ) -> WalletResult<Self> {
        let google = &config.google_wallet;
        if google.issuer_id.is_empty() {
            return Err(WalletError::config(
                "the Google Wallet issuer id is not configured",
            ));
        }

        let tokens = Arc::new(TokenSource::new(key, WALLET_OBJECT_ISSUER_SCOPE)?);
        Ok(Self {
            issuer_id: google.issuer_id.clone(),
            origin: config.app.url.origin().ascii_serialization(),
            client: WalletObjectsClient::new(
                google.api_base_url.clone(),
                tokens.clone(),
                http_client,
            ),
            tokens,
        })
    }

    /// Use another transport for the OAuth2 and Wallet Objects calls.
    pub fn with_http_client(mut self, http_client: Arc<dyn AsyncHttpClient + Send + Sync>) -> Self {
        self.client = self.client.with_http_client(http_client);
        self
    }

    pub fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    /// `{issuer_id}.{suffix}`, the id of an object or class of this issuer.
    pub fn qualified_id(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.issuer_id)
    }

    /// Begin a new object `{issuer_id}.{object_suffix}` of class `{issuer_id}.{class_suffix}`.
    ///
    /// The object starts in the `ACTIVE` state.
    pub fn build_object(&self, object_suffix: &str, class_suffix: &str) -> ObjectBuilder<'_> {
        ObjectBuilder::new(
            self,
            self.qualified_id(object_suffix),
            self.qualified_id(class_suffix),
        )
    }

    /// Look up the generic object `{issuer_id}.{object_suffix}`.
    ///
    /// A missing object is `Ok(None)`; other failures are logged and returned.
    pub async fn find_object(&self, object_suffix: &str) -> WalletResult<Option<GenericObject>> {
        self.find(object_suffix).await
    }

    pub async fn find<T: WalletObject>(&self, object_suffix: &str) -> WalletResult<Option<T>> {
        let id = self.qualified_id(object_suffix);
        match self.client.get::<T>(&id).await {
            Ok(object) => Ok(Some(object)),
            Err(e) if e.is_not_found() => {
                debug!(id, "{} does not exist", T::RESOURCE);
                Ok(None)
            }
            Err(e) => {
                error!("unable to fetch {} {id}: {e}", T::RESOURCE);
                Err(e)
            }
        }
    }

    /// Insert an object, returning it as stored by the API.
    pub async fn create<T: WalletObject>(&self, object: &T) -> WalletResult<T> {
        match self.client.insert(object).await {
            Ok(created) => {
                info!(id = created.id(), "created {}", T::RESOURCE);
                Ok(created)
            }
            Err(e) => {
                error!("unable to create {} {}: {e}", T::RESOURCE, object.id());
                Err(e)
            }
        }
    }

    /// Return the stored object with the same id, creating it when it does not exist.
    ///
    /// A failed lookup is logged and handled like a missing object.
    pub async fn find_or_create<T: WalletObject>(&self, object: T) -> WalletResult<T> {
        let suffix = object
            .id()
            .split_once('.')
            .map(|(_, suffix)| suffix)
            .unwrap_or_default();

        if let Ok(Some(found)) = self.find::<T>(suffix).await {
            return Ok(found);
        }
        self.create(&object).await
    }

    /// "Add to Google Wallet" link for a generic object.
    pub fn save_link(&self, object_id: &str, class_id: &str) -> WalletResult<Url> {
        self.save_link_for(GenericObject::SAVE_KEY, object_id, class_id)
    }

    /// "Add to Google Wallet" link listing one object under `object_type`, e.g. `genericObjects`.
    pub fn save_link_for(
        &self,
        object_type: &str,
        object_id: &str,
        class_id: &str,
    ) -> WalletResult<Url> {
        let reference = ObjectReference {
            id: object_id.to_string(),
            class_id: class_id.to_string(),
        };
        let key = self.tokens.key();
        let claims = SaveClaims::new(key, self.origin.clone(), object_type, reference)?;

        match save_link::sign(key, self.tokens.encoding_key(), &claims) {
            Ok(url) => {
                info!(object_id, object_type, "created save link");
                Ok(url)
            }
            Err(e) => {
                error!("unable to sign save link for {object_id}: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use http::{Request, Response};

    use super::*;

    const SERVICE_ACCOUNT: &[u8] = include_bytes!("../../tests/examples/service_account.json");

    struct Offline;

    #[async_trait]
    impl AsyncHttpClient for Offline {
        async fn execute(&self, _request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
            bail!("offline")
        }
    }

    fn config(issuer_id: &str) -> WalletsConfig {
        let mut config = WalletsConfig::default();
        config.google_wallet.issuer_id = issuer_id.into();
        config
    }

    fn wallet() -> GoogleWallet {
        let key = ServiceAccountKey::from_slice(SERVICE_ACCOUNT).unwrap();
        GoogleWallet::with_key(&config("issuer1"), key, Arc::new(Offline)).unwrap()
    }

    #[test]
    fn requires_issuer_id() {
        let key = ServiceAccountKey::from_slice(SERVICE_ACCOUNT).unwrap();
        let err = GoogleWallet::with_key(&config(""), key, Arc::new(Offline)).unwrap_err();
        assert!(matches!(err, WalletError::Config { .. }));
    }

    #[test]
    fn missing_key_file_is_fatal() {
        let mut config = config("issuer1");
        config.google_wallet.auth_file_path = "/nonexistent/key.json".into();
        let err = GoogleWallet::new(&config).unwrap_err();
        assert!(matches!(err, WalletError::Credentials { .. }));
    }

    #[test]
    fn qualifies_ids_with_issuer() {
        let wallet = wallet();
        let object = wallet.build_object("abc123", "xyz").build();
        assert_eq!(object.id(), "issuer1.abc123");
        assert_eq!(object.class_id(), "issuer1.xyz");
    }

    #[tokio::test]
    async fn transport_failure_is_returned() {
        let err = wallet().find_object("abc123").await.unwrap_err();
        assert!(matches!(err, WalletError::Unauthorized { .. }));
    }

    #[test]
    fn save_link_prefix() {
        let link = wallet().save_link("issuer1.abc123", "issuer1.xyz").unwrap();
        assert!(link.as_str().starts_with("https://pay.google.com/gp/v/save/"));
        let token = link.path().trim_start_matches("/gp/v/save/");
        assert_eq!(token.split('.').count(), 3);
    }
}
