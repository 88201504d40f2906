use jsonwebtoken::EncodingKey;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use url::Url;

use crate::error::{WalletError, WalletResult};

use super::credentials::ServiceAccountKey;

/// Prefix of every "Add to Google Wallet" link, followed by the signed JWT.
pub const SAVE_URL: &str = "https://pay.google.com/gp/v/save/";

pub const SAVE_TO_WALLET_TYPE: &str = "savetowallet";
const AUDIENCE: &str = "google";

/// Object reference listed in the save-link payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub id: String,
    pub class_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveClaims<'a> {
    iss: &'a str,
    aud: &'static str,
    origins: Vec<String>,
    typ: &'static str,
    payload: Map<String, Json>,
}

impl<'a> SaveClaims<'a> {
    pub(crate) fn new(
        key: &'a ServiceAccountKey,
        origin: String,
        object_type: &str,
        reference: ObjectReference,
    ) -> WalletResult<Self> {
        let reference = serde_json::to_value(reference)
            .map_err(|e| WalletError::signing(format!("unable to serialize payload: {e}")))?;

        let mut payload = Map::new();
        payload.insert(object_type.to_string(), Json::Array(vec![reference]));

        Ok(Self {
            iss: &key.client_email,
            aud: AUDIENCE,
            origins: vec![origin],
            typ: SAVE_TO_WALLET_TYPE,
            payload,
        })
    }
}

/// Sign the claims with the service account key and wrap the token in a save url.
pub(crate) fn sign(
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
    claims: &SaveClaims<'_>,
) -> WalletResult<Url> {
    let token = jsonwebtoken::encode(&key.jwt_header(), claims, encoding_key)?;
    Url::parse(SAVE_URL)
        .and_then(|base| base.join(&token))
        .map_err(|e| WalletError::signing(format!("unable to build save url: {e}")))
}
