use std::io::{Cursor, Write};

use openssl::sha::sha1;
use serde_json::{Map, Value as Json};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    core::object::UntypedObject,
    error::{WalletError, WalletResult},
};

use super::{assets::AssetBundle, signer::ManifestSigner};

pub const PASS_JSON: &str = "pass.json";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const SIGNATURE: &str = "signature";

/// A signed pass archive, ready to be served for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkPass {
    bytes: Vec<u8>,
    serial_number: String,
}

impl PkPass {
    pub const MIME_TYPE: &'static str = "application/vnd.apple.pkpass";

    pub(crate) fn new(bytes: Vec<u8>, serial_number: String) -> Self {
        Self {
            bytes,
            serial_number,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Suggested download name, `{serialNumber}.pkpass`.
    ///
    /// Path separators in the serial number are replaced with `_`, so the name is always a
    /// single path component.
    pub fn file_name(&self) -> String {
        let stem = self.serial_number.replace(['/', '\\'], "_");
        format!("{stem}.pkpass")
    }
}

/// The `manifest.json` of a pass: the SHA-1 digest of every other archive entry.
pub fn manifest<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Map<String, Json> {
    entries
        .into_iter()
        .map(|(name, bytes)| (name.to_string(), Json::String(hex::encode(sha1(bytes)))))
        .collect()
}

/// Serialize, hash, sign and zip a pass.
pub(crate) async fn package(
    pass: &UntypedObject,
    assets: &AssetBundle,
    signer: &(dyn ManifestSigner + Send + Sync),
) -> WalletResult<Vec<u8>> {
    let pass_json = serde_json::to_vec(pass)
        .map_err(|e| WalletError::packaging(format!("unable to serialize {PASS_JSON}: {e}")))?;

    let mut entries = vec![(PASS_JSON.to_string(), pass_json)];
    for asset in assets.iter() {
        if [PASS_JSON, MANIFEST_JSON, SIGNATURE].contains(&asset.name()) {
            return Err(WalletError::packaging(format!(
                "asset name '{}' is reserved",
                asset.name()
            )));
        }
        entries.push((asset.name().to_string(), asset.read().await?));
    }

    let manifest = manifest(
        entries
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
    );
    let manifest_json = serde_json::to_vec(&manifest)
        .map_err(|e| WalletError::packaging(format!("unable to serialize {MANIFEST_JSON}: {e}")))?;
    let signature = signer.sign(&manifest_json).await?;

    entries.push((MANIFEST_JSON.to_string(), manifest_json));
    entries.push((SIGNATURE.to_string(), signature));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)
            .map_err(|e| WalletError::packaging(format!("unable to write {name}: {e}")))?;
    }
    Ok(zip.finish()?.into_inner())
}
