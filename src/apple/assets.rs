use std::path::{Path, PathBuf};

use tracing::error;

use crate::error::{WalletError, WalletResult};

/// Images bundled with every pass, looked up in the configured assets directory.
pub const IMAGE_LIST: [&str; 18] = [
    "background.png",
    "background@2x.png",
    "background@3x.png",
    "footer.png",
    "footer@2x.png",
    "footer@3x.png",
    "icon.png",
    "icon@2x.png",
    "icon@3x.png",
    "logo.png",
    "logo@2x.png",
    "logo@3x.png",
    "strip.png",
    "strip@2x.png",
    "strip@3x.png",
    "thumbnail.png",
    "thumbnail@2x.png",
    "thumbnail@3x.png",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum AssetSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// A file stored in the pass archive next to `pass.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    name: String,
    source: AssetSource,
}

impl Asset {
    /// The archive entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) async fn read(&self) -> WalletResult<Vec<u8>> {
        match &self.source {
            AssetSource::Bytes(bytes) => Ok(bytes.clone()),
            AssetSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                WalletError::packaging(format!("unable to read asset {}: {e}", path.display()))
            }),
        }
    }
}

/// The ordered set of files bundled with a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBundle(Vec<Asset>);

impl AssetBundle {
    /// Register every [IMAGE_LIST] entry found in `dir`.
    ///
    /// Missing images are logged and skipped, a pass without optional art is still valid.
    pub fn from_directory(dir: &Path) -> Self {
        let mut bundle = Self::default();
        for image in IMAGE_LIST {
            if let Err(e) = bundle.add_file(dir.join(image)) {
                error!("{e}");
            }
        }
        bundle
    }

    /// Register a file, named after its file name in the archive.
    ///
    /// A file registered under an existing name replaces it.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> WalletResult<()> {
        let path = path.into();
        if !path.is_file() {
            return Err(WalletError::packaging(format!(
                "asset {} does not exist",
                path.display()
            )));
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            return Err(WalletError::packaging(format!(
                "asset {} has no usable file name",
                path.display()
            )));
        };
        self.push(Asset {
            name,
            source: AssetSource::File(path),
        });
        Ok(())
    }

    /// Register in-memory content under `name`.
    pub fn add_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.push(Asset {
            name: name.into(),
            source: AssetSource::Bytes(bytes),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, asset: Asset) {
        self.0.retain(|a| a.name != asset.name);
        self.0.push(asset);
    }
}
