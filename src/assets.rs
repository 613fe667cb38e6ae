use crate::{classification::ImageFile, config::AssetsConfig};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::instrument;

/// The bundled example images, in gallery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleImage {
    Cat,
    Dog,
    Teddy,
    Grizzly,
    Dunno,
    Black,
}

impl ExampleImage {
    pub const ALL: [ExampleImage; 6] = [
        ExampleImage::Cat,
        ExampleImage::Dog,
        ExampleImage::Teddy,
        ExampleImage::Grizzly,
        ExampleImage::Dunno,
        ExampleImage::Black,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExampleImage::Cat => "cat",
            ExampleImage::Dog => "dog",
            ExampleImage::Teddy => "teddy",
            ExampleImage::Grizzly => "grizzly",
            ExampleImage::Dunno => "dunno",
            ExampleImage::Black => "black",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExampleImage::Cat => "cat.jpg",
            ExampleImage::Dog => "dog.jpg",
            ExampleImage::Teddy => "teddy.jpg",
            ExampleImage::Grizzly => "grizzly.jpg",
            ExampleImage::Dunno => "dunno.jpg",
            ExampleImage::Black => "black.jpg",
        }
    }

    /// Path under which this server serves the asset; also its preview reference.
    pub fn public_path(&self) -> String {
        format!("/assets/{}", self.file_name())
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|asset| asset.file_name() == file_name)
    }
}

impl fmt::Display for ExampleImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExampleImage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|asset| asset.name() == s)
            .ok_or_else(|| format!("{} is not a known example image", s))
    }
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to fetch asset: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Asset request returned status {0}")]
    Status(StatusCode),
    #[error("Asset body is empty")]
    Empty,
}

#[async_trait]
pub trait AssetSource: Send + Sync + 'static {
    async fn load(&self, asset: ExampleImage) -> Result<Bytes, AssetError>;
}

/// Fetches examples over HTTP from `assets.base_url`, one attempt per call.
pub struct HttpAssetSource {
    client: Client,
    base_url: String,
}

impl HttpAssetSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AssetError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AssetsConfig) -> Result<Self, AssetError> {
        Self::new(&config.base_url, config.get_timeout())
    }

    pub fn asset_url(&self, asset: ExampleImage) -> String {
        format!("{}/{}", self.base_url, asset.file_name())
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    #[instrument(skip(self))]
    async fn load(&self, asset: ExampleImage) -> Result<Bytes, AssetError> {
        let response = self.client.get(self.asset_url(asset)).send().await?;
        if !response.status().is_success() {
            return Err(AssetError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AssetError::Empty);
        }

        tracing::debug!("Loaded example {} ({} bytes)", asset, bytes.len());
        Ok(bytes)
    }
}

/// Loads an example and wraps it the way an upload is wrapped.
pub async fn load_example_file(
    source: &dyn AssetSource,
    asset: ExampleImage,
) -> Result<ImageFile, AssetError> {
    let bytes = source.load(asset).await?;
    Ok(ImageFile::new(bytes, "example.jpg", "image/jpeg"))
}
