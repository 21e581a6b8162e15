//! Embedded static assets

use axum::body::Bytes;
use rust_embed::RustEmbed;

use super::server::ServerError;

/// Name of the upload page inside the asset bundle
pub const INDEX_HTML: &str = "index.html";

#[derive(RustEmbed)]
#[folder = "assets/"]
struct UiAssets;

/// Load the upload page from the asset bundle
pub fn index_html() -> Result<Bytes, ServerError> {
    UiAssets::get(INDEX_HTML)
        .map(|file| Bytes::from(file.data.into_owned()))
        .ok_or(ServerError::MissingAsset(INDEX_HTML))
}
