use anyhow::Context;
use bytes::Bytes;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::UPLOADS_ROUTE;
use crate::storage::StorageClient;

/// A file part received with a signup form.
#[derive(Debug)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub key: String,
    /// Path stored on the user record, e.g. `/uploads/<key>`.
    pub reference: String,
}

lazy_static! {
    static ref EXT_RE: Regex = Regex::new(r"^[A-Za-z0-9]{1,8}$").unwrap();
}

pub async fn store_photo(
    storage: &dyn StorageClient,
    item: UploadItem,
) -> anyhow::Result<StoredPhoto> {
    let ext = item
        .content_type
        .as_deref()
        .and_then(ext_from_mime)
        .map(str::to_string)
        .or_else(|| item.file_name.as_deref().and_then(ext_from_file_name))
        .unwrap_or_else(|| "bin".into());
    let key = generate_key(&ext);
    let content_type = item
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    storage
        .put_object(&key, item.body, content_type)
        .await
        .with_context(|| format!("store photo {}", key))?;

    info!(%key, "photo stored");
    Ok(StoredPhoto {
        reference: format!("{}/{}", UPLOADS_ROUTE, key),
        key,
    })
}

/// Best-effort removal of a photo whose owning record was never written.
pub async fn discard_photo(storage: &dyn StorageClient, photo: &StoredPhoto) {
    if let Err(e) = storage.delete_object(&photo.key).await {
        warn!(error = %e, key = %photo.key, "discarding orphaned photo failed");
    }
}

/// `<unix-millis>-<random>.<ext>`
fn generate_key(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}.{}", millis, suffix, ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn ext_from_file_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    EXT_RE.is_match(ext).then(|| ext.to_ascii_lowercase())
}
