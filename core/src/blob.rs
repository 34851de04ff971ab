use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use crate::store::BlobStore;

pub const AVATARS_BUCKET: &str = "avatars";
pub const WORKOUT_PHOTOS_BUCKET: &str = "workout-photos";
pub const WORKOUT_VIDEOS_BUCKET: &str = "workout-videos";

/// Content-type family each bucket accepts.
fn accepted_media(bucket: &str) -> Option<&'static str> {
    match bucket {
        AVATARS_BUCKET | WORKOUT_PHOTOS_BUCKET => Some("image/"),
        WORKOUT_VIDEOS_BUCKET => Some("video/"),
        _ => None,
    }
}

#[must_use]
pub fn accepts_content_type(bucket: &str, content_type: &str) -> bool {
    accepted_media(bucket).is_some_and(|family| content_type.starts_with(family))
}

/// Guess a content type from a file extension.
#[must_use]
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "m4v" => "video/x-m4v",
        _ => return None,
    };
    Some(content_type)
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/x-m4v" => "m4v",
        _ => "bin",
    }
}

/// A fresh, collision-free object path under the user's prefix.
#[must_use]
pub fn object_path(user_id: &str, content_type: &str) -> String {
    format!("{user_id}/{}.{}", Uuid::new_v4(), extension_for(content_type))
}

/// Blob store backed by a local directory, one subdirectory per bucket.
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(bucket: &str, path: &str, content_type: &str) -> Result<()> {
        let Some(family) = accepted_media(bucket) else {
            bail!("Unknown bucket '{bucket}'");
        };
        if !content_type.starts_with(family) {
            bail!("Bucket '{bucket}' only accepts {family}* content, got '{content_type}'");
        }
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            bail!("Invalid object path '{path}'");
        }
        Ok(())
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        Self::validate(bucket, path, content_type)?;

        let target = self.root.join(bucket).join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&target, bytes)
            .with_context(|| format!("Failed to write object: {}", target.display()))?;
        tracing::debug!(bucket, path, size = bytes.len(), "stored object");

        Ok(format!("{}/{bucket}/{path}", self.base_url))
    }
}
