use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Overrides the platform data directory (useful for tests and multiple profiles).
pub const DATA_DIR_ENV: &str = "REPS_DATA_DIR";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub media_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("", "", "reps")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        Self::at(&data_dir)
    }

    fn at(data_dir: &Path) -> Result<Self> {
        let media_dir = data_dir.join("media");
        std::fs::create_dir_all(&media_dir)
            .with_context(|| format!("Failed to create data directory: {}", media_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("reps.db"),
            data_dir: data_dir.to_path_buf(),
            media_dir,
        })
    }

    /// Base URL stored for uploaded media: the media directory as a `file://` URL.
    pub fn media_url(&self) -> String {
        format!("file://{}", self.media_dir.display())
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        tracing::info!(path = %path.display(), "generated API key");
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok((key, true))
    }
}
