mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./segtrim.toml",
        "~/.config/segtrim/config.toml",
        "/etc/segtrim/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Create the upload and output directories if they are missing
pub fn ensure_storage_dirs(config: &Config) -> Result<()> {
    for dir in [&config.storage.upload_dir, &config.storage.output_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }
    if let Some(ref dir) = config.storage.scratch_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }
    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.max_upload_mb == 0 {
        anyhow::bail!("Upload limit cannot be 0");
    }

    if config.processing.video_codec.trim().is_empty()
        || config.processing.audio_codec.trim().is_empty()
    {
        anyhow::bail!("Video and audio codecs must both be set");
    }

    if config.processing.parallel_cuts == 0 {
        anyhow::bail!("parallel_cuts must be at least 1");
    }

    if config.processing.allowed_extensions.is_empty() {
        anyhow::bail!("At least one upload extension must be allowed");
    }

    if config.processing.parallel_cuts > num_cpus::get() {
        tracing::warn!(
            "parallel_cuts ({}) exceeds the number of CPUs ({})",
            config.processing.parallel_cuts,
            num_cpus::get()
        );
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    Ok(())
}
