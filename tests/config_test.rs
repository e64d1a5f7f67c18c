//! Configuration loading from TOML files.

use segtrim::config::{ensure_storage_dirs, load_config, load_config_or_default, Config};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_load_partial_config_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("segtrim.toml");
    fs::write(
        &path,
        r#"
[server]
port = 9000

[storage]
upload_dir = "/srv/segtrim/uploads"
scratch_dir = "/srv/segtrim/scratch"

[processing]
video_codec = "libx265"
allowed_extensions = ["mp4", "webm"]
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.storage.upload_dir, Path::new("/srv/segtrim/uploads"));
    assert_eq!(config.storage.output_dir, Path::new("output"));
    assert_eq!(
        config.storage.scratch_dir.as_deref(),
        Some(Path::new("/srv/segtrim/scratch"))
    );

    let options = config.processing.options();
    assert_eq!(options.codecs.video, "libx265");
    assert_eq!(options.codecs.audio, "aac");
    assert_eq!(options.parallel_cuts, 1);
    assert_eq!(config.processing.allowed_extensions, vec!["mp4", "webm"]);
}

#[test]
fn test_load_invalid_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[server\nport = ").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse"));
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    for body in [
        "[server]\nport = 0\n",
        "[server]\nmax_upload_mb = 0\n",
        "[processing]\naudio_codec = \"\"\n",
        "[processing]\nallowed_extensions = []\n",
    ] {
        fs::write(&path, body).unwrap();
        assert!(load_config(&path).is_err(), "accepted: {body}");
    }
}

#[test]
fn test_missing_explicit_path_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_config_or_default(Some(&dir.path().join("nope.toml"))).is_err());
}

#[test]
fn test_ensure_storage_dirs() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.storage.upload_dir = dir.path().join("a/uploads");
    config.storage.output_dir = dir.path().join("b/output");
    config.storage.scratch_dir = Some(dir.path().join("c/scratch"));

    ensure_storage_dirs(&config).unwrap();
    assert!(config.storage.upload_dir.is_dir());
    assert!(config.storage.output_dir.is_dir());
    assert!(dir.path().join("c/scratch").is_dir());
}
