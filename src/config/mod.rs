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

    // Try default locations
    let default_paths = [
        "./tubedigest.toml",
        "./config.toml",
        "~/.config/tubedigest/config.toml",
        "/etc/tubedigest/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let schedule = &config.schedule;
    for (name, secs) in [
        ("discovery_secs", schedule.discovery_secs),
        ("transcription_secs", schedule.transcription_secs),
        ("summarization_secs", schedule.summarization_secs),
        ("translation_secs", schedule.translation_secs),
        ("publication_secs", schedule.publication_secs),
    ] {
        if secs == 0 {
            anyhow::bail!("schedule.{name} cannot be 0");
        }
    }

    if config.captions.pause_min_secs > config.captions.pause_max_secs {
        anyhow::bail!(
            "captions.pause_min_secs ({}) is greater than pause_max_secs ({})",
            config.captions.pause_min_secs,
            config.captions.pause_max_secs
        );
    }

    if config.database.pool_size == 0 {
        anyhow::bail!("database.pool_size cannot be 0");
    }

    if config.youtube.recent_page_size == 0 || config.youtube.recent_page_size > 50 {
        anyhow::bail!("youtube.recent_page_size must be between 1 and 50");
    }

    if let Some(path) = &config.captions.yt_dlp_path {
        if !path.exists() {
            tracing::warn!("Configured yt-dlp path does not exist: {:?}", path);
        }
    }

    Ok(())
}

/// Non-fatal problems worth surfacing to the operator.
pub fn config_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Err(e) = config.require_credentials() {
        warnings.push(e.to_string());
    }
    if config.schedule.publication_secs < 60 {
        warnings.push("schedule.publication_secs below 60 may hit Graph API rate limits".into());
    }
    if config.database.pool_size < 6 {
        warnings.push(format!(
            "database.pool_size {} is below one connection per worker plus admin access",
            config.database.pool_size
        ));
    }
    if config.captions.pause_max_secs < 10 {
        warnings.push("captions.pause_max_secs below 10 risks caption download throttling".into());
    }

    warnings
}

/// Database path with `~` expanded.
pub fn database_path(config: &Config) -> String {
    shellexpand::tilde(&config.database.path).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[database]
path = "/var/lib/tubedigest/store.db"
busy_timeout_ms = 750

[youtube]
api_key = "yt-key"

[summarizer]
base_url = "http://localhost:1234/v1"

[translator]
api_key = "tr-key"
region = "westeurope"

[publisher]
page_id = "1234567890"
access_token = "page-token"

[captions]
pause_min_secs = 1
pause_max_secs = 2

[schedule]
publication_secs = 120
"#;

    #[test]
    fn defaults_match_worker_cadence() {
        let config = Config::default();
        assert_eq!(config.schedule.discovery_secs, 3600);
        assert_eq!(config.schedule.transcription_secs, 1800);
        assert_eq!(config.schedule.summarization_secs, 1800);
        assert_eq!(config.schedule.translation_secs, 600);
        assert_eq!(config.schedule.publication_secs, 300);
        assert_eq!(config.captions.pause_min_secs, 50);
        assert_eq!(config.captions.pause_max_secs, 70);
        assert_eq!(config.youtube.min_length_secs, 1800);
        assert_eq!(config.youtube.recent_page_size, 25);
        assert_eq!(config.translator.source_language, "en");
        assert_eq!(config.translator.target_language, "ka");
    }

    #[test]
    fn parses_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubedigest.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.path, "/var/lib/tubedigest/store.db");
        let pool = config.database.pool_settings();
        assert_eq!(pool.max_size, 6);
        assert_eq!(pool.busy_timeout, std::time::Duration::from_millis(750));
        assert_eq!(config.translator.region.as_deref(), Some("westeurope"));
        assert_eq!(config.schedule.publication_secs, 120);
        assert_eq!(config.schedule.discovery_secs, 3600);
        assert!(config.require_credentials().is_ok());
    }

    #[test]
    fn missing_credentials_are_fatal_and_listed() {
        let err = Config::default().require_credentials().unwrap_err();
        assert!(err.is_fatal());
        let msg = err.to_string();
        for key in [
            "youtube.api_key",
            "summarizer.base_url",
            "translator.api_key",
            "publisher.page_id",
            "publisher.access_token",
        ] {
            assert!(msg.contains(key), "{key} not reported in: {msg}");
        }
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let mut config: Config = toml::from_str(FULL).unwrap();
        config.youtube.api_key = Some("   ".into());
        let msg = config.require_credentials().unwrap_err().to_string();
        assert!(msg.contains("youtube.api_key"));
        assert!(!msg.contains("translator.api_key"));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = Config::default();
        config.schedule.translation_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_pool_rejected() {
        let mut config = Config::default();
        config.database.pool_size = 0;
        assert!(validate_config(&config).is_err());
        config.database.pool_size = 2;
        assert!(validate_config(&config).is_ok());
        assert!(config_warnings(&config)
            .iter()
            .any(|w| w.contains("database.pool_size")));
    }

    #[test]
    fn inverted_pause_range_rejected() {
        let mut config = Config::default();
        config.captions.pause_min_secs = 80;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let result = load_config_or_default(Some(Path::new("/nonexistent/tubedigest.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn warnings_include_missing_credentials() {
        let warnings = config_warnings(&Config::default());
        assert!(warnings.iter().any(|w| w.contains("youtube.api_key")));
    }
}
