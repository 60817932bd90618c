use std::{fs, io, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

/// Defaults, then `wheel.toml`, then `WHEEL_*` env; CLI flags land on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub url: String,
    pub channel: String,
    pub span_deg: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: String::new(),
            channel: "wheel".into(),
            span_deg: 180.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileSettings {
    url: Option<String>,
    channel: Option<String>,
    span: Option<f64>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = read_settings_file(Path::new("wheel.toml"))?;
    apply_env(&mut settings);
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(settings),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    let file_cfg = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    if let Some(v) = file_cfg.url {
        settings.url = v;
    }
    if let Some(v) = file_cfg.channel {
        settings.channel = v;
    }
    if let Some(v) = file_cfg.span {
        settings.span_deg = v;
    }

    Ok(settings)
}

fn apply_env(settings: &mut Settings) {
    if let Ok(v) = std::env::var("WHEEL_URL") {
        settings.url = v;
    }
    if let Ok(v) = std::env::var("WHEEL_CHANNEL") {
        settings.channel = v;
    }
    if let Ok(v) = std::env::var("WHEEL_SPAN") {
        match v.parse::<f64>() {
            Ok(parsed) => settings.span_deg = parsed,
            Err(_) => warn!(value = %v, "ignoring WHEEL_SPAN, expected degrees as a number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("wheel_console_{label}_{suffix}.toml"));
        fs::write(&path, contents).expect("temp settings");
        path
    }

    #[test]
    fn missing_file_yields_the_defaults() {
        let settings =
            read_settings_file(Path::new("definitely-absent-wheel.toml")).expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.channel, "wheel");
        assert_eq!(settings.span_deg, 180.0);
    }

    #[test]
    fn file_overrides_only_the_keys_it_names() {
        let path = temp_file("partial", "url = \"ws://127.0.0.1:9000/ws\"\nspan = 90.0\n");
        let settings = read_settings_file(&path).expect("settings");
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.url, "ws://127.0.0.1:9000/ws");
        assert_eq!(settings.channel, "wheel");
        assert_eq!(settings.span_deg, 90.0);
    }

    #[test]
    fn malformed_file_is_an_error_not_a_silent_fallback() {
        let path = temp_file("malformed", "span = \"wide\"\n");
        let result = read_settings_file(&path);
        fs::remove_file(&path).expect("cleanup");

        assert!(result.is_err());
    }
}
