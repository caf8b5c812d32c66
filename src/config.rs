use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::{DEFAULT_CONFIDENCE_FLOOR, DEFAULT_IOU_THRESHOLD};
use crate::mode::DEFAULT_TEXT_WINDOW;
use crate::values::{ClassValueTable, EGP_DENOMINATIONS};

const DEFAULT_WINDOW_SECS: f32 = 3.0;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_TAP_WINDOW_MS: u64 = 2000;
const DEFAULT_CLOTHES_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SCENE_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Deserialize, Default)]
struct YourEyesConfigFile {
    money: Option<MoneyConfigFile>,
    tts: Option<TtsConfigFile>,
    menu: Option<MenuConfigFile>,
    remote: Option<RemoteConfigFile>,
    text: Option<TextConfigFile>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct MoneyConfigFile {
    window_secs: Option<f32>,
    iou_threshold: Option<f32>,
    confidence_floor: Option<f32>,
    class_values: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize, Default)]
struct TtsConfigFile {
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MenuConfigFile {
    tap_window_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RemoteConfigFile {
    clothes_timeout_secs: Option<u64>,
    scene_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TextConfigFile {
    window_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct YourEyesConfig {
    pub money: MoneySettings,
    pub tts_url: Option<String>,
    /// Timeout for in-flight local detector calls.
    pub request_timeout: Duration,
    pub clothes_timeout: Duration,
    pub scene_timeout: Duration,
    pub text_window: Duration,
    pub tap_window: Duration,
}

#[derive(Debug, Clone)]
pub struct MoneySettings {
    pub window: Duration,
    pub iou_threshold: f32,
    pub confidence_floor: f32,
    pub class_values: Vec<u32>,
}

impl MoneySettings {
    pub fn class_table(&self) -> Result<ClassValueTable> {
        ClassValueTable::new(self.class_values.clone())
    }
}

impl Default for YourEyesConfig {
    fn default() -> Self {
        Self::from_file(YourEyesConfigFile::default())
    }
}

impl YourEyesConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("YOUREYES_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: YourEyesConfigFile) -> Self {
        let money = file.money.unwrap_or_default();
        let window_secs = money.window_secs.unwrap_or(DEFAULT_WINDOW_SECS);
        let remote = file.remote.unwrap_or_default();
        Self {
            money: MoneySettings {
                // Negative and non-finite values are rejected by validate().
                window: Duration::try_from_secs_f32(window_secs).unwrap_or(Duration::ZERO),
                iou_threshold: money.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
                confidence_floor: money.confidence_floor.unwrap_or(DEFAULT_CONFIDENCE_FLOOR),
                class_values: money
                    .class_values
                    .unwrap_or_else(|| EGP_DENOMINATIONS.to_vec()),
            },
            tts_url: file.tts.and_then(|tts| tts.url),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            clothes_timeout: Duration::from_secs(
                remote
                    .clothes_timeout_secs
                    .unwrap_or(DEFAULT_CLOTHES_TIMEOUT_SECS),
            ),
            scene_timeout: Duration::from_secs(
                remote
                    .scene_timeout_secs
                    .unwrap_or(DEFAULT_SCENE_TIMEOUT_SECS),
            ),
            text_window: file
                .text
                .and_then(|text| text.window_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TEXT_WINDOW),
            tap_window: Duration::from_millis(
                file.menu
                    .and_then(|menu| menu.tap_window_ms)
                    .unwrap_or(DEFAULT_TAP_WINDOW_MS),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(window) = std::env::var("YOUREYES_WINDOW_SECS") {
            let seconds: f32 = window
                .trim()
                .parse()
                .map_err(|_| anyhow!("YOUREYES_WINDOW_SECS must be a number of seconds"))?;
            self.money.window = Duration::try_from_secs_f32(seconds)
                .map_err(|_| anyhow!("YOUREYES_WINDOW_SECS must be a positive number"))?;
        }
        if let Ok(threshold) = std::env::var("YOUREYES_IOU_THRESHOLD") {
            self.money.iou_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("YOUREYES_IOU_THRESHOLD must be a number"))?;
        }
        if let Ok(floor) = std::env::var("YOUREYES_CONFIDENCE_FLOOR") {
            self.money.confidence_floor = floor
                .trim()
                .parse()
                .map_err(|_| anyhow!("YOUREYES_CONFIDENCE_FLOOR must be a number"))?;
        }
        if let Ok(values) = std::env::var("YOUREYES_CLASS_VALUES") {
            let parsed = split_csv(&values)
                .iter()
                .map(|entry| entry.parse::<u32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| {
                    anyhow!("YOUREYES_CLASS_VALUES must be a comma-separated list of integers")
                })?;
            if !parsed.is_empty() {
                self.money.class_values = parsed;
            }
        }
        if let Ok(url) = std::env::var("YOUREYES_TTS_URL") {
            if !url.trim().is_empty() {
                self.tts_url = Some(url.trim().to_string());
            }
        }
        if let Ok(timeout) = std::env::var("YOUREYES_REQUEST_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("YOUREYES_REQUEST_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.request_timeout = Duration::from_secs(seconds);
        }
        if let Ok(timeout) = std::env::var("YOUREYES_CLOTHES_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("YOUREYES_CLOTHES_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.clothes_timeout = Duration::from_secs(seconds);
        }
        if let Ok(timeout) = std::env::var("YOUREYES_SCENE_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("YOUREYES_SCENE_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.scene_timeout = Duration::from_secs(seconds);
        }
        if let Ok(window) = std::env::var("YOUREYES_TEXT_WINDOW_SECS") {
            let seconds: u64 = window.trim().parse().map_err(|_| {
                anyhow!("YOUREYES_TEXT_WINDOW_SECS must be an integer number of seconds")
            })?;
            self.text_window = Duration::from_secs(seconds);
        }
        if let Ok(tap) = std::env::var("YOUREYES_TAP_WINDOW_MS") {
            let millis: u64 = tap.trim().parse().map_err(|_| {
                anyhow!("YOUREYES_TAP_WINDOW_MS must be an integer number of milliseconds")
            })?;
            self.tap_window = Duration::from_millis(millis);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.money.window.is_zero() {
            return Err(anyhow!("money window must be greater than zero"));
        }
        if !(self.money.iou_threshold > 0.0 && self.money.iou_threshold <= 1.0) {
            return Err(anyhow!("iou threshold must be in (0, 1]"));
        }
        if !(self.money.confidence_floor > 0.0 && self.money.confidence_floor <= 1.0) {
            return Err(anyhow!("confidence floor must be in (0, 1]"));
        }
        self.money.class_table()?;
        if self.request_timeout.is_zero()
            || self.clothes_timeout.is_zero()
            || self.scene_timeout.is_zero()
        {
            return Err(anyhow!("request timeouts must be greater than zero"));
        }
        if self.text_window.is_zero() {
            return Err(anyhow!("text window must be greater than zero"));
        }
        if self.tap_window.is_zero() {
            return Err(anyhow!("tap window must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<YourEyesConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_money_mode() {
        let cfg = YourEyesConfig::default();
        assert_eq!(cfg.money.window, Duration::from_secs(3));
        assert_eq!(cfg.money.iou_threshold, 0.3);
        assert_eq!(cfg.money.class_values, vec![5, 10, 20, 50, 100, 200]);
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert_eq!(cfg.clothes_timeout, Duration::from_secs(10));
        assert_eq!(cfg.scene_timeout, Duration::from_secs(20));
        assert_eq!(cfg.text_window, Duration::from_secs(5));
        assert_eq!(cfg.tap_window, Duration::from_secs(2));
        assert!(cfg.tts_url.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        let mut cfg = YourEyesConfig::default();
        cfg.money.iou_threshold = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = YourEyesConfig::default();
        cfg.money.class_values = vec![5, 0];
        assert!(cfg.validate().is_err());

        let mut cfg = YourEyesConfig::default();
        cfg.money.window = Duration::ZERO;
        assert!(cfg.validate().is_err());

        let mut cfg = YourEyesConfig::default();
        cfg.clothes_timeout = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn split_csv_skips_blanks() {
        assert_eq!(split_csv(" 5, ,10,"), vec!["5", "10"]);
    }
}
