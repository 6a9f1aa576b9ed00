use std::time::Duration;

use config::{Config, Environment};
use log::warn;
use serde::Deserialize;

const DEFAULT_SUBMIT_DELAY_MS: u64 = 1_000;
const DEFAULT_OCR_DELAY_MS: u64 = 2_000;
const DEFAULT_ANALYSIS_DELAY_MS: u64 = 3_000;

/// Runtime settings for the app. Every value has a default and can be
/// overridden through `SCHOLARLENS_*` environment variables, e.g.
/// `SCHOLARLENS_ANALYSIS_DELAY_MS=0` to skip the simulated AI delay.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Simulated delay between pressing submit and entering processing.
    pub submit_delay_ms: u64,
    /// Simulated duration of text extraction from a captured image.
    pub ocr_delay_ms: u64,
    /// Simulated duration of the AI analysis stage.
    pub analysis_delay_ms: u64,
    /// Facing preference passed to the webview camera ("environment" or "user").
    pub camera_facing: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            submit_delay_ms: DEFAULT_SUBMIT_DELAY_MS,
            ocr_delay_ms: DEFAULT_OCR_DELAY_MS,
            analysis_delay_ms: DEFAULT_ANALYSIS_DELAY_MS,
            camera_facing: "environment".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let loaded = Config::builder()
            .set_default("submit_delay_ms", DEFAULT_SUBMIT_DELAY_MS as i64)
            .and_then(|b| b.set_default("ocr_delay_ms", DEFAULT_OCR_DELAY_MS as i64))
            .and_then(|b| b.set_default("analysis_delay_ms", DEFAULT_ANALYSIS_DELAY_MS as i64))
            .and_then(|b| b.set_default("camera_facing", "environment"))
            .map(|b| b.add_source(Environment::with_prefix("SCHOLARLENS")))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize::<Settings>());

        match loaded {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, falling back to defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Settings with every simulated delay removed, for tests.
    pub fn immediate() -> Self {
        Self {
            submit_delay_ms: 0,
            ocr_delay_ms: 0,
            analysis_delay_ms: 0,
            camera_facing: "environment".to_string(),
        }
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn ocr_delay(&self) -> Duration {
        Duration::from_millis(self.ocr_delay_ms)
    }

    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.analysis_delay_ms)
    }
}
