//! Engine configuration parsed from environment variables.

use crate::consts::{DEFAULT_GRID_SIZE, DEFAULT_HISTORY_CAP, DEFAULT_PASTE_OFFSET, MIN_OBJECT_SIZE};
use crate::error::ErrorCode;
use crate::selection::MarqueePolicy;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown CANVAS_MARQUEE_POLICY '{0}' (expected 'intersect' or 'contain')")]
    UnknownMarqueePolicy(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMarqueePolicy(_) => "E_CONFIG_MARQUEE_POLICY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Retained history snapshots; `None` keeps everything.
    pub history_cap: Option<usize>,
    pub marquee_policy: MarqueePolicy,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    /// Smallest width/height of any object.
    pub min_size: f64,
    /// Offset applied on paste and duplicate, both axes.
    pub paste_offset: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_cap: Some(DEFAULT_HISTORY_CAP),
            marquee_policy: MarqueePolicy::Intersect,
            snap_to_grid: false,
            grid_size: DEFAULT_GRID_SIZE,
            min_size: MIN_OBJECT_SIZE,
            paste_offset: DEFAULT_PASTE_OFFSET,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `CANVAS_HISTORY_CAP`: default 50; `0` or `unbounded` disables the cap
    /// - `CANVAS_MARQUEE_POLICY`: `intersect` (default) or `contain`
    /// - `CANVAS_SNAP_TO_GRID`: default false
    /// - `CANVAS_GRID_SIZE`: default 20
    /// - `CANVAS_MIN_SIZE`: default 10
    /// - `CANVAS_PASTE_OFFSET`: default 20
    ///
    /// # Errors
    ///
    /// Returns `UnknownMarqueePolicy` for an unrecognized policy name.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let marquee_policy = match lookup("CANVAS_MARQUEE_POLICY") {
            Some(raw) => raw.parse::<MarqueePolicy>().map_err(ConfigError::UnknownMarqueePolicy)?,
            None => defaults.marquee_policy,
        };
        let config = Self {
            history_cap: parse_history_cap(lookup("CANVAS_HISTORY_CAP").as_deref()),
            marquee_policy,
            snap_to_grid: parse_bool(lookup("CANVAS_SNAP_TO_GRID").as_deref(), defaults.snap_to_grid),
            grid_size: parse_positive(lookup("CANVAS_GRID_SIZE").as_deref(), defaults.grid_size),
            min_size: parse_positive(lookup("CANVAS_MIN_SIZE").as_deref(), defaults.min_size),
            paste_offset: parse_finite(lookup("CANVAS_PASTE_OFFSET").as_deref(), defaults.paste_offset),
        };
        tracing::debug!(?config, "engine config loaded");
        Ok(config)
    }
}

fn parse_history_cap(raw: Option<&str>) -> Option<usize> {
    let Some(raw) = raw.map(str::trim) else {
        return Some(DEFAULT_HISTORY_CAP);
    };
    if raw.eq_ignore_ascii_case("unbounded") {
        return None;
    }
    match raw.parse::<usize>() {
        Ok(0) => None,
        Ok(cap) => Some(cap),
        Err(_) => Some(DEFAULT_HISTORY_CAP),
    }
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_finite(raw: Option<&str>, default: f64) -> f64 {
    match raw.map(|v| v.trim().parse::<f64>()) {
        Some(Ok(v)) if v.is_finite() => v,
        _ => default,
    }
}

fn parse_positive(raw: Option<&str>, default: f64) -> f64 {
    let v = parse_finite(raw, default);
    if v > 0.0 { v } else { default }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
