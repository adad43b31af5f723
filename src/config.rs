use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};

/// Run configuration handed to the pipeline. Nothing below `main` reads
/// flags or globals; everything comes through this struct.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub workers: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub reporting_interval: Duration,
    pub output: PathBuf,
    pub task_queue_capacity: usize,
    pub stats_queue_capacity: usize,
    pub read_buffer_size: usize,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.task_queue_capacity == 0 || self.stats_queue_capacity == 0 {
            bail!("queue capacities must be at least 1");
        }
        if self.read_buffer_size == 0 {
            bail!("read_buffer_size must be at least 1 byte");
        }
        Ok(())
    }
}

const DEFAULT_CONFIG: &[u8] = include_bytes!("../config/default.yml");

/// Load the built-in defaults, overlaid with the YAML file at `path` if given.
/// Keys missing from the override file keep their default value.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut merged: serde_yaml::Value =
        serde_yaml::from_slice(DEFAULT_CONFIG).context("parsing built-in config")?;

    if let Some(p) = path {
        let bytes =
            std::fs::read(p).with_context(|| format!("reading config {}", p.display()))?;
        let overlay: serde_yaml::Value = serde_yaml::from_slice(&bytes)
            .with_context(|| format!("parsing config {}", p.display()))?;
        overlay_values(&mut merged, overlay);
    }

    let config: Config = serde_yaml::from_value(merged).context("invalid config")?;
    config.validate()?;
    Ok(config)
}

fn overlay_values(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
        }
        // An empty override file parses as null.
        (_, serde_yaml::Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

/// Parse a duration such as `10s`, `250ms`, `1m30s` or `1.5h`.
///
/// Accepted units: `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`. A bare `0` is also
/// accepted.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = text;
    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(format!("invalid duration {input:?}"));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid number in duration {input:?}"))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {input:?}")),
            other => return Err(format!("unknown unit {other:?} in duration {input:?}")),
        };
        rest = &rest[unit_len..];
        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("duration {input:?} is out of range"));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
