use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub event_buffer_size: usize,
    pub simulation: SimulationSettings,
}

/// Timing and probability knobs for every simulated behaviour.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub price_latency: Duration,
    pub arrival_tick: Duration,
    pub arrival_step: u8,
    pub tracking_tick: Duration,
    pub route_deviation_probability: f64,
    pub surge_probability: f64,
    pub sos_countdown_secs: u32,
    pub suggestion_delay: Duration,
    pub rng_seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            price_latency: Duration::from_millis(1500),
            arrival_tick: Duration::from_millis(1000),
            arrival_step: 2,
            tracking_tick: Duration::from_millis(2000),
            route_deviation_probability: 0.1,
            surge_probability: 0.3,
            sos_countdown_secs: 5,
            suggestion_delay: Duration::from_millis(300),
            rng_seed: None,
        }
    }
}

impl SimulationSettings {
    /// Rejects values the timer loops cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.arrival_step == 0 {
            return Err(AppError::Internal("invalid ARRIVAL_STEP: must be > 0".to_string()));
        }
        if self.arrival_tick.is_zero() {
            return Err(AppError::Internal(
                "invalid ARRIVAL_TICK_MS: must be > 0".to_string(),
            ));
        }
        if self.tracking_tick.is_zero() {
            return Err(AppError::Internal(
                "invalid TRACKING_TICK_MS: must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = SimulationSettings::default();
        let simulation = SimulationSettings {
            price_latency: millis_or_default("PRICE_LATENCY_MS", defaults.price_latency)?,
            arrival_tick: millis_or_default("ARRIVAL_TICK_MS", defaults.arrival_tick)?,
            arrival_step: parse_or_default("ARRIVAL_STEP", defaults.arrival_step)?,
            tracking_tick: millis_or_default("TRACKING_TICK_MS", defaults.tracking_tick)?,
            route_deviation_probability: probability_or_default(
                "ROUTE_DEVIATION_PROBABILITY",
                defaults.route_deviation_probability,
            )?,
            surge_probability: probability_or_default(
                "SURGE_PROBABILITY",
                defaults.surge_probability,
            )?,
            sos_countdown_secs: parse_or_default("SOS_COUNTDOWN_SECS", defaults.sos_countdown_secs)?,
            suggestion_delay: millis_or_default("SUGGESTION_DELAY_MS", defaults.suggestion_delay)?,
            rng_seed: parse_optional("RNG_SEED")?,
        };

        simulation.validate()?;

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            simulation,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(key)?.unwrap_or(default))
}

fn parse_optional<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn millis_or_default(key: &str, default: Duration) -> Result<Duration, AppError> {
    Ok(parse_optional::<u64>(key)?
        .map(Duration::from_millis)
        .unwrap_or(default))
}

fn probability_or_default(key: &str, default: f64) -> Result<f64, AppError> {
    let value = parse_or_default(key, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::Internal(format!(
            "invalid {key}: {value} is not a probability"
        )));
    }
    Ok(value)
}
