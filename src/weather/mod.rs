//! Weather observations and fireworks advice.
//!
//! [`WeatherClient`] tries OpenWeatherMap first and quietly falls back to
//! simulated weather; callers always get a report.

pub mod advice;
pub mod synthetic;

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

pub use advice::{advise, Advice};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const LIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Live,
    Simulated,
}

/// A single weather reading. Built per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    /// Primary condition keyword, e.g. `Clear`, `Clouds`, `Rain`.
    pub condition: String,
    pub description: String,
    pub temperature_c: i32,
    pub humidity: u8,
    pub wind_kmh: f64,
    pub source: Source,
}

impl Observation {
    pub fn advice(&self) -> Advice {
        advise(&self.condition, self.wind_kmh)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weather in {}: {}, {}°C, Humidity: {}%, Wind: {} km/h. {}",
            self.location,
            self.description,
            self.temperature_c,
            self.humidity,
            self.wind_kmh,
            self.advice()
        )?;
        if self.source == Source::Simulated {
            write!(f, " [Simulated data]")?;
        }
        Ok(())
    }
}

/// Why a live lookup didn't produce an observation. Never leaves this module
/// except through [`WeatherClient::fetch_live`].
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("no weather API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(String),
    #[error("weather service returned {0}")]
    Status(u16),
    #[error("malformed weather payload: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
struct CurrentWeather {
    main: MainReading,
    weather: Vec<ConditionReading>,
    #[serde(default)]
    wind: Option<WindReading>,
}

#[derive(Deserialize)]
struct MainReading {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct ConditionReading {
    main: String,
    description: String,
}

#[derive(Deserialize)]
struct WindReading {
    #[serde(default)]
    speed: f64,
}

/// OpenWeatherMap client with a simulated fallback.
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl WeatherClient {
    /// Without an API key every report is simulated.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENWEATHER_BASE_URL.into(),
            api_key,
            timeout: LIVE_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current conditions from the live service.
    pub async fn fetch_live(&self, location: &str) -> Result<Observation, WeatherError> {
        let key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let resp = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", location), ("appid", key), ("units", "metric")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(WeatherError::Status(status));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        let payload: CurrentWeather =
            serde_json::from_str(&text).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let primary = payload
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse("empty weather list".into()))?;
        let speed_ms = payload.wind.map(|w| w.speed).unwrap_or(0.0);

        Ok(Observation {
            location: location.to_string(),
            condition: primary.main,
            description: title_case(&primary.description),
            temperature_c: whole_degrees(payload.main.temp),
            humidity: payload.main.humidity.round_ties_even().clamp(0.0, 100.0) as u8,
            wind_kmh: ms_to_kmh(speed_ms),
            source: Source::Live,
        })
    }

    /// Live observation if the service answers, simulated otherwise.
    pub async fn fetch_or_synthesize(&self, location: &str) -> Observation {
        match self.fetch_live(location).await {
            Ok(obs) => obs,
            Err(e) => {
                debug!(%location, error = %e, "live weather unavailable, simulating");
                simulate(location)
            }
        }
    }

    /// Formatted observation line followed by fireworks advice.
    pub async fn report(&self, location: &str) -> String {
        self.fetch_or_synthesize(location).await.to_string()
    }
}

fn simulate(location: &str) -> Observation {
    synthetic::synthesize(location, &mut rand::thread_rng())
}

/// m/s to km/h, one decimal place.
fn ms_to_kmh(speed: f64) -> f64 {
    (speed * 3.6 * 10.0).round() / 10.0
}

/// Whole degrees, halves to even.
fn whole_degrees(temp: f64) -> i32 {
    temp.round_ties_even() as i32
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(source: Source) -> Observation {
        Observation {
            location: "London".into(),
            condition: "Clouds".into(),
            description: "Broken Clouds".into(),
            temperature_c: 14,
            humidity: 71,
            wind_kmh: 12.6,
            source,
        }
    }

    #[test]
    fn live_report_format() {
        assert_eq!(
            observation(Source::Live).to_string(),
            "Weather in London: Broken Clouds, 14°C, Humidity: 71%, Wind: 12.6 km/h. \
             Good conditions for fireworks with some clouds."
        );
    }

    #[test]
    fn simulated_report_is_tagged() {
        let text = observation(Source::Simulated).to_string();
        assert!(text.ends_with(" [Simulated data]"), "{text}");
    }

    #[test]
    fn wind_conversion() {
        assert_eq!(ms_to_kmh(5.0), 18.0);
        assert_eq!(ms_to_kmh(3.5), 12.6);
        assert_eq!(ms_to_kmh(0.0), 0.0);
        assert_eq!(ms_to_kmh(6.17), 22.2);
    }

    #[test]
    fn temperature_halves_round_to_even() {
        assert_eq!(whole_degrees(14.5), 14);
        assert_eq!(whole_degrees(15.5), 16);
        assert_eq!(whole_degrees(14.6), 15);
        assert_eq!(whole_degrees(-0.5), 0);
    }

    #[test]
    fn title_cases_descriptions() {
        assert_eq!(title_case("scattered clouds"), "Scattered Clouds");
        assert_eq!(title_case("LIGHT rain"), "Light Rain");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn no_key_falls_back_to_simulation() {
        let client = WeatherClient::new(None);
        assert!(matches!(
            client.fetch_live("Paris").await,
            Err(WeatherError::MissingApiKey)
        ));

        let obs = client.fetch_or_synthesize("Paris").await;
        assert_eq!(obs.source, Source::Simulated);
        assert!(client.report("Paris").await.ends_with("[Simulated data]"));
    }
}
