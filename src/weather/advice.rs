use std::fmt;

/// Fireworks go/no-go recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advice {
    Perfect,
    GoodWithClouds,
    StrongWinds { wind_kmh: f64 },
    Precipitation,
    PoorVisibility,
    Marginal,
}

/// Map a sky condition and wind speed to a fireworks recommendation.
///
/// Rules are checked in order and the first match wins, so strong wind
/// overrides precipitation and visibility once the two calm-sky rules fail.
/// Condition matching is exact: `"Clouds"` qualifies, `"Cloudy"` does not.
pub fn advise(condition: &str, wind_kmh: f64) -> Advice {
    match condition {
        "Clear" | "Sunny" if wind_kmh < 15.0 => Advice::Perfect,
        "Clouds" if wind_kmh < 20.0 => Advice::GoodWithClouds,
        _ if wind_kmh >= 20.0 => Advice::StrongWinds { wind_kmh },
        "Rain" | "Drizzle" | "Thunderstorm" => Advice::Precipitation,
        "Snow" | "Mist" | "Fog" => Advice::PoorVisibility,
        _ => Advice::Marginal,
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Perfect => write!(f, "Perfect conditions for fireworks."),
            Advice::GoodWithClouds => {
                write!(f, "Good conditions for fireworks with some clouds.")
            }
            Advice::StrongWinds { wind_kmh } => write!(
                f,
                "Caution advised for fireworks due to strong winds ({wind_kmh} km/h)."
            ),
            Advice::Precipitation => {
                write!(f, "Fireworks should be postponed due to precipitation.")
            }
            Advice::PoorVisibility => write!(f, "Poor visibility conditions for fireworks."),
            Advice::Marginal => write!(f, "Weather conditions are marginal for fireworks."),
        }
    }
}
