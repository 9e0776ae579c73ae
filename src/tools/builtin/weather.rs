use async_trait::async_trait;

use crate::error::ToolError;
use crate::tools::ToolHandler;
use crate::weather::WeatherClient;

pub const NAME: &str = "get_weather_info";
pub const DESCRIPTION: &str =
    "Fetches weather information for a given location and provides fireworks scheduling advice.";
pub const PARAMETER: &str = "location";

/// Weather report plus fireworks advice. Falls back to simulated weather,
/// so it always answers.
pub struct WeatherTool {
    client: WeatherClient,
}

impl WeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    async fn call(&self, argument: &str) -> Result<String, ToolError> {
        Ok(self.client.report(argument.trim()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_report_without_key() {
        let tool = WeatherTool::new(WeatherClient::new(None));
        let out = tool.call("Seattle").await.unwrap();
        assert!(out.starts_with("Weather in Seattle: "), "{out}");
        assert!(out.ends_with("[Simulated data]"));
    }

    #[tokio::test]
    async fn blank_location_still_reports() {
        let tool = WeatherTool::new(WeatherClient::new(None));
        let out = tool.call("  ").await.unwrap();
        assert!(out.starts_with("Weather in : "), "{out}");
        assert!(out.ends_with("[Simulated data]"));
    }
}
