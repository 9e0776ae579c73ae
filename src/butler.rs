use tracing::info;

use crate::config::Settings;
use crate::error::{AgentError, ConfigError};
use crate::inference::{InferenceProvider, OpenAiProvider};
use crate::prompt::SYSTEM_PROMPT;
use crate::tools::builtin::{
    guest, search, weather, GuestBook, GuestInfoTool, WeatherTool, WebSearchTool,
};
use crate::tools::{ToolExecutor, ToolRegistry};
use crate::types::Transcript;
use crate::weather::WeatherClient;
use crate::Agent;

/// Register Alfred's three tools.
pub fn butler_tools(
    book: GuestBook,
    search: WebSearchTool,
    weather: WeatherClient,
) -> Result<ToolRegistry, AgentError> {
    ToolRegistry::new()
        .add(guest::NAME, guest::DESCRIPTION, guest::PARAMETER, GuestInfoTool::new(book))?
        .add(search::NAME, search::DESCRIPTION, search::PARAMETER, search)?
        .add(
            weather::NAME,
            weather::DESCRIPTION,
            weather::PARAMETER,
            WeatherTool::new(weather),
        )
}

/// The assembled gala butler: an [`Agent`] with Alfred's tools and persona.
pub struct Butler {
    agent: Agent,
}

impl Butler {
    /// Wire up the butler against any provider.
    pub fn new(
        provider: impl InferenceProvider + 'static,
        tools: ToolRegistry,
        settings: &Settings,
    ) -> Self {
        let executor = ToolExecutor::new(tools).with_timeout(settings.agent.tool_timeout);
        Self {
            agent: Agent::new(provider, executor, settings.agent.clone()),
        }
    }

    /// Standard wiring: OpenAI-compatible model client, configured guest
    /// list, DuckDuckGo search, OpenWeatherMap with simulated fallback.
    pub async fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        settings.validate()?;

        let book = match &settings.guests_path {
            Some(path) => GuestBook::load(path).await?,
            None => GuestBook::builtin().map_err(|e| ConfigError::Invalid {
                field: "guests",
                reason: e.to_string(),
            })?,
        };
        let tools = butler_tools(
            book,
            WebSearchTool::new(),
            WeatherClient::new(settings.weather_api_key.clone()),
        )?;

        let provider = OpenAiProvider::new(&settings.base_url).with_api_key(&settings.api_key);

        info!(
            model = %settings.agent.model,
            tools = tools.len(),
            "butler ready"
        );
        Ok(Self::new(provider, tools, settings))
    }

    /// A fresh conversation starting with Alfred's system prompt.
    pub fn new_transcript(&self) -> Transcript {
        Transcript::with_system(SYSTEM_PROMPT)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn registers_three_tools() {
        let tools = butler_tools(
            GuestBook::builtin().unwrap(),
            WebSearchTool::new(),
            WeatherClient::new(None),
        )
        .unwrap();
        assert_eq!(
            tools.tool_names(),
            vec!["guest_info_retriever", "web_search", "get_weather_info"]
        );
        assert_eq!(tools.schemas()[2]["input_schema"]["required"][0], "location");
    }

    #[tokio::test]
    async fn from_settings_starts_with_system_prompt() {
        let butler = Butler::from_settings(&Settings::new("gsk_test")).await.unwrap();
        let transcript = butler.new_transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role(), Role::System);
        assert!(butler.agent().tools().contains("web_search"));
    }

    #[tokio::test]
    async fn missing_guest_file_is_config_error() {
        let mut settings = Settings::new("gsk_test");
        settings.guests_path = Some("/nonexistent/guests.json".into());
        let err = Butler::from_settings(&settings).await.err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
