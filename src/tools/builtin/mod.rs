//! Alfred's tools: guest lookup, web search, weather.

pub mod guest;
pub mod search;
pub mod weather;

pub use guest::{Guest, GuestBook, GuestInfoTool};
pub use search::{SearchResult, WebSearchTool};
pub use weather::WeatherTool;
