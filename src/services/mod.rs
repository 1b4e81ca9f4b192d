// Suma services
// Services provide stateless or self-contained functionality: URL normalization, settings, themes, the assistant.

pub mod assistant;
pub mod settings_engine;
pub mod theme_engine;
pub mod url_normalizer;
