// SideTabs services
// Services provide supporting functionality: configuration, shared preferences, link checks.

pub mod clock;
pub mod link_validator;
pub mod preferences;
pub mod settings_engine;
