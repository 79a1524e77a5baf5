pub mod run;
pub mod settings;

pub use run::RunConfig;
pub use settings::{
    default_settings_path, EngineLayout, ModelSettings, Settings, WeatherSettings,
};
