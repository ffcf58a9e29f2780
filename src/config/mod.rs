pub mod settings;

pub use settings::{GatewayConfig, ModelConfig, ServerConfig, Settings};
