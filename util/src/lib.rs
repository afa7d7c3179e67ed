pub mod execution_config;
pub mod languages;
