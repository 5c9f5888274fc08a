pub mod analysis;
pub mod config;
pub mod errors;
pub mod github;
pub mod llm_client;
pub mod render;
pub mod resume;
pub mod routes;
pub mod sections;
pub mod state;
