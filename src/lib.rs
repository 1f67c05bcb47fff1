pub mod config;
pub mod handlers;
pub mod models;
pub mod query;
pub mod ranking;
pub mod refresh;
pub mod storage;
pub mod templates;
pub mod utils;
