pub mod config;
pub mod handlers;
pub mod models;
pub mod server;
pub mod state;
pub mod store;
pub mod uploader;
pub mod utils;
