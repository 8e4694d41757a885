pub mod config;
pub mod item;
pub mod logging;
pub mod render;
pub mod server;
pub mod store;
