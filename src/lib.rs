pub mod config;
pub mod http_client;
pub mod lichess;
pub mod logging;
pub mod poller;
pub mod queries;
pub mod state;
pub mod view;
