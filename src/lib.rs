pub mod config;
pub mod csv_out;
pub mod error;
pub mod extract;
pub mod history;
pub mod http_client;
pub mod logging;
pub mod normalize;
pub mod odds_api;
pub mod pipeline;
pub mod rows;
pub mod snapshot;
pub mod throttle;
