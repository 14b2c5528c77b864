pub mod api_client;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod http_client;
pub mod model;
pub mod observe;
pub mod paginate;
pub mod pivot;
pub mod provider;
pub mod proxy;
pub mod query;
pub mod state;
pub mod team_pivot;
pub mod views;
