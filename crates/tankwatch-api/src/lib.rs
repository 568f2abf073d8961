// tankwatch-api: Async client for the fuel-station level service and order API

pub mod client;
pub mod error;
pub mod feed;
pub mod socketio;
pub mod transport;
pub mod types;

pub use client::{Endpoints, FuelApiClient};
pub use error::Error;
pub use feed::{FeedEvent, LevelFeed, ReconnectConfig};
pub use transport::TransportConfig;
pub use types::{Order, OrderRequest, Percent};
