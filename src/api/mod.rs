pub mod hub_client;
pub mod server_api;
pub mod types;

pub use hub_client::{HubClient, HubClientConfig};
pub use server_api::{ApiError, ServerApi};
pub use types::{FrameworkInfo, ServerRecord, UserOptions};
