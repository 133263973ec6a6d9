//! Incident Co-Pilot client
//!
//! Client side of the incident co-pilot dashboard: typed REST access to
//! incidents and analytics, plus a self-healing push channel that tells the
//! dashboard when to refresh.
//!
//! # Features
//!
//! - **Resilient push channel**: fixed-interval reconnection, ordered fan-out
//! - **Typed REST accessor**: incidents, action history, analytics
//! - **Live dashboard**: debounced refresh on incident notifications
//! - **Client-side views**: all / active / resolved / by severity
//!
//! # Modules
//!
//! - `channel`: `UpdateChannel` and its WebSocket transport
//! - `api`: REST client (`ApiClient`)
//! - `dashboard`: `DashboardFeed`, refresh batching, incident views
//! - `types`: Incident and analytics data structures
//! - `config`: Endpoint configuration from the environment
//! - `utils`: Timestamp helpers
//!
//! # Example
//!
//! ```no_run
//! use incident_copilot::{ApiClient, Config, DashboardFeed, FeedOptions, UpdateChannel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let api = ApiClient::from_config(&config)?;
//!
//!     let channel = UpdateChannel::new();
//!     let feed = DashboardFeed::start(api, &channel, FeedOptions::default());
//!     channel.connect(config.channel_url.clone());
//!
//!     let mut updates = feed.watch();
//!     while updates.changed().await.is_ok() {
//!         let snapshot = updates.borrow().clone();
//!         println!("{} incidents loaded", snapshot.incidents.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod dashboard;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::{ApiClient, ApiError, IncidentQuery};
pub use channel::{ChannelState, Subscription, UpdateChannel, UpdateMessage, WeakUpdateChannel};
pub use config::{Config, ConfigError};
pub use dashboard::{DashboardFeed, DashboardSnapshot, FeedOptions, IncidentView};
pub use types::{ActionOutcome, DashboardStats, Incident, IncidentAction, IncidentStatus, Mttr, Severity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
