//! fooddrive - Edmonton Food Drive dashboard
//!
//! One binary serving the project's five pages and a donation-bag predictor.
//!
//! # Pages
//!
//! | Page | Content |
//! |------|---------|
//! | Dashboard | Logo, abstract, goals and proposed solutions |
//! | EDA | Hosted BI report in a sandboxed iframe |
//! | Maps | Neighbourhood clusters and the pre-rendered cluster map |
//! | ML Modeling | Prediction form backed by the model artifact |
//! | Data Collection | Link to the external collection form |
//!
//! # Quick Start
//!
//! ```no_run
//! use fooddrive::{predict, Config, PredictionRequest};
//!
//! let config = Config::load().unwrap();
//! let request = PredictionRequest {
//!     neighbourhood: "WOODBEND".to_string(),
//!     stake: "X".to_string(),
//!     route: "R1".to_string(),
//!     routes_completed: 5,
//!     time_spent: 60,
//!     doors_in_route: 100,
//! };
//! let outcome = predict::run(&config.assets.model, Ok(request));
//! println!("{}", outcome.message());
//! ```

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod model;
pub mod predict;
pub mod render;
pub mod serve;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use context::AppContext;
pub use dataset::{Dataset, DonationRecord, SelectOptions};
pub use error::{Error, Result};
pub use model::{FieldValue, InputFrame, Pipeline};
pub use predict::{PredictionForm, PredictionOutcome, PredictionRequest, FEATURE_COLUMNS};
pub use render::{render_page, FormState, Page};
