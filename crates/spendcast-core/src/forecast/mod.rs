//! Forecast Engine - trend + seasonality model
//!
//! Fits an additive model to a log-space daily series and predicts every
//! observed day plus a configurable horizon, each with an uncertainty
//! interval.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spendcast_core::forecast::ForecastEngine;
//!
//! let engine = ForecastEngine::new(config.model.clone());
//! let output = engine.fit_and_forecast(&transformed, 7)?;
//! ```

pub mod engine;
pub mod features;
mod linalg;
pub mod uncertainty;

pub use engine::{EngineOutput, FittedModel, ForecastEngine};
pub use features::Seasonality;
