//! Daily series preparation
//!
//! Turns expense records into the regular, denoised series the forecast
//! model is fit on:
//!
//! - `aggregate` - dense daily grid of totals
//! - `outlier` - quantile capping of spikes
//! - `transform` - variance-stabilizing log transform

pub mod aggregate;
pub mod outlier;
pub mod transform;

pub use aggregate::aggregate_daily;
pub use outlier::{cap_outliers, quantile};
pub use transform::LogTransform;
