//! Entropy of trading behaviour and its relation to market volatility.
//!
//! Core: [`entropy`], [`generator`], [`volatility`], [`correlation`].
//! Boundary: [`scenario`], [`report`], [`ledger`].

pub mod config;
pub mod correlation;
pub mod entropy;
pub mod generator;
pub mod ledger;
pub mod logging;
pub mod report;
pub mod scenario;
pub mod volatility;
