//! Indicator generators triggered from the UI.

pub mod controller;
pub mod generator;

pub use controller::{ActionRequest, ActionResponse, IndicatorGeneratorController};
pub use generator::{IndicatorGenerator, IndicatorGeneratorService, IndicatorQuery, IndicatorRegistry};
