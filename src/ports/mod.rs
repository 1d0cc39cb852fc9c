//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the scoring core and the trained model it consumes.

mod predictor;

pub use predictor::{check_input, ChurnPredictor, ModelLoadError, PredictorError};
