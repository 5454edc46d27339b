//! Core types for decisions, inputs, and directives

pub mod decision;
pub mod directive;
pub mod input;

pub use decision::{Decision, Outcome, Verdict};
pub use directive::{VolumeAction, VolumeDirective};
pub use input::{AudioSample, DecisionInput};
