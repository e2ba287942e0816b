//! Self-contained numeric and geometry routines, each invoked by exactly
//! one step.

pub mod dvh;
pub mod geometry;
pub mod logistic;
pub mod stats;
pub mod survival;
pub mod suv;
