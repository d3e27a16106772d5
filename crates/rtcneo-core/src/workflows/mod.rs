//! # Workflows Module
//!
//! High-level entry points built on top of the [`engine`](crate::engine) layer.
//!
//! ## Overview
//!
//! A workflow takes completed or pending simulations and turns them into answers: did the
//! proton transfer, how much smoother is the constrained trajectory, how well is energy
//! conserved. Nothing in this layer mutates a
//! [`SimulationResults`](crate::core::models::results::SimulationResults); analysis is a pure
//! read of finished trajectories.
//!
//! ## Architecture
//!
//! - **Analysis** ([`analysis`]) - Per-trajectory summaries ([`analysis::TrajectoryAnalyzer`])
//!   and pairwise RT-NEO/RT-cNEO metrics ([`analysis::ComparisonMetrics`]).
//! - **Comparison** ([`comparison`]) - The [`comparison::ComparisonStudy`] that runs both
//!   methods from one configuration and writes the report directory.

pub mod analysis;
pub mod comparison;
