//! Demand-response flexibility simulation.
//!
//! Ranks the days of a year by how well appliance load lines up with price
//! peaks, then solves the compensation offer at which survey-derived
//! participation balances the market value of shifted energy.

pub mod config;
pub mod error;
/// Input providers and CSV export.
pub mod io;
pub mod series;
/// Peak selection, windows, ranking, equilibrium and batch runs.
pub mod sim;
pub mod survey;
pub mod synthetic;
