/// Batch runner over ranked days, offsets and durations.
pub mod batch;
pub mod equilibrium;
/// Demand-response event definitions.
pub mod event;
/// Grid-level aggregation of solved events.
pub mod grid;
pub mod kpi;
pub mod participation;
pub mod peaks;
pub mod ranking;
/// Shortest energy-coverage windows per day.
pub mod window;
