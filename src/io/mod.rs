/// CSV-backed price, load and survey providers.
pub mod csv_source;
/// CSV export for ranked days and event tables.
pub mod export;
pub mod provider;
