//! Chronological input series and their time-zone handling.

pub mod localize;
mod types;

pub use types::{
    AlignedSlot, EnergyPoint, EnergySeries, LoadPoint, LoadSeries, PricePoint, PriceSeries, align,
};
