//! Post-hoc summary of a batch run.

use std::fmt;

use super::batch::BatchResult;
use super::peaks::PeakSummary;

/// Aggregate indicators derived from a complete batch run.
///
/// Computed from `BatchResult` so the report always matches the exported
/// tables.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub peak_count: usize,
    /// Mean price of the selected peaks (currency per kWh).
    pub mean_peak_price: f64,
    /// Days with a computed energy window.
    pub window_days: usize,
    pub candidate_days: usize,
    pub ranked_days: usize,
    pub events: usize,
    pub converged_events: usize,
    pub degenerate_events: usize,
    /// Largest shiftable energy over all events (kWh).
    pub best_shiftable_energy_kwh: f64,
    /// Mean incentive over converged events (percent of monthly cost).
    pub mean_converged_offer_pct: f64,
}

impl BatchSummary {
    /// Computes the summary from a finished batch.
    ///
    /// # Arguments
    ///
    /// * `result` - Complete batch output
    ///
    /// # Returns
    ///
    /// A `BatchSummary` with all fields populated; empty runs yield zeros.
    pub fn from_result(result: &BatchResult) -> Self {
        let ranking = &result.ranking;
        let peaks = PeakSummary::from_peaks(&ranking.peaks);

        let mut converged = 0_usize;
        let mut degenerate = 0_usize;
        let mut offer_sum = 0.0_f64;
        let mut best = 0.0_f64;
        for r in &result.events {
            if r.event.is_degenerate() {
                degenerate += 1;
            } else if r.event.converged {
                converged += 1;
                offer_sum += r.event.offer_pct;
            }
            best = best.max(r.grid.shiftable_energy_kwh);
        }

        let mean_offer = if converged > 0 {
            offer_sum / converged as f64
        } else {
            0.0
        };

        Self {
            peak_count: peaks.count,
            mean_peak_price: peaks.mean_price_per_kwh,
            window_days: ranking.windows.values().filter(|w| w.is_some()).count(),
            candidate_days: ranking.candidate_days.len(),
            ranked_days: ranking.ranked.len(),
            events: result.events.len(),
            converged_events: converged,
            degenerate_events: degenerate,
            best_shiftable_energy_kwh: best,
            mean_converged_offer_pct: mean_offer,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Flexibility Report ---")?;
        writeln!(f, "Peak periods:          {}", self.peak_count)?;
        writeln!(f, "Mean peak price:       {:.4} per kWh", self.mean_peak_price)?;
        writeln!(f, "Days with window:      {}", self.window_days)?;
        writeln!(f, "Candidate days:        {}", self.candidate_days)?;
        writeln!(f, "Ranked days:           {}", self.ranked_days)?;
        writeln!(f, "Events simulated:      {}", self.events)?;
        writeln!(f, "Converged events:      {}", self.converged_events)?;
        writeln!(f, "Degenerate events:     {}", self.degenerate_events)?;
        writeln!(
            f,
            "Best shiftable energy: {:.3} kWh",
            self.best_shiftable_energy_kwh
        )?;
        write!(
            f,
            "Mean converged offer:  {:.2}%",
            self.mean_converged_offer_pct
        )
    }
}
