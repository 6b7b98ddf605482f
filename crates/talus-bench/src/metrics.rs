//! Benchmark metrics: data collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Particles alive at the end of the run.
    pub particles: usize,
    /// Number of timesteps executed.
    pub timesteps: u64,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Average wall-clock time per timestep (seconds).
    pub avg_step_time: f64,
    /// Minimum step time.
    pub min_step_time: f64,
    /// Maximum step time.
    pub max_step_time: f64,
    /// Translational plus rotational kinetic energy at the end.
    pub final_kinetic_energy: f64,
    /// Mean number of closed contacts (particle and wall) per step.
    pub mean_contacts: f64,
    /// Largest number of closed contacts in any step.
    pub max_contacts: usize,
    /// Largest overlap seen in any step (meters).
    pub max_overlap: f64,
    /// Particles created by insertion boundaries.
    pub inserted: u64,
    /// Particles removed by deletion boundaries.
    pub removed: u64,
    /// Measured coefficient of restitution (binary collision only).
    pub restitution: Option<f64>,
}

impl BenchmarkMetrics {
    /// CSV header line.
    pub fn to_csv_header() -> String {
        "scenario,particles,timesteps,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,final_ke,mean_contacts,max_contacts,max_overlap,inserted,removed,restitution".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        let restitution = self
            .restitution
            .map_or_else(String::new, |e| format!("{e:.6}"));
        format!(
            "{},{},{},{:.6},{:.4},{:.4},{:.4},{:.6e},{:.2},{},{:.6e},{},{},{}",
            self.scenario,
            self.particles,
            self.timesteps,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.final_kinetic_energy,
            self.mean_contacts,
            self.max_contacts,
            self.max_overlap,
            self.inserted,
            self.removed,
            restitution,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
