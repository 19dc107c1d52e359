//! Demo metrics: data collected during a scenario run.

use serde::{Deserialize, Serialize};

/// Metrics collected from one scenario run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoMetrics {
    pub scenario: String,
    pub instances: usize,
    pub solvers: usize,
    /// Particles across every instance.
    pub particles: usize,
    /// Triangles of one instance.
    pub triangles: usize,
    /// Pinned particles across every instance.
    pub pinned: usize,
    pub frames: u32,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    pub avg_step_ms: f64,
    pub min_step_ms: f64,
    pub max_step_ms: f64,
    /// Solver iterations per frame, summed over cloths.
    pub avg_iterations: f32,
    pub sphere_contacts: u64,
    pub self_collision_contacts: u64,
    /// Largest distance any particle moved from its start.
    pub max_displacement: f32,
    /// Largest distance any pinned particle moved (expected 0).
    pub pinned_drift: f32,
    /// Kinetic energy of the free particles after the last frame.
    pub final_kinetic_energy: f64,
    /// Tethers longer than their limit after the last frame.
    pub stretched_tethers: usize,
}

impl DemoMetrics {
    pub fn to_csv_header() -> String {
        "scenario,instances,solvers,particles,triangles,pinned,frames,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,avg_iterations,sphere_contacts,self_collision_contacts,max_displacement,pinned_drift,final_ke,stretched_tethers".to_string()
    }

    /// This run as one CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.1},{},{},{:.6},{:.6},{:.6e},{}",
            self.scenario,
            self.instances,
            self.solvers,
            self.particles,
            self.triangles,
            self.pinned,
            self.frames,
            self.total_wall_time,
            self.avg_step_ms,
            self.min_step_ms,
            self.max_step_ms,
            self.avg_iterations,
            self.sphere_contacts,
            self.self_collision_contacts,
            self.max_displacement,
            self.pinned_drift,
            self.final_kinetic_energy,
            self.stretched_tethers,
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[DemoMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
