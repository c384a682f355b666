// SPDX-License-Identifier: MPL-2.0
pub mod progress_ring;
pub mod trajectory_plot;

pub use progress_ring::ProgressRing;
pub use trajectory_plot::TrajectoryPlot;
