//! Reconcilers (C3–C5): the level-triggered convergence loops for Cells,
//! Formations, and Missions.

pub mod cell_reconciler;
pub mod formation_reconciler;
pub mod mission_reconciler;

pub use cell_reconciler::CellReconciler;
pub use formation_reconciler::FormationReconciler;
pub use mission_reconciler::MissionReconciler;
