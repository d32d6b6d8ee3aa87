//! Domain services: pure logic and orchestration above the ports, with no
//! knowledge of which adapter backs them.

pub mod backoff;
pub mod budget_ledger_service;
pub mod cell_tree_service;
pub mod checks;
pub mod controller;
pub mod reconcilers;
pub mod recursion_validator;
pub mod spawn_queue_service;
pub mod topology;
pub mod work_queue;

pub use budget_ledger_service::BudgetLedgerService;
pub use cell_tree_service::CellTreeService;
pub use checks::CheckRunner;
pub use reconcilers::{CellReconciler, FormationReconciler, MissionReconciler};
pub use spawn_queue_service::SpawnQueueService;
pub use work_queue::WorkQueue;
