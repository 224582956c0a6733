//! L1-robust optimization: the worst-case inner LP, the Bellman backup kernels shared by every
//! solver, and the nominal-to-robust transform.
pub mod backup;
pub mod l1;
pub mod robustify;

pub use backup::{backup_state, evaluate_fixed, Backup, StateBackup};
pub use robustify::robustify;
