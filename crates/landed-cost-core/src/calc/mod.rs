pub mod charges;
pub mod engine;
pub mod heuristics;
pub mod input;
pub mod output;

#[cfg(feature = "reverse")]
pub mod reverse;

#[cfg(feature = "scenarios")]
pub mod presets;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use engine::{calculate_landed_cost, CalcContext};
pub use input::{base_input, CalcInput};
pub use output::{AuditTrail, AuditValue, BreakdownLine, CalcOutput, LineId};
