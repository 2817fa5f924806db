pub mod lead_leg;
pub mod side;
pub mod smooth;
pub mod stats;

pub use lead_leg::LeadLegSelector;
pub use side::{SideSelection, SideSelector};
pub use smooth::Ema;
pub use stats::RunningStats;
