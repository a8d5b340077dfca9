pub mod missing;
pub mod statistic;
pub mod variable;

// Re-export types for convenience.
pub use crate::types::missing::Missing;
pub use crate::types::statistic::Statistic;
pub use crate::types::variable::NodeVariable;
