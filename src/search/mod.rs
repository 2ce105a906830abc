pub mod advisor;
pub mod cache;
pub mod heuristic;

pub use advisor::{Advisor, Analysis, MoveHint, PlayStyle, RiskLevel};
pub use heuristic::{HeuristicWeights, evaluate};
