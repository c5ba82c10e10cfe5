pub mod client;
pub mod verdict;

pub use client::{AnalysisClient, HealthReport};
pub use verdict::{Classification, Verdict};
