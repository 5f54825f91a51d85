pub mod analyzer;
pub mod candidates;
pub mod composer;
pub mod pipeline;

pub use analyzer::{apply_consistency_rule, StockAnalyzer};
pub use candidates::{select_candidates, CandidateQuery};
pub use composer::{composite_score, Composer, SOURCE_TAG};
pub use pipeline::DailyPipeline;

#[cfg(test)]
mod analyzer_tests;
