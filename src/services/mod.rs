pub mod cache;
pub mod classifier;
pub mod enrichment;
pub mod filter;
pub mod upstream;
