//! Job discovery: provider fan-out, normalization, classification, filtering,
//! sorting, description enrichment and per-session board state.

pub mod board;
pub mod classifier;
pub mod enrichment;
pub mod filters;
pub mod gateway;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod saved;
pub mod sessions;
pub mod sorting;
