#![doc(html_root_url = "https://docs.rs/dropcheck/0.1.0")]
#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

//! # Dropcheck
//!
//! A Rust library for detecting reused ("dropshipped") product images by
//! comparing them against a corpus gathered from reverse-image search,
//! using deep-learning embeddings.
//!
//! ## Features
//!
//! - **Embedding Provider**: pluggable boundary to a pretrained image
//!   encoder, with a torch-backed implementation behind the `embeddings`
//!   feature
//! - **Similarity Scoring**: cosine similarity, confidence percentages, and
//!   qualitative verdict labels
//! - **Pairwise Comparison**: one reference image against a candidate set,
//!   with per-candidate skip handling and aggregate statistics
//! - **Nearest-Neighbor Search**: flat Euclidean index with top-K retrieval
//!   over a corpus folder
//! - **Batch Matching**: folder-vs-folder comparison producing a structured,
//!   serializable report
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! dropcheck = "0.1"
//! ```
//!
//! Basic usage:
//! ```rust,no_run
//! use dropcheck::{BatchMatcher, TorchEmbedder};
//! use std::path::Path;
//!
//! fn main() -> dropcheck::Result<()> {
//!     dropcheck::init()?;
//!     let encoder = TorchEmbedder::new("weights/resnet18.ot")?;
//!     let matcher = BatchMatcher::new(encoder);
//!     let report = matcher.run(Path::new("data/original"), Path::new("data/downloaded"));
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```

// Internal modules
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
pub mod models;
mod state;
mod utils;

// Public API exports
pub use crate::{
    core::batch::BatchMatcher,
    core::compare::compare_against,
    core::embeddings::{EmbedOutcome, Embedding, EmbeddingProvider, SkipReason},
    core::search::{reverse_search, FlatIndex},
    core::similarity::{confidence_label, confidence_score, cosine_similarity},
    error::{AppError, Result},
    models::report::{
        BatchReport, BatchSummary, ComparisonResult, ConfidenceLabel, MatchRecord,
        ReferenceMatches, SearchHit, SkippedCandidate,
    },
    state::MatcherConfig,
};

#[cfg(feature = "embeddings")]
pub use crate::core::embeddings::TorchEmbedder;

/// Initialize the application with default settings
///
/// This function sets up logging. It should be called early in the
/// application startup process, before the embedding provider is
/// constructed.
///
/// # Errors
///
/// Returns an error if logging initialization fails.
///
/// # Example
///
/// ```no_run
/// fn main() -> dropcheck::Result<()> {
///     dropcheck::init()?;
///     // Application code here
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    let env = env_logger::Env::default()
        .default_filter_or("info")
        .default_write_style_or("auto");

    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_module_path(false)
        .format_target(false)
        .init();

    log::info!("Initializing dropcheck");
    Ok(())
}
