//! Core functionality of the similarity-matching engine

/// Folder-level batch matching and report assembly.
pub mod batch;
/// One-reference-vs-many-candidates comparison.
pub mod compare;
/// Embedding vectors and the provider boundary.
pub mod embeddings;
/// Flat nearest-neighbor index and reverse image search.
pub mod search;
/// Cosine similarity and confidence scoring.
pub mod similarity;
