/// Configuration for batch matching
#[derive(Clone, Debug)]
pub struct MatcherConfig {
    /// Minimum cosine similarity for a candidate to count as a match
    pub similarity_threshold: f32,
    /// Maximum number of matches presented per reference in a report
    pub top_matches: usize,
    /// Allowed file extensions when scanning image folders
    pub allowed_extensions: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.60,
            top_matches: 10,
            allowed_extensions: default_extensions(),
        }
    }
}

/// Raster formats accepted by the folder scanners.
pub(crate) fn default_extensions() -> Vec<String> {
    vec!["jpg", "jpeg", "png"]
        .into_iter()
        .map(String::from)
        .collect()
}
