use serde::Deserialize;

/// Keyword lists driving prompt classification
///
/// Matching is case-insensitive substring search; the `code` list takes
/// precedence over `writing`, and anything else classifies as analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClassifierConfig {
    /// Keywords marking a prompt as code-related
    pub code: Vec<String>,
    /// Keywords marking a prompt as writing-related
    pub writing: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            code: ["def ", "class ", "import ", "exception", "function", "algorithm"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            writing: ["essay", "blog", "email", "summarize", "article", "letter"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}
