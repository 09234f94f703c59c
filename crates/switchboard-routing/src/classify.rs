use switchboard_config::{ClassifierConfig, Specialty};

/// Classify a prompt into a specialty category by keyword matching
///
/// Case-insensitive substring search against the configured lists. Code
/// keywords take precedence over writing keywords; everything else is
/// analysis.
pub fn classify(prompt: &str, keywords: &ClassifierConfig) -> Specialty {
    let lower = prompt.to_lowercase();

    if keywords.code.iter().any(|k| lower.contains(k.as_str())) {
        Specialty::Code
    } else if keywords.writing.iter().any(|k| lower.contains(k.as_str())) {
        Specialty::Writing
    } else {
        Specialty::Analysis
    }
}
