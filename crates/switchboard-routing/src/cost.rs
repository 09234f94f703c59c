use switchboard_config::ProviderSpec;
use tiktoken_rs::o200k_base;

/// Estimate the token count of a prompt
///
/// Uses tiktoken, falling back to the four-characters-per-token
/// approximation when the encoder cannot be built.
pub fn estimate_tokens(text: &str) -> usize {
    o200k_base().map_or_else(
        |_| text.len().div_ceil(4),
        |bpe| bpe.encode_with_special_tokens(text).len(),
    )
}

/// Estimated cost in USD of sending `prompt` to a provider
///
/// The same estimate is used for per-request budget filtering and for cost
/// ranking; the provider-reported cost after a successful call is what is
/// actually charged.
pub fn estimate_cost(spec: &ProviderSpec, prompt: &str) -> f64 {
    estimate_tokens(prompt) as f64 * spec.cost_per_token
}
