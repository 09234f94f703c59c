use std::sync::OnceLock;

use regex::Regex;

/// Expand `{{ env.VAR }}` placeholders in a raw TOML string
///
/// `{{ env.VAR | default("fallback") }}` substitutes the fallback when the
/// variable is unset. Expansion runs on the raw text before
/// deserialization, so config structs stay plain String/SecretString.
/// Comment lines are passed through untouched.
pub fn expand_env(input: &str) -> Result<String, String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| {
        Regex::new(r#"\{\{\s*env\.([A-Za-z0-9_]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
            .expect("placeholder pattern is valid")
    });

    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut last_end = 0;
        for captures in placeholder.captures_iter(line) {
            let whole = captures.get(0).expect("match exists");
            let var_name = &captures[1];
            let fallback = captures.get(2).map(|m| m.as_str());

            output.push_str(&line[last_end..whole.start()]);

            match std::env::var(var_name) {
                Ok(value) => output.push_str(&value),
                Err(_) => match fallback {
                    Some(default) => output.push_str(default),
                    None => return Err(format!("environment variable not found: `{var_name}`")),
                },
            }

            last_end = whole.end();
        }
        output.push_str(&line[last_end..]);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}
