use crate::Result;
use std::collections::BTreeMap;

/// Names of the flags present in a plugin's raw argument list.
///
/// Stops at `--`. Accepts `--name`, `-n`, `--name=value` and `-n=value`;
/// clusters such as `-bc` expand to one entry per character. Positional
/// tokens are ignored and leading dashes are stripped.
#[must_use]
pub fn flag_names<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut names = Vec::new();
    for arg in args {
        let token = arg.as_ref();
        if token == "--" {
            break;
        }
        if let Some(long) = token.strip_prefix("--") {
            let name = long.split_once('=').map_or(long, |(name, _)| name);
            if !name.is_empty() {
                names.push(name.to_string());
            }
        } else if let Some(short) = token.strip_prefix('-') {
            let name = short.split_once('=').map_or(short, |(name, _)| name);
            if name.chars().count() > 1 {
                names.extend(name.chars().map(String::from));
            } else if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// JSON object with each flag name mapped to an empty string.
pub fn flag_names_json<S: AsRef<str>>(names: &[S]) -> Result<String> {
    let map: BTreeMap<&str, &str> = names.iter().map(|name| (name.as_ref(), "")).collect();
    Ok(serde_json::to_string(&map)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_expands_clusters_and_stops_at_terminator() {
        let args = ["-a", "--flag1", "--flag2=value", "-bc", "--", "--arg1", "--arg2"];
        assert_eq!(flag_names(&args), vec!["a", "flag1", "flag2", "b", "c"]);
    }

    #[test]
    fn tokenizer_ignores_positionals() {
        let args = ["create", "my-cluster", "-", "-o=yaml", "--dry-run"];
        assert_eq!(flag_names(&args), vec!["o", "dry-run"]);
    }

    #[test]
    fn flag_names_json_has_empty_values() {
        let json = flag_names_json(&["flag2", "flag1"]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!({"flag1": "", "flag2": ""}));
        assert_eq!(flag_names_json::<&str>(&[]).unwrap(), "{}");
    }
}
