use crate::value::{Object, Value};
use regex::Regex;
use std::sync::LazyLock;

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("valid name pattern"));

static HYPHEN_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("valid hyphen pattern"));

/// Longest name GCP accepts for most resources
pub const MAX_RESOURCE_NAME_LENGTH: usize = 63;

/// Recursively overlay `overrides` onto `target`
///
/// An object on both sides is merged key by key. Anything else (arrays, scalars, null, or an object meeting a
/// non-object) is replaced by the override. Keys new to `target` are appended.
pub fn deep_update(target: &mut Object, overrides: &Object) {
    for (key, value) in overrides {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(key) {
                deep_update(existing, incoming);
                continue;
            }
        }

        target.insert(key.clone(), value.clone());
    }
}

/// Turn any name idea into a valid GCP resource name
///
/// Lowercases, replaces everything outside `[a-z0-9-]` with `-`, collapses runs of `-`, strips `-` from both
/// ends and cuts the result to `max_len`. Idempotent.
pub fn sanitize_resource_name(name: &str, max_len: usize) -> String {
    let lowercase = name.to_lowercase();
    let replaced = INVALID_NAME_CHARS.replace_all(&lowercase, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&replaced, "-");

    // only ascii is left, byte truncation is safe
    let mut sanitized = collapsed.trim_matches('-').to_string();
    sanitized.truncate(max_len);
    sanitized.trim_end_matches('-').to_string()
}

/// Name of the `index`th (1-based) of `count` instances
///
/// Joins `[prefix, base, index if count > 1, suffix]` with `-`, skipping empty parts, and sanitizes the result.
pub fn instance_name(prefix: &str, base: &str, suffix: &str, index: usize, count: usize) -> String {
    let index = if count > 1 {
        index.to_string()
    } else {
        String::new()
    };

    let parts: Vec<&str> = [prefix, base, index.as_str(), suffix]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    sanitize_resource_name(&parts.join("-"), MAX_RESOURCE_NAME_LENGTH)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value;
    use pretty_assertions::assert_eq;

    fn is_valid_name(name: &str) -> bool {
        name.len() <= MAX_RESOURCE_NAME_LENGTH
            && !name.starts_with('-')
            && !name.ends_with('-')
            && !name.contains("--")
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn sanitize_examples() {
        assert_eq!(sanitize_resource_name("My_VPC  Name", 63), "my-vpc-name");
        assert_eq!(sanitize_resource_name("--a--b--", 63), "a-b");
        assert_eq!(sanitize_resource_name("a_-_b..c", 63), "a-b-c");
        assert_eq!(sanitize_resource_name("Ünïcode!", 63), "n-code");
        assert_eq!(sanitize_resource_name("", 63), "");
    }

    #[test]
    fn sanitize_never_ends_with_hyphen_after_truncation() {
        let name = format!("{}_tail", "a".repeat(62));
        let sanitized = sanitize_resource_name(&name, 63);
        assert_eq!(sanitized, "a".repeat(62));
        assert!(is_valid_name(&sanitized));
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "Hello World",
            "a--b",
            "__x__",
            "UPPER.case/with:punctuation",
            "0123456789-abcdefghijklmnopqrstuvwxyz-0123456789-abcdefghijklmnopqrstuvwxyz",
            "   ",
            "déjà-vu",
        ] {
            let once = sanitize_resource_name(input, MAX_RESOURCE_NAME_LENGTH);
            let twice = sanitize_resource_name(&once, MAX_RESOURCE_NAME_LENGTH);
            assert_eq!(once, twice, "input: {input:?}");
            assert!(is_valid_name(&once), "input: {input:?} -> {once:?}");
        }
    }

    #[test]
    fn instance_names() {
        assert_eq!(instance_name("", "db", "", 1, 1), "db");
        assert_eq!(instance_name("acme", "db", "prod", 2, 3), "acme-db-2-prod");
        assert_eq!(instance_name("Acme", "My DB", "", 1, 1), "acme-my-db");
    }

    #[test]
    fn deep_update_recurses_into_objects() {
        let mut target = value!({"a": {"x": 1, "y": 2}, "b": [1, 2], "c": "keep"});
        let overrides = value!({"a": {"y": 3, "z": 4}, "b": [9], "d": null});
        deep_update(
            target.as_object_mut().unwrap(),
            overrides.as_object().unwrap(),
        );

        assert_eq!(
            target,
            value!({"a": {"x": 1, "y": 3, "z": 4}, "b": [9], "c": "keep", "d": null})
        );
    }

    #[test]
    fn deep_update_object_replaces_scalar() {
        let mut target = value!({"settings": null});
        let overrides = value!({"settings": {"tier": "db-f1"}});
        deep_update(
            target.as_object_mut().unwrap(),
            overrides.as_object().unwrap(),
        );

        assert_eq!(target, value!({"settings": {"tier": "db-f1"}}));
    }
}
