//! Artifact extraction from arbitrarily shaped provider payloads.
//!
//! Providers disagree on where the finished URL lives. Each adapter hands over an
//! ordered list of key paths and the first non-empty string wins.
//!
//! Key paths are dotted field names with optional array indexes, e.g.
//! `results[0].video_url`.

use crate::error::GenerationError;
use crate::models::ArtifactKind;
use serde_json::Value;

/// Shapes seen across providers, most specific last.
pub const DEFAULT_ARTIFACT_PATHS: &[&str] = &[
    "url",
    "result.url",
    "result.video_url",
    "results[0].url",
    "results[0].video_url",
    "images[0].url",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub url: String,
    pub kind: ArtifactKind,
}

/// Resolve a single key path inside `value`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| {
        let (field, indexes) = match segment.find('[') {
            Some(pos) => segment.split_at(pos),
            None => (segment, ""),
        };

        let mut node = if field.is_empty() {
            current
        } else {
            current.get(field)?
        };

        for index in indexes.split('[').skip(1) {
            let index: usize = index.strip_suffix(']')?.parse().ok()?;
            node = node.get(index)?;
        }
        Some(node)
    })
}

/// First non-empty string found at any of `paths`, in order.
pub fn first_string(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| {
        lookup(value, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Extract the finished artifact, or fail with `ArtifactMissing`.
pub fn extract(
    payload: &Value,
    paths: &[&str],
    kind: ArtifactKind,
) -> Result<Artifact, GenerationError> {
    first_string(payload, paths)
        .map(|url| Artifact { url, kind })
        .ok_or(GenerationError::ArtifactMissing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_from_each_documented_shape() {
        let shapes = [
            json!({"result": {"video_url": "X"}}),
            json!({"results": [{"url": "X"}]}),
            json!({"url": "X"}),
            json!({"images": [{"url": "X"}]}),
            json!({"results": [{"video_url": "X"}]}),
        ];

        for shape in shapes {
            let artifact = extract(&shape, DEFAULT_ARTIFACT_PATHS, ArtifactKind::Video).unwrap();
            assert_eq!(artifact.url, "X", "shape: {}", shape);
        }
    }

    #[test]
    fn test_empty_payload_is_artifact_missing() {
        let err = extract(&json!({}), DEFAULT_ARTIFACT_PATHS, ArtifactKind::Image).unwrap_err();
        assert_eq!(err, GenerationError::ArtifactMissing);
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let payload = json!({"url": "  ", "result": {"url": "https://x/real.png"}});
        let artifact = extract(&payload, DEFAULT_ARTIFACT_PATHS, ArtifactKind::Image).unwrap();
        assert_eq!(artifact.url, "https://x/real.png");
    }

    #[test]
    fn test_earlier_paths_take_precedence() {
        let payload = json!({"url": "first", "results": [{"url": "second"}]});
        assert_eq!(
            first_string(&payload, DEFAULT_ARTIFACT_PATHS).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_kind_comes_from_caller_not_url() {
        let payload = json!({"url": "https://x/looks-like-a.png"});
        let artifact = extract(&payload, DEFAULT_ARTIFACT_PATHS, ArtifactKind::Video).unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Video);
    }

    #[test]
    fn test_lookup_handles_nested_and_indexed_paths() {
        let payload = json!({"data": {"outputs": [["a", "b"]]}, "output": ["c"]});
        assert_eq!(lookup(&payload, "data.outputs[0][1]"), Some(&json!("b")));
        assert_eq!(lookup(&payload, "output[0]"), Some(&json!("c")));
        assert_eq!(lookup(&payload, "output[3]"), None);
        assert_eq!(lookup(&payload, "data.missing"), None);
    }

    #[test]
    fn test_non_string_values_are_ignored() {
        let payload = json!({"url": 42, "result": {"url": null}});
        assert!(first_string(&payload, DEFAULT_ARTIFACT_PATHS).is_none());
    }
}
