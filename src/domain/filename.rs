//! Storage path parsing
//!
//! Turns an ingested photo path such as `plose-plosebob/IMG_2201.jpg` into
//! the tokens used for routing:
//! - `prefix` - first path segment, matched against `park_path_prefixes`
//! - `customer_code` - standalone 4-digit token in the file stem
//! - `legacy_customer_code` - leading 4 digits of a long numeric token
//!   (older exports glued the code in front of the capture timestamp)
//!
//! Parsing is total: malformed input yields absent fields, never an error.

use serde::Serialize;

/// Length of a customer/camera code
pub const CUSTOMER_CODE_LEN: usize = 4;

/// Minimum length of a legacy numeric token (code + at least a date)
const LEGACY_TOKEN_MIN_LEN: usize = 8;

/// Characters separating tokens inside a file stem
const TOKEN_SEPARATORS: [char; 4] = ['_', '-', '.', ' '];

/// Routing tokens extracted from a storage path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPath {
    pub path: Option<String>,
    pub prefix: Option<String>,
    pub directory: Option<String>,
    pub file_name: Option<String>,
    pub extension: Option<String>,
    pub customer_code: Option<String>,
    pub legacy_customer_code: Option<String>,
    pub sequence: Option<String>,
}

impl ParsedPath {
    /// True when nothing was recognized
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Normalize separators and drop empty segments
fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Split a file name into stem and lowercased extension.
/// A leading dot (`.hidden`) is part of the stem.
fn split_extension(file_name: &str) -> (&str, Option<String>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => {
            (&file_name[..idx], Some(file_name[idx + 1..].to_ascii_lowercase()))
        }
        _ => (file_name, None),
    }
}

/// Parse a storage path into routing tokens
pub fn parse_filename(raw: &str) -> ParsedPath {
    let segments = segments(raw);
    let Some((&file_name, leading)) = segments.split_last() else {
        return ParsedPath::default();
    };

    let (prefix, directory) = match leading.split_first() {
        Some((&prefix, rest)) => {
            let directory = if rest.is_empty() { None } else { Some(rest.join("/")) };
            (Some(prefix.to_string()), directory)
        }
        None => (None, None),
    };

    let (stem, extension) = split_extension(file_name);
    let tokens: Vec<&str> = stem.split(TOKEN_SEPARATORS).filter(|t| !t.is_empty()).collect();

    let primary_idx =
        tokens.iter().position(|t| t.len() == CUSTOMER_CODE_LEN && is_digits(t));
    let legacy_idx =
        tokens.iter().position(|t| t.len() >= LEGACY_TOKEN_MIN_LEN && is_digits(t));

    let sequence = tokens
        .iter()
        .enumerate()
        .rev()
        .find(|(idx, t)| Some(*idx) != primary_idx && Some(*idx) != legacy_idx && is_digits(t))
        .map(|(_, t)| t.to_string());

    ParsedPath {
        path: Some(segments.join("/")),
        prefix,
        directory,
        file_name: Some(file_name.to_string()),
        extension,
        customer_code: primary_idx.map(|idx| tokens[idx].to_string()),
        legacy_customer_code: legacy_idx.map(|idx| tokens[idx][..CUSTOMER_CODE_LEN].to_string()),
        sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_primary_code() {
        let parsed = parse_filename("plose-plosebob/IMG_2201.jpg");
        assert_eq!(parsed.path.as_deref(), Some("plose-plosebob/IMG_2201.jpg"));
        assert_eq!(parsed.prefix.as_deref(), Some("plose-plosebob"));
        assert_eq!(parsed.directory, None);
        assert_eq!(parsed.file_name.as_deref(), Some("IMG_2201.jpg"));
        assert_eq!(parsed.extension.as_deref(), Some("jpg"));
        assert_eq!(parsed.customer_code.as_deref(), Some("2201"));
        assert_eq!(parsed.legacy_customer_code, None);
        assert_eq!(parsed.sequence, None);
    }

    #[test]
    fn test_legacy_code_alongside_primary() {
        let parsed = parse_filename("plose-plosebob/IMG_2201_022120240712.JPG");
        assert_eq!(parsed.customer_code.as_deref(), Some("2201"));
        assert_eq!(parsed.legacy_customer_code.as_deref(), Some("0221"));
        assert_eq!(parsed.extension.as_deref(), Some("jpg"));
    }

    #[test]
    fn test_legacy_code_only() {
        let parsed = parse_filename("park-a/2024/07/022120240712101500.jpg");
        assert_eq!(parsed.prefix.as_deref(), Some("park-a"));
        assert_eq!(parsed.directory.as_deref(), Some("2024/07"));
        assert_eq!(parsed.customer_code, None);
        assert_eq!(parsed.legacy_customer_code.as_deref(), Some("0221"));
    }

    #[test]
    fn test_sequence_token() {
        let parsed = parse_filename("park-a/CAM-2201-000345.jpg");
        assert_eq!(parsed.customer_code.as_deref(), Some("2201"));
        assert_eq!(parsed.sequence.as_deref(), Some("000345"));
    }

    #[test]
    fn test_first_four_digit_token_wins() {
        let parsed = parse_filename("park-a/1111_2222.jpg");
        assert_eq!(parsed.customer_code.as_deref(), Some("1111"));
        assert_eq!(parsed.sequence.as_deref(), Some("2222"));
    }

    #[test]
    fn test_embedded_digits_are_not_codes() {
        // Digits glued to letters or of the wrong width are not codes
        let parsed = parse_filename("park-a/IMG2201_123.jpg");
        assert_eq!(parsed.customer_code, None);
        assert_eq!(parsed.legacy_customer_code, None);
        assert_eq!(parsed.sequence.as_deref(), Some("123"));

        let parsed = parse_filename("park-a/IMG_22011.jpg");
        assert_eq!(parsed.customer_code, None);
        assert_eq!(parsed.legacy_customer_code, None);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(parse_filename("").is_empty());
        assert!(parse_filename("   ").is_empty());
        assert!(parse_filename("///").is_empty());
    }

    #[test]
    fn test_bare_file_name_has_no_prefix() {
        let parsed = parse_filename("IMG_2201.jpg");
        assert_eq!(parsed.prefix, None);
        assert_eq!(parsed.customer_code.as_deref(), Some("2201"));
    }

    #[test]
    fn test_unstructured_name_yields_no_routing_tokens() {
        let parsed = parse_filename("hello");
        assert_eq!(
            parsed,
            ParsedPath {
                path: Some("hello".to_string()),
                file_name: Some("hello".to_string()),
                ..ParsedPath::default()
            }
        );

        let parsed = parse_filename("plose-plosebob/IMG_abc.jpg");
        assert_eq!(parsed.prefix.as_deref(), Some("plose-plosebob"));
        assert_eq!(parsed.customer_code, None);
        assert_eq!(parsed.legacy_customer_code, None);
        assert_eq!(parsed.sequence, None);
    }

    #[test]
    fn test_normalizes_separators() {
        let parsed = parse_filename("  /plose-plosebob\\\\sub//IMG_2201.jpg ");
        assert_eq!(parsed.path.as_deref(), Some("plose-plosebob/sub/IMG_2201.jpg"));
        assert_eq!(parsed.prefix.as_deref(), Some("plose-plosebob"));
        assert_eq!(parsed.directory.as_deref(), Some("sub"));
    }

    #[test]
    fn test_prefix_is_case_preserving() {
        let parsed = parse_filename("Plose-PloseBob/IMG_2201.jpg");
        assert_eq!(parsed.prefix.as_deref(), Some("Plose-PloseBob"));
    }

    #[test]
    fn test_extension_edge_cases() {
        assert_eq!(parse_filename("a/.hidden").extension, None);
        assert_eq!(parse_filename("a/trailing.").extension, None);
        assert_eq!(parse_filename("a/archive.tar.GZ").extension.as_deref(), Some("gz"));
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        let inputs = ["ü/ß_2201.jpg", "🎢/😀", "park/ÄÖÜ_٣٣٣٣.jpg", "\u{0}", "a/b/c/d/e/f"];
        for input in inputs {
            assert_eq!(parse_filename(input), parse_filename(input));
        }
        // Non-ASCII digits never form a code
        assert_eq!(parse_filename("park/ÄÖÜ_٣٣٣٣.jpg").customer_code, None);
        assert_eq!(parse_filename("ü/ß_2201.jpg").customer_code.as_deref(), Some("2201"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(parse_filename("p/IMG_2201.jpg")).unwrap();
        assert_eq!(json["prefix"], "p");
        assert_eq!(json["customerCode"], "2201");
        assert_eq!(json["legacyCustomerCode"], serde_json::Value::Null);
        assert_eq!(json["fileName"], "IMG_2201.jpg");
    }
}
