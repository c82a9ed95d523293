use crate::error::RecordError;
use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// Parses the JSON object embedded in a dump line. The payload starts at the
/// first `{` and runs to end of line; everything before it is dump metadata.
pub fn extract_payload(line: &[u8]) -> Result<JsonObject, RecordError> {
    let start = memchr::memchr(b'{', line).ok_or(RecordError::NoPayload)?;
    Ok(serde_json::from_slice::<JsonObject>(&line[start..])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_tab_separated_metadata() {
        let line = b"/type/author\t/authors/OL2A\t3\t2008-04-01T03:28:50.625462\t{\"key\":\"/authors/OL2A\"}";
        let obj = extract_payload(line).unwrap();
        assert_eq!(obj["key"], "/authors/OL2A");
    }

    #[test]
    fn payload_without_prefix() {
        let obj = extract_payload(br#"{"a":1}"#).unwrap();
        assert_eq!(obj["a"], 1);
    }

    #[test]
    fn no_brace_is_no_payload() {
        let err = extract_payload(b"meta\tonly\tfields").unwrap_err();
        assert!(matches!(err, RecordError::NoPayload));
    }

    #[test]
    fn empty_line_is_no_payload() {
        assert!(matches!(
            extract_payload(b"").unwrap_err(),
            RecordError::NoPayload
        ));
    }

    #[test]
    fn truncated_json_is_malformed() {
        let err = extract_payload(b"meta\t{\"key\": \"/works/OL1W\"").unwrap_err();
        assert!(matches!(err, RecordError::MalformedJson(_)));
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        let err = extract_payload(b"meta\t{\"a\":1} extra").unwrap_err();
        assert!(matches!(err, RecordError::MalformedJson(_)));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let err = extract_payload(b"meta\t{\"a\":\"\xff\"}").unwrap_err();
        assert!(matches!(err, RecordError::MalformedJson(_)));
    }

    #[test]
    fn brace_inside_metadata_wins() {
        // First `{` is what counts, even if it is not the real payload start.
        let err = extract_payload(b"me{ta\t{\"a\":1}").unwrap_err();
        assert!(matches!(err, RecordError::MalformedJson(_)));
    }
}
