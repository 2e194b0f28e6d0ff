//! JSON body conversion.

use bytes::Bytes;

use crate::Result;

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes with path-aware error messages.
///
/// Failures report the path of the offending field through
/// `serde_path_to_error`, e.g. `[0].completed`.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`](crate::Error::JsonDeserialization)
/// if the bytes do not match `T`.
///
/// # Example
///
/// ```
/// use triage_core::from_json;
///
/// let ids: Vec<u64> = from_json(b"[1, 2, 3]").expect("deserialize");
/// assert_eq!(ids, vec![1, 2, 3]);
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Todo {
        user_id: u64,
        title: String,
        completed: bool,
    }

    #[test]
    fn to_json_uses_serde_names() {
        let todo = Todo {
            user_id: 7,
            title: "a".to_string(),
            completed: true,
        };
        let bytes = to_json(&todo).expect("serialize");
        assert_eq!(
            bytes.as_ref(),
            br#"{"userId":7,"title":"a","completed":true}"#
        );
    }

    #[test]
    fn from_json_reads_list() {
        let todos: Vec<Todo> =
            from_json(br#"[{"userId":1,"title":"a","completed":false}]"#).expect("deserialize");
        assert_eq!(
            todos,
            vec![Todo {
                user_id: 1,
                title: "a".to_string(),
                completed: false,
            }]
        );
    }

    #[test]
    fn from_json_reports_field_path() {
        let result: Result<Vec<Todo>> =
            from_json(br#"[{"userId":1,"title":"a","completed":"no"}]"#);

        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("[0].completed"), "unexpected message: {msg}");
    }

    #[test]
    fn from_json_syntax_error() {
        let result: Result<Vec<Todo>> = from_json(b"<html>");
        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("JSON deserialization error"));
    }
}
