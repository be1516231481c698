//! Serde helpers for partial-update request bodies.

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use together with `#[serde(default)]`: a missing key stays `None`, a JSON
/// `null` becomes `Some(None)`, and a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Changes {
        #[serde(default, deserialize_with = "double_option")]
        end_date: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value() {
        let c: Changes = serde_json::from_str("{}").unwrap();
        assert_eq!(c.end_date, None);

        let c: Changes = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
        assert_eq!(c.end_date, Some(None));

        let c: Changes = serde_json::from_str(r#"{"end_date": "2024-06-30"}"#).unwrap();
        assert_eq!(c.end_date, Some(Some("2024-06-30".to_string())));
    }
}
