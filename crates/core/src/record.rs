//! Drug records with a dynamic, ordered field set
//!
//! Neither data source declares a fixed schema, so a record is an ordered
//! list of `field -> optional text` pairs. Serialization keeps the order the
//! source returned the fields in.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// API field name of the product code
pub const PRODUCT_CODE: &str = "mdsCd";
/// API field name of the ingredient (general name) code
pub const INGREDIENT_CODE: &str = "gnlNmCd";
/// API field name of the item name
pub const ITEM_NAME: &str = "itmNm";
/// API field name of the manufacturer
pub const MANUFACTURER: &str = "mnfEntpNm";

/// One drug item as returned by either data source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugRecord {
    fields: Vec<(String, Option<String>)>,
}

impl DrugRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Value of a field, `None` when the field is missing or null.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn product_code(&self) -> Option<&str> {
        self.get(PRODUCT_CODE)
    }

    pub fn ingredient_code(&self) -> Option<&str> {
        self.get(INGREDIENT_CODE)
    }

    pub fn item_name(&self) -> Option<&str> {
        self.get(ITEM_NAME)
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.get(MANUFACTURER)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for DrugRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut record = DrugRecord::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// Flatten a JSON value into the text form records store.
///
/// Strings pass through, null stays null, other scalars use their JSON
/// spelling. Nested arrays/objects are kept as compact JSON text.
pub fn json_to_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl Serialize for DrugRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct DrugRecordVisitor;

impl<'de> Visitor<'de> for DrugRecordVisitor {
    type Value = DrugRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object of drug fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = DrugRecord::new();
        while let Some((name, value)) = access.next_entry::<String, serde_json::Value>()? {
            record.insert(name, json_to_text(value));
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for DrugRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DrugRecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record() -> DrugRecord {
        DrugRecord::from_iter([
            ("itmNm", Some("졸피드정".to_string())),
            ("mdsCd", Some("A03850091".to_string())),
            ("gnlNmCd", Some("281700ATB".to_string())),
            ("mnfEntpNm", Some("건일제약".to_string())),
            ("spcGnlTpNm", None),
        ])
    }

    #[test]
    fn test_special_field_accessors() {
        let record = create_test_record();
        assert_eq!(record.item_name(), Some("졸피드정"));
        assert_eq!(record.product_code(), Some("A03850091"));
        assert_eq!(record.ingredient_code(), Some("281700ATB"));
        assert_eq!(record.manufacturer(), Some("건일제약"));
    }

    #[test]
    fn test_null_field_is_present_but_empty() {
        let record = create_test_record();
        assert!(record.contains_field("spcGnlTpNm"));
        assert_eq!(record.get("spcGnlTpNm"), None);
        assert!(!record.contains_field("unknown"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = create_test_record();
        record.insert("mdsCd", Some("B00000001".to_string()));
        assert_eq!(record.len(), 5);
        assert_eq!(record.product_code(), Some("B00000001"));
        assert_eq!(record.field_names().nth(1), Some("mdsCd"));
    }

    #[test]
    fn test_serialize_keeps_field_order() {
        let record = create_test_record();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"itmNm":"졸피드정","mdsCd":"A03850091","gnlNmCd":"281700ATB","mnfEntpNm":"건일제약","spcGnlTpNm":null}"#
        );
    }

    #[test]
    fn test_deserialize_stringifies_scalars() {
        let record: DrugRecord = serde_json::from_str(
            r#"{"제품명":"아시콘정","단가":1250,"급여":true,"비고":null,"주성분코드":"281700ATB"}"#,
        )
        .unwrap();

        assert_eq!(record.get("제품명"), Some("아시콘정"));
        assert_eq!(record.get("단가"), Some("1250"));
        assert_eq!(record.get("급여"), Some("true"));
        assert_eq!(record.get("비고"), None);
        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            vec!["제품명", "단가", "급여", "비고", "주성분코드"]
        );
    }

    #[test]
    fn test_deserialize_rejects_non_object() {
        let result: Result<DrugRecord, _> = serde_json::from_str("[1, 2]");
        assert!(result.is_err());
    }
}
