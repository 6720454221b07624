//! Search criteria for the detail search endpoint

use crate::record::{INGREDIENT_CODE, ITEM_NAME, MANUFACTURER, PRODUCT_CODE};
use serde::{Deserialize, Serialize};

/// Page size used when the caller gives no row-count hint
pub const DEFAULT_NUM_ROWS: u32 = 20;

/// Page size of each per-item-name lookup made by the resolver
pub const ITEM_LOOKUP_NUM_ROWS: u32 = 100;

/// The four searchable fields plus a row-count hint.
///
/// Field names on the wire are the API's own (`gnlNmCd`, `itmNm`, ...), so
/// an HTTP request body deserializes straight into this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(rename = "gnlNmCd", default, skip_serializing_if = "Option::is_none")]
    pub ingredient_code: Option<String>,

    #[serde(rename = "itmNm", default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,

    #[serde(rename = "mdsCd", default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,

    #[serde(rename = "mnfEntpNm", default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<u32>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl SearchCriteria {
    /// Drop empty strings so they count as absent.
    pub fn normalized(self) -> Self {
        Self {
            ingredient_code: non_empty(self.ingredient_code),
            item_name: non_empty(self.item_name),
            product_code: non_empty(self.product_code),
            manufacturer: non_empty(self.manufacturer),
            num_rows: self.num_rows,
        }
    }

    /// At least one of the four fields is set (the precondition of any query).
    pub fn has_any(&self) -> bool {
        self.ingredient_code.is_some() || self.has_secondary()
    }

    /// Any field other than the ingredient code is set.
    pub fn has_secondary(&self) -> bool {
        self.item_name.is_some() || self.product_code.is_some() || self.manufacturer.is_some()
    }

    /// Effective page size, never below 1.
    pub fn page_size(&self) -> u32 {
        self.num_rows.unwrap_or(DEFAULT_NUM_ROWS).max(1)
    }

    /// Criteria for one resolver lookup: the item name replaces any name or
    /// ingredient code, product code and manufacturer carry over.
    pub fn for_item_name(&self, item_name: &str) -> Self {
        Self {
            ingredient_code: None,
            item_name: Some(item_name.to_string()),
            product_code: self.product_code.clone(),
            manufacturer: self.manufacturer.clone(),
            num_rows: Some(ITEM_LOOKUP_NUM_ROWS),
        }
    }

    /// The set fields as `(API name, value)` query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            (INGREDIENT_CODE, &self.ingredient_code),
            (ITEM_NAME, &self.item_name),
            (PRODUCT_CODE, &self.product_code),
            (MANUFACTURER, &self.manufacturer),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    /// Human-readable summary used in logs and CLI headers.
    pub fn describe(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_empty_strings() {
        let criteria = SearchCriteria {
            ingredient_code: Some(String::new()),
            item_name: Some("졸피드정".to_string()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(criteria.ingredient_code, None);
        assert_eq!(criteria.item_name.as_deref(), Some("졸피드정"));
    }

    #[test]
    fn test_has_any() {
        assert!(!SearchCriteria::default().has_any());

        let only_rows = SearchCriteria {
            num_rows: Some(50),
            ..Default::default()
        };
        assert!(!only_rows.has_any());

        let with_code = SearchCriteria {
            ingredient_code: Some("281700ATB".to_string()),
            ..Default::default()
        };
        assert!(with_code.has_any());
        assert!(!with_code.has_secondary());
    }

    #[test]
    fn test_page_size_defaults_and_floor() {
        assert_eq!(SearchCriteria::default().page_size(), DEFAULT_NUM_ROWS);

        let zero = SearchCriteria {
            num_rows: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.page_size(), 1);
    }

    #[test]
    fn test_query_pairs_in_api_order() {
        let criteria = SearchCriteria {
            manufacturer: Some("건일제약".to_string()),
            item_name: Some("아시콘정".to_string()),
            ..Default::default()
        };

        assert_eq!(
            criteria.query_pairs(),
            vec![("itmNm", "아시콘정"), ("mnfEntpNm", "건일제약")]
        );
        assert_eq!(criteria.describe(), "itmNm=아시콘정, mnfEntpNm=건일제약");
    }

    #[test]
    fn test_for_item_name() {
        let criteria = SearchCriteria {
            ingredient_code: Some("281700ATB".to_string()),
            item_name: Some("졸".to_string()),
            manufacturer: Some("건일".to_string()),
            num_rows: Some(5),
            ..Default::default()
        };

        let lookup = criteria.for_item_name("졸피드정");

        assert_eq!(lookup.ingredient_code, None);
        assert_eq!(lookup.item_name.as_deref(), Some("졸피드정"));
        assert_eq!(lookup.manufacturer.as_deref(), Some("건일"));
        assert_eq!(lookup.page_size(), ITEM_LOOKUP_NUM_ROWS);
    }

    #[test]
    fn test_deserialize_request_body() {
        let criteria: SearchCriteria =
            serde_json::from_str(r#"{"gnlNmCd":"281700ATB","mdsCd":"","num_rows":30}"#).unwrap();
        let criteria = criteria.normalized();

        assert_eq!(criteria.ingredient_code.as_deref(), Some("281700ATB"));
        assert_eq!(criteria.product_code, None);
        assert_eq!(criteria.num_rows, Some(30));
    }
}
