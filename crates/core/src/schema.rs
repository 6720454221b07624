//! Column lookup over the bulk dataset's dynamic schema
//!
//! The bulk dataset names its columns in Korean and has changed naming
//! between releases, so each column role carries a declared list of known
//! names plus a fallback substring rule.

use crate::record::{INGREDIENT_CODE, ITEM_NAME, MANUFACTURER, PRODUCT_CODE};

/// A column the resolver needs to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    IngredientCode,
    ItemName,
    ProductCode,
    Manufacturer,
}

impl ColumnRole {
    /// Known column names, most specific first
    pub fn declared_names(self) -> &'static [&'static str] {
        match self {
            ColumnRole::IngredientCode => &["주성분코드", INGREDIENT_CODE],
            ColumnRole::ItemName => &["품목명", "제품명", ITEM_NAME],
            ColumnRole::ProductCode => &["제품코드", PRODUCT_CODE],
            ColumnRole::Manufacturer => &["제조업체명", "업체명", MANUFACTURER],
        }
    }

    /// Substring rule tried when no declared name is present.
    pub fn matches_fallback(self, column: &str) -> bool {
        match self {
            ColumnRole::IngredientCode => column.contains("주성분") && column.contains("코드"),
            ColumnRole::ItemName => column.contains("품목명") || column.contains("제품명"),
            ColumnRole::ProductCode => column.contains("제품코드"),
            ColumnRole::Manufacturer => column.contains("제조업체") || column.contains("업체명"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::IngredientCode => "ingredient code",
            ColumnRole::ItemName => "item name",
            ColumnRole::ProductCode => "product code",
            ColumnRole::Manufacturer => "manufacturer",
        }
    }
}

/// Find the column playing `role`: declared names first, then the fallback
/// rule over the columns in order.
pub fn resolve_column(columns: &[String], role: ColumnRole) -> Option<&str> {
    role.declared_names()
        .iter()
        .find_map(|declared| columns.iter().find(|c| c.as_str() == *declared))
        .or_else(|| columns.iter().find(|c| role.matches_fallback(c)))
        .map(String::as_str)
}

/// Resolved column names for every role of one dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub ingredient_code: Option<String>,
    pub item_name: Option<String>,
    pub product_code: Option<String>,
    pub manufacturer: Option<String>,
}

impl ColumnMap {
    pub fn detect(columns: &[String]) -> Self {
        let find = |role| resolve_column(columns, role).map(str::to_string);
        Self {
            ingredient_code: find(ColumnRole::IngredientCode),
            item_name: find(ColumnRole::ItemName),
            product_code: find(ColumnRole::ProductCode),
            manufacturer: find(ColumnRole::Manufacturer),
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::IngredientCode => self.ingredient_code.as_deref(),
            ColumnRole::ItemName => self.item_name.as_deref(),
            ColumnRole::ProductCode => self.product_code.as_deref(),
            ColumnRole::Manufacturer => self.manufacturer.as_deref(),
        }
    }
}
