use crate::prelude::{println, *};
use colored::Colorize;
use drugfinder_core::DrugRecord;
use prettytable::{Cell, Row};

/// Columns for a records table: the preferred ones present in the records,
/// or every field of the first record when none is.
fn table_columns(records: &[DrugRecord], preferred: &[&str]) -> Vec<String> {
    let mut columns: Vec<String> = preferred
        .iter()
        .filter(|name| records.iter().any(|r| r.contains_field(name)))
        .map(|name| name.to_string())
        .collect();

    if columns.is_empty() {
        if let Some(first) = records.first() {
            columns.extend(first.field_names().map(str::to_string));
        }
    }
    columns
}

/// Print at most `limit` records as a table under `title`
pub fn print_records(title: &str, records: &[DrugRecord], preferred: &[&str], limit: usize) {
    println!("\n{} ({})", title.bold(), records.len().to_string().cyan());

    if records.is_empty() {
        println!("{}", "No results".yellow());
        return;
    }

    let shown = &records[..records.len().min(limit)];
    let columns = table_columns(shown, preferred);

    let mut table = new_table();
    table.add_row(Row::new(
        columns.iter().map(|c| Cell::new(c)).collect(),
    ));
    for record in shown {
        table.add_row(Row::new(
            columns
                .iter()
                .map(|c| Cell::new(record.get(c).unwrap_or("-")))
                .collect(),
        ));
    }
    table.printstd();

    if records.len() > shown.len() {
        println!(
            "{}",
            format!("... and {} more", records.len() - shown.len()).dimmed()
        );
    }
}

/// Print `value` as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bulk_row, detail_record};

    #[test]
    fn test_table_columns_prefers_known_fields() {
        let records = vec![detail_record("P1", "A", "가나제약")];

        let columns = table_columns(&records, &["itmNm", "mdsCd", "missing"]);

        assert_eq!(columns, vec!["itmNm", "mdsCd"]);
    }

    #[test]
    fn test_table_columns_falls_back_to_record_fields() {
        let records = vec![bulk_row("281700ATB", "A")];

        let columns = table_columns(&records, &["itmNm"]);

        assert_eq!(columns, vec!["주성분코드", "제품명"]);
    }

    #[test]
    fn test_table_columns_empty() {
        assert!(table_columns(&[], &["itmNm"]).is_empty());
    }
}
