use crate::{IndexInfo, RecordBatch, RowMap};
use tabled::{Table, Tabled, builder::Builder, settings};

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut Table) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render a `RecordBatch` into a human-friendly table string.
///
/// Columns follow `batch.columns`; when that is empty the keys of the first
/// row are used in sorted order.
pub fn render_record_batch(batch: &RecordBatch, style: TableStyleKind) -> String {
    if batch.rows.is_empty() {
        return "<empty>".into();
    }

    let columns = if batch.columns.is_empty() {
        sorted_keys(&batch.rows[0])
    } else {
        batch.columns.clone()
    };

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for row in &batch.rows {
        builder.push_record(columns.iter().map(|col| format_cell(row, col)));
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Render index metadata entries as a table.
pub fn render_indexes(indexes: &[IndexInfo], style: TableStyleKind) -> String {
    #[derive(Clone, Tabled)]
    struct IndexRow {
        #[tabled(rename = "index")]
        index_name: String,
        #[tabled(rename = "table")]
        table_name: String,
        columns: String,
    }

    let rows: Vec<IndexRow> = indexes
        .iter()
        .map(|info| IndexRow {
            index_name: info.index_name.clone(),
            table_name: info.table_name.clone(),
            columns: info.columns.clone(),
        })
        .collect();

    render_structured_rows(&rows, style)
}

/// Render any `Tabled` rows with the provided style.
pub fn render_structured_rows<T>(rows: &[T], style: TableStyleKind) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "<empty>".into();
    }

    let mut table = Table::new(rows.to_vec());
    style.apply(&mut table);
    table.to_string()
}

fn format_cell(row: &RowMap, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

fn sorted_keys(row: &RowMap) -> Vec<String> {
    let mut keys: Vec<String> = row.keys().cloned().collect();
    keys.sort();
    keys
}
