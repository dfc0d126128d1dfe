//! A small owned column-addressable table.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("table has no data rows")]
    Empty,
    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),
    #[error("row {row} has {got} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Header-addressed rows of strings. Column names are case-preserving and
/// matched exactly; reading a column the table does not have yields the
/// empty string, never an error.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self, TabularError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (pos, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), pos).is_some() {
                return Err(TabularError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), TabularError> {
        if row.len() != self.columns.len() {
            return Err(TabularError::RaggedRow {
                row: self.rows.len(),
                got: row.len(),
                expected: self.columns.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `(row, column)`; `""` for a column the table lacks.
    pub fn value(&self, row: usize, column: &str) -> &str {
        match self.index.get(column) {
            Some(&pos) => self.rows[row][pos].as_str(),
            None => "",
        }
    }

    /// All values of one column, in row order; empty when the column is
    /// missing.
    pub fn column(&self, name: &str) -> Vec<String> {
        match self.index.get(name) {
            Some(&pos) => self.rows.iter().map(|r| r[pos].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Rows for which `predicate` holds, same column layout, source order
    /// preserved.
    pub fn retain_rows(&self, predicate: impl Fn(usize) -> bool) -> Table {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| predicate(*i))
            .map(|(_, r)| r.clone())
            .collect();
        Table {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows,
        }
    }

    /// A new table with exactly `names` as columns, in that order. Columns
    /// absent from `self` come out as empty strings.
    pub fn select(&self, names: &[&str]) -> Table {
        let positions: Vec<Option<usize>> =
            names.iter().map(|n| self.index.get(*n).copied()).collect();
        let columns: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (pos, name) in columns.iter().enumerate() {
            index.insert(name.clone(), pos);
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|p| match p {
                        Some(i) => row[*i].clone(),
                        None => String::new(),
                    })
                    .collect()
            })
            .collect();
        Table {
            columns,
            index,
            rows,
        }
    }

    /// Appends a computed column. `values` must cover every row.
    pub fn with_column(mut self, name: &str, values: Vec<String>) -> Result<Table, TabularError> {
        if values.len() != self.rows.len() {
            return Err(TabularError::RaggedRow {
                row: values.len(),
                got: values.len(),
                expected: self.rows.len(),
            });
        }
        if self.index.contains_key(name) {
            return Err(TabularError::DuplicateColumn(name.to_string()));
        }
        self.index.insert(name.to_string(), self.columns.len());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec!["A".into(), "b".into()]).unwrap();
        t.push_row(vec!["1".into(), "x".into()]).unwrap();
        t.push_row(vec!["2".into(), "y".into()]).unwrap();
        t
    }

    #[test]
    fn missing_column_reads_as_empty() {
        let t = sample();
        assert_eq!(t.value(0, "A"), "1");
        assert_eq!(t.value(0, "a"), "");
        assert_eq!(t.value(1, "nope"), "");
        assert!(t.column("nope").is_empty());
    }

    #[test]
    fn select_keeps_order_and_fills_missing() {
        let t = sample();
        let s = t.select(&["b", "Z", "A"]);
        assert_eq!(s.columns(), &["b", "Z", "A"]);
        assert_eq!(s.value(0, "Z"), "");
        assert_eq!(s.value(1, "A"), "2");
    }

    #[test]
    fn with_column_appends_at_the_end() {
        let t = sample().with_column("C", vec!["c1".into(), "c2".into()]).unwrap();
        assert_eq!(t.columns().last().map(String::as_str), Some("C"));
        assert_eq!(t.value(1, "C"), "c2");
    }

    #[test]
    fn with_column_rejects_length_mismatch_and_duplicates() {
        assert!(sample().with_column("C", vec!["only-one".into()]).is_err());
        assert!(sample().with_column("A", vec!["x".into(), "y".into()]).is_err());
    }

    #[test]
    fn ragged_row_is_rejected() {
        let mut t = Table::new(vec!["A".into()]).unwrap();
        assert!(t.push_row(vec!["1".into(), "2".into()]).is_err());
    }
}
