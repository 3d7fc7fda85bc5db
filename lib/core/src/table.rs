//! Loosely-typed rows as they come from a table source.
//!
//! Every stage downstream of a [`Table`] converts it to an explicit record
//! type; the table itself only knows headers and nullable text cells.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. The cell count must equal the header count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(Error::LengthMismatch {
                context: "table row",
                expected: self.headers.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Resolve every name to its index, failing on the first absent column.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.require_column(n.as_ref())).collect()
    }

    /// Cell text, with empty strings treated as null.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.require_column(name)?;
        Ok((0..self.rows.len()).map(|r| self.get(r, idx)).collect())
    }

    /// Append a new column, or overwrite an existing one of the same name.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::LengthMismatch {
                context: "table column",
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["id", "name"]);
        t.push_row(vec![Some("1".into()), Some("crab".into())]).unwrap();
        t.push_row(vec![Some("2".into()), Some(String::new())]).unwrap();
        t
    }

    #[test]
    fn test_row_width_checked() {
        let mut t = Table::new(["a", "b"]);
        assert!(matches!(
            t.push_row(vec![None]),
            Err(Error::LengthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_empty_cell_is_null() {
        let t = sample();
        assert_eq!(t.column("name").unwrap(), vec![Some("crab"), None]);
    }

    #[test]
    fn test_missing_column() {
        let t = sample();
        assert!(matches!(t.require_columns(&["id", "vector"]), Err(Error::MissingColumn(c)) if c == "vector"));
    }

    #[test]
    fn test_set_column() {
        let mut t = sample();
        t.set_column("score", vec![Some("0.5".into()), None]).unwrap();
        assert_eq!(t.headers().len(), 3);
        t.set_column("name", vec![None, Some("lobster".into())]).unwrap();
        assert_eq!(t.column("name").unwrap(), vec![None, Some("lobster")]);
        assert!(t.set_column("x", vec![None]).is_err());
    }
}
