use std::iter;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("row has {found} fields but the header has {expected}")]
pub struct RowWidthError {
    pub expected: usize,
    pub found: usize,
}

/// An ordered, in-memory table of string cells sharing one header.
/// Row order is insertion order and is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Appends a row. Short rows are padded with empty cells; rows wider than
    /// the header are rejected.
    pub fn push_row(&mut self, mut row: Vec<String>) -> Result<(), RowWidthError> {
        let expected = self.headers.len();
        if row.len() > expected {
            return Err(RowWidthError {
                expected,
                found: row.len(),
            });
        }
        row.resize(expected, String::new());
        self.rows.push(row);
        Ok(())
    }

    /// Cells of the named column in row order.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Writes `values` into the named column, replacing it in place if it
    /// exists and appending it as the last column otherwise. `values` is
    /// matched to rows by position; missing values become empty cells.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());

        let mut values = values.into_iter().chain(iter::repeat_with(String::new));
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(&mut values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(&mut values) {
                    row.push(value);
                }
            }
        }
    }
}
