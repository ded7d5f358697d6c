//! A1 range notation (`animals!A2:G`, `records!B:B`, `'Farm visits'!A5:M5`)

use std::fmt;

use crate::error::{TabularError, TabularResult};

/// A rectangular, possibly open-ended, range on one tab.
///
/// Columns are zero-based (`A` = 0); rows are one-based as in the sheet UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub tab: String,
    pub start_col: u32,
    pub start_row: Option<u32>,
    pub end_col: Option<u32>,
    pub end_row: Option<u32>,
}

impl A1Range {
    /// Single anchor cell, e.g. `animals!A1`
    pub fn cell(tab: &str, col: u32, row: u32) -> Self {
        Self {
            tab: tab.to_string(),
            start_col: col,
            start_row: Some(row),
            end_col: None,
            end_row: None,
        }
    }

    /// Columns `first..=last` from `first_row` down to the last row, e.g. `animals!A2:G`
    pub fn rows_from(tab: &str, first_col: u32, last_col: u32, first_row: u32) -> Self {
        Self {
            tab: tab.to_string(),
            start_col: first_col,
            start_row: Some(first_row),
            end_col: Some(last_col),
            end_row: None,
        }
    }

    /// One full row span, e.g. `records!A5:M5`
    pub fn row_span(tab: &str, row: u32, first_col: u32, last_col: u32) -> Self {
        Self {
            tab: tab.to_string(),
            start_col: first_col,
            start_row: Some(row),
            end_col: Some(last_col),
            end_row: Some(row),
        }
    }

    pub fn parse(input: &str) -> TabularResult<Self> {
        let invalid = || TabularError::InvalidRange(input.to_string());

        let (tab, cells) = input.rsplit_once('!').ok_or_else(invalid)?;
        let tab = unquote_tab(tab);
        if tab.is_empty() {
            return Err(invalid());
        }

        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, Some(end)),
            None => (cells, None),
        };

        let (start_col, start_row) = parse_cell(start).ok_or_else(invalid)?;
        let start_col = start_col.ok_or_else(invalid)?;
        let (end_col, end_row) = match end {
            Some(end) => parse_cell(end).ok_or_else(invalid)?,
            None => (None, None),
        };

        Ok(Self {
            tab,
            start_col,
            start_row,
            end_col,
            end_row,
        })
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            write!(f, "{}!", self.tab)?;
        } else {
            write!(f, "'{}'!", self.tab.replace('\'', "''"))?;
        }
        write!(f, "{}", column_letters(self.start_col))?;
        if let Some(row) = self.start_row {
            write!(f, "{}", row)?;
        }
        if self.end_col.is_some() || self.end_row.is_some() {
            write!(f, ":")?;
            if let Some(col) = self.end_col {
                write!(f, "{}", column_letters(col))?;
            }
            if let Some(row) = self.end_row {
                write!(f, "{}", row)?;
            }
        }
        Ok(())
    }
}

fn unquote_tab(tab: &str) -> String {
    match tab.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => tab.to_string(),
    }
}

/// `G12` → (Some(6), Some(12)); `B` → (Some(1), None); `5` → (None, Some(5))
fn parse_cell(cell: &str) -> Option<(Option<u32>, Option<u32>)> {
    let split = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() && digits.is_empty() {
        return None;
    }
    let col = if letters.is_empty() {
        None
    } else {
        Some(column_index(letters)?)
    };
    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(row)
    };
    Some((col, row))
}

/// `0` → `A`, `25` → `Z`, `26` → `AA`
pub fn column_letters(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Inverse of [`column_letters`]; case-insensitive
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        n = n.checked_mul(26)?.checked_add(u32::from(c) - u32::from('A') + 1)?;
    }
    Some(n - 1)
}
