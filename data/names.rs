use super::DataError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three labelled axes of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Rows,
    Columns,
    /// Columns of the text grid.
    Text,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Axis::Rows => "row",
            Axis::Columns => "column",
            Axis::Text => "text",
        };
        f.write_str(label)
    }
}

impl FromStr for Axis {
    type Err = DataError;

    /// Accepts `r`/`rows`, `c`/`columns` and `t`/`text`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "row" | "rows" => Ok(Axis::Rows),
            "c" | "col" | "column" | "columns" => Ok(Axis::Columns),
            "t" | "text" => Ok(Axis::Text),
            _ => Err(DataError::InvalidAxis(s.to_string())),
        }
    }
}

/// A compiled, case-insensitive name pattern.
///
/// Patterns are regular expressions. A pattern that is not a valid regex is
/// matched literally instead, so a stray `(` in a column name still finds it.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Option<Regex>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(true)
                    .build()
            });
        match regex {
            Ok(regex) => Self { regex: Some(regex) },
            Err(err) => {
                log::warn!("Pattern '{pattern}' could not be compiled ({err}); it will match nothing.");
                Self { regex: None }
            }
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(name))
    }
}

/// Row, column and text-column labels for one page, plus the page title.
///
/// A list may be shorter than the axis it labels; the trailing entries are
/// simply unnamed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Names {
    pub title: String,
    /// Label for the vector, which acts as column `-1`.
    pub vector: Option<String>,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub text: Vec<String>,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Columns => &self.columns,
            Axis::Text => &self.text,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut Vec<String> {
        match axis {
            Axis::Rows => &mut self.rows,
            Axis::Columns => &mut self.columns,
            Axis::Text => &mut self.text,
        }
    }

    /// Appends a name to the given axis and returns the new count for that axis.
    pub fn add(&mut self, name: &str, axis: Axis) -> usize {
        let list = self.axis_mut(axis);
        list.push(name.to_string());
        list.len()
    }

    /// Index of the first name on `axis` matching `pattern`.
    pub fn find(&self, pattern: &str, axis: Axis) -> Option<usize> {
        let pattern = Pattern::new(pattern);
        self.axis(axis).iter().position(|name| pattern.is_match(name))
    }

    /// Appends `other`'s names on `axis` to this table's names on the same axis.
    pub fn stack(&mut self, other: &Names, axis: Axis) {
        self.cross_stack(other, axis, axis);
    }

    /// Appends `other`'s names on axis `from` to this table's names on axis `to`.
    pub fn cross_stack(&mut self, other: &Names, from: Axis, to: Axis) {
        let incoming = other.axis(from).to_vec();
        self.axis_mut(to).extend(incoming);
    }

    /// Drops the column names flagged in `drop`. Names past the end of the
    /// mask are kept.
    pub fn remove_columns(&mut self, drop: &[bool]) {
        let columns = std::mem::take(&mut self.columns);
        self.columns = columns
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !drop.get(*i).copied().unwrap_or(false))
            .map(|(_, name)| name)
            .collect();
    }

    /// Keeps only the row names whose indices appear in `kept`, in that order.
    pub(crate) fn retain_rows(&mut self, kept: &[usize]) {
        let rows = std::mem::take(&mut self.rows);
        self.rows = kept.iter().filter_map(|&i| rows.get(i).cloned()).collect();
    }

    /// Splits the names on `axis` at `point`, returning the tail.
    pub(crate) fn split_off(&mut self, axis: Axis, point: usize) -> Vec<String> {
        let list = self.axis_mut(axis);
        if point >= list.len() {
            return Vec::new();
        }
        list.split_off(point)
    }
}
