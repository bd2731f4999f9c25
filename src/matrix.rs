use std::fmt;

use crate::error::ParseError;

/// One parsed line: the values in the order they were received.
pub type Row = Vec<i64>;

/// A completed grid, rows in arrival order.
///
/// No shape is enforced here. Rows keep whatever number of values the device sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    rows: Vec<Row>,
}

impl Matrix {
    /// Wraps rows into a matrix.
    pub fn new(rows: Vec<Row>) -> Self {
        Matrix { rows }
    }

    /// The 3×3 checkerboard shown before any data arrives and after the heatmap is cleared.
    pub fn placeholder() -> Self {
        Matrix::new(vec![vec![3, 1, 3], vec![1, 3, 1], vec![3, 1, 3]])
    }

    /// The rows in arrival order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the first row, or zero for an empty matrix.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Swaps rows and columns.
    ///
    /// Only meaningful for rectangular matrices; values of rows shorter than the first row are
    /// skipped.
    pub fn transposed(&self) -> Matrix {
        let columns: Vec<Row> = (0..self.width())
            .map(|c| self.rows.iter().filter_map(|r| r.get(c).copied()).collect::<Row>())
            .collect();
        Matrix::new(columns)
    }

    /// Smallest and largest value, if there are any values at all.
    pub fn min_max(&self) -> Option<(i64, i64)> {
        self.rows.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Consumes the matrix returning its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl From<Vec<Row>> for Matrix {
    fn from(rows: Vec<Row>) -> Self {
        Matrix::new(rows)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let mut values = row.iter();
            if let Some(first) = values.next() {
                write!(f, "{}", first)?;
            }
            for v in values {
                write!(f, " {}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses a whitespace-separated row of decimal integers.
///
/// A blank line is rejected rather than turned into an empty row.
pub fn parse_row(line: &str) -> Result<Row, ParseError> {
    let malformed = |token: Option<&str>| ParseError::MalformedRow {
        line: line.to_owned(),
        token: token.map(str::to_owned),
    };

    let row = line
        .split_whitespace()
        .map(|token| token.parse::<i64>().map_err(|_| malformed(Some(token))))
        .collect::<Result<Row, _>>()?;

    if row.is_empty() {
        return Err(malformed(None));
    }
    Ok(row)
}
