//! Expansion of one wide data line into long-format output rows.
//!
//! A data line holds the coordinate values of one mesh point followed by one
//! block of variable values per parameter combination. Each block becomes one
//! output row carrying its combination's parameter values and the point's
//! coordinates.

use crate::constants::CSV_DELIMITER;
use crate::error::{Result, TranscodeError};
use crate::header::HeaderTable;
use std::fmt;
use std::io::{self, Write};
use std::slice::ChunksExact;

/// Expands data lines against one classified header
#[derive(Debug)]
pub struct RowExpander<'h> {
    header: &'h HeaderTable,
    combinations: Vec<Vec<&'h str>>,
}

impl<'h> RowExpander<'h> {
    pub fn new(header: &'h HeaderTable) -> Self {
        let combinations = (0..header.combination_count())
            .filter_map(|index| header.combination(index))
            .collect();
        Self {
            header,
            combinations,
        }
    }

    /// Lazily expand one tokenized data line. `line` is only used in errors.
    ///
    /// A trailing block shorter than the variable count is dropped silently.
    pub fn expand<'a>(&'a self, line: usize, tokens: &'a [&'a str]) -> ExpandedRows<'a> {
        let split = self.header.coordinates().len().min(tokens.len());
        // Lines shorter than the coordinate slice leave an empty remainder
        let (coordinates, remainder) = tokens.split_at(split);

        ExpandedRows {
            combinations: &self.combinations,
            unbounded: self.header.parameters().is_empty(),
            coordinates,
            blocks: remainder.chunks_exact(self.header.block_size()),
            index: 0,
            line,
            failed: false,
        }
    }

    /// Rows a line of `token_count` tokens expands into
    pub fn row_count(&self, token_count: usize) -> usize {
        token_count.saturating_sub(self.header.coordinates().len()) / self.header.block_size()
    }

    /// Tokens a line of `token_count` tokens loses to a trailing partial block
    pub fn dropped_tokens(&self, token_count: usize) -> usize {
        token_count.saturating_sub(self.header.coordinates().len()) % self.header.block_size()
    }
}

/// Finite, forward-only sequence of rows produced from one data line
pub struct ExpandedRows<'a> {
    combinations: &'a [Vec<&'a str>],
    unbounded: bool,
    coordinates: &'a [&'a str],
    blocks: ChunksExact<'a, &'a str>,
    index: usize,
    line: usize,
    failed: bool,
}

impl<'a> Iterator for ExpandedRows<'a> {
    type Item = Result<OutputRow<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let values = self.blocks.next()?;
        let index = self.index;
        self.index += 1;

        let parameters: &'a [&'a str] = if self.unbounded {
            &[]
        } else {
            match self.combinations.get(index) {
                Some(combination) => combination.as_slice(),
                None => {
                    self.failed = true;
                    return Some(Err(TranscodeError::CombinationOutOfRange {
                        line: self.line,
                        index,
                        available: self.combinations.len(),
                    }));
                }
            }
        };

        Some(Ok(OutputRow {
            parameters,
            coordinates: self.coordinates,
            values,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.blocks.len()))
        }
    }
}

/// One long-format row: parameter values, coordinates, block values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRow<'a> {
    pub parameters: &'a [&'a str],
    pub coordinates: &'a [&'a str],
    pub values: &'a [&'a str],
}

impl OutputRow<'_> {
    /// Write the row as one CSV line
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .chain(self.coordinates)
            .chain(self.values)
            .copied()
    }
}

impl fmt::Display for OutputRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, self.parameters)?;
        f.write_str(CSV_DELIMITER)?;
        write_joined(f, self.coordinates)?;
        f.write_str(CSV_DELIMITER)?;
        write_joined(f, self.values)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, fields: &[&str]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(CSV_DELIMITER)?;
        }
        f.write_str(field)?;
    }
    Ok(())
}
