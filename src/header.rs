//! COMSOL descriptor line parsing and preamble metadata extraction.
//!
//! The descriptor line (line 9 of an export) encodes the column layout of
//! every data line: coordinate axes, physical variables with their units, and
//! the parameter combination each group of columns belongs to. It is first
//! normalized so that a whitespace split yields one token per entity, then
//! classified into a [`HeaderTable`].

use crate::constants::{
    COMMENT_MARKER, CSV_DELIMITER, DESCRIPTOR_REWRITES, PARAMETER_MARKER,
    PARAMETER_PAIR_SEPARATOR, PARAMETER_VALUE_SEPARATOR,
};
use crate::error::{Result, TranscodeError};
use crate::models::ExportMetadata;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Rewrite the raw descriptor line so that units and parameter blocks stay
/// attached to the token they belong to.
pub fn normalize_descriptor(raw: &str) -> String {
    DESCRIPTOR_REWRITES
        .iter()
        .fold(raw.to_string(), |line, (from, to)| line.replace(from, to))
}

/// Parameter name to ordered values, in first-seen name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterTable {
    values: IndexMap<String, Vec<String>>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value to `name`, creating the list on first sight
    pub fn push(&mut self, name: &str, value: &str) {
        self.values
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values every name holds, or `None` when the lists differ
    pub fn value_count(&self) -> Option<usize> {
        let mut counts = self.values.values().map(Vec::len);
        let first = counts.next().unwrap_or(0);
        counts.all(|count| count == first).then_some(first)
    }
}

/// Classified descriptor line. Built once per file and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTable {
    coordinates: Vec<String>,
    variables: Vec<String>,
    parameters: ParameterTable,
}

impl HeaderTable {
    /// Normalize, tokenize and classify a raw descriptor line
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize_descriptor(raw);
        Self::from_tokens(normalized.split_whitespace())
    }

    /// Classify already-normalized tokens and check the result is usable
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let (coordinates, variables, parameters) = classify_tokens(tokens)?;

        if variables.is_empty() {
            return Err(TranscodeError::MalformedHeader {
                path: Default::default(),
                reason: "no variable headings found".to_string(),
            });
        }

        if parameters.value_count().is_none() {
            let counts: Vec<String> = parameters
                .iter()
                .map(|(name, values)| format!("{}={}", name, values.len()))
                .collect();
            return Err(TranscodeError::MalformedHeader {
                path: Default::default(),
                reason: format!("parameters hold unequal value counts ({})", counts.join(", ")),
            });
        }

        debug!(
            "Classified descriptor: {} coordinates, {} variables, {} parameters",
            coordinates.len(),
            variables.len(),
            parameters.len()
        );

        Ok(Self {
            coordinates,
            variables,
            parameters,
        })
    }

    pub fn coordinates(&self) -> &[String] {
        &self.coordinates
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    /// Tokens per parameter-combination block
    pub fn block_size(&self) -> usize {
        self.variables.len()
    }

    /// Number of parameter combinations the header declares (0 without parameters)
    pub fn combination_count(&self) -> usize {
        self.parameters.value_count().unwrap_or(0)
    }

    /// Parameter values of combination `index`, in parameter name order.
    ///
    /// Block `i` of a data line always reads value `i` of every list.
    pub fn combination(&self, index: usize) -> Option<Vec<&str>> {
        self.parameters
            .iter()
            .map(|(_, values)| values.get(index).map(String::as_str))
            .collect()
    }

    /// Output column header: parameters, then coordinates, then variables
    pub fn column_header(&self) -> String {
        let parameters: Vec<&str> = self.parameters.names().collect();
        format!(
            "{}{delim}{}{delim}{}",
            parameters.join(CSV_DELIMITER),
            self.coordinates.join(CSV_DELIMITER),
            self.variables.join(CSV_DELIMITER),
            delim = CSV_DELIMITER
        )
    }
}

/// Partition normalized descriptor tokens into coordinate headings, variable
/// headings and the parameter table.
pub fn classify_tokens<'a>(
    tokens: impl IntoIterator<Item = &'a str>,
) -> Result<(Vec<String>, Vec<String>, ParameterTable)> {
    let mut coordinates: Vec<String> = Vec::new();
    let mut variables: Vec<String> = Vec::new();
    let mut parameters = ParameterTable::new();

    for token in tokens {
        if token == COMMENT_MARKER {
            continue;
        }

        if token.chars().count() == 1 {
            if !coordinates.iter().any(|c| c == token) {
                coordinates.push(token.to_string());
            }
        } else if let Some(block) = token.strip_prefix(PARAMETER_MARKER) {
            for pair in block.split(PARAMETER_PAIR_SEPARATOR) {
                let mut parts = pair.split(PARAMETER_VALUE_SEPARATOR);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(value), None) => parameters.push(name, value),
                    _ => {
                        return Err(TranscodeError::MalformedParameter {
                            token: token.to_string(),
                        });
                    }
                }
            }
        } else if !variables.iter().any(|v| v == token) {
            variables.push(token.to_string());
        }
    }

    Ok((coordinates, variables, parameters))
}

/// Extract export metadata from the preamble lines (best effort, never fails)
pub fn parse_preamble(lines: &[String]) -> ExportMetadata {
    let mut builder = ExportMetadataBuilder::default();
    for line in lines {
        builder.parse_line(line);
    }
    builder.build()
}

/// Builder for preamble metadata extraction
#[derive(Default)]
struct ExportMetadataBuilder {
    metadata: ExportMetadata,
}

impl ExportMetadataBuilder {
    fn parse_line(&mut self, line: &str) {
        // Preamble lines look like "% Key:   value"
        let Some(body) = line.trim().strip_prefix(COMMENT_MARKER) else {
            return;
        };
        let Some((key, value)) = body.split_once(':') else {
            return;
        };

        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();

        match key.as_str() {
            "model" => self.metadata.model = Some(value),
            "version" => self.metadata.version = Some(value),
            "date" => self.metadata.date = Some(value),
            "dimension" => self.metadata.dimension = parse_count(&key, &value),
            "nodes" => self.metadata.nodes = parse_count(&key, &value),
            "expressions" => self.metadata.expressions = parse_count(&key, &value),
            "description" => self.metadata.description = Some(value),
            "length unit" => self.metadata.length_unit = Some(value),
            _ => {}
        }
    }

    fn build(self) -> ExportMetadata {
        self.metadata
    }
}

fn parse_count(key: &str, value: &str) -> Option<usize> {
    match value.parse::<usize>() {
        Ok(count) => Some(count),
        Err(_) => {
            warn!("Could not parse preamble {} value: {}", key, value);
            None
        }
    }
}

/// Compare the declared preamble counts against what the file contained
pub fn check_declared_counts(
    path: &Path,
    metadata: &ExportMetadata,
    variable_count: usize,
    data_lines: usize,
) {
    if let Some(nodes) = metadata.nodes {
        if nodes != data_lines {
            warn!(
                "{}: preamble declares {} nodes but {} data lines were read",
                path.display(),
                nodes,
                data_lines
            );
        }
    }

    if let Some(expressions) = metadata.expressions {
        if expressions != variable_count {
            debug!(
                "{}: preamble declares {} expressions, descriptor has {} distinct variables",
                path.display(),
                expressions,
                variable_count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_descriptor() {
        let raw = "% x y U (m/s) @ t=1, p=2 sr (1/s) @ t=1, p=2";
        assert_eq!(
            normalize_descriptor(raw),
            "% x y U(m/s) @t=1,p=2 sr(1/s) @t=1,p=2"
        );
    }

    #[test]
    fn test_normalize_leaves_other_whitespace() {
        let raw = "%  x\t y   U";
        assert_eq!(normalize_descriptor(raw), raw);
    }

    #[test]
    fn test_classify_basic_tokens() {
        let tokens = ["x", "y", "U", "sr", "@t=1", "@t=2"];
        let (coordinates, variables, parameters) = classify_tokens(tokens).unwrap();

        assert_eq!(coordinates, vec!["x", "y"]);
        assert_eq!(variables, vec!["U", "sr"]);
        assert_eq!(parameters.values("t").unwrap(), &["1", "2"]);
    }

    #[test]
    fn test_classify_skips_comment_glyph_and_deduplicates() {
        let tokens = ["%", "x", "y", "U", "@t=0", "U", "@t=1", "x"];
        let (coordinates, variables, parameters) = classify_tokens(tokens).unwrap();

        assert_eq!(coordinates, vec!["x", "y"]);
        assert_eq!(variables, vec!["U"]);
        assert_eq!(parameters.values("t").unwrap(), &["0", "1"]);
    }

    #[test]
    fn test_classify_multiple_pairs_keep_insertion_order() {
        let tokens = ["x", "U", "@t=0,p=10", "@t=1,p=20"];
        let (_, _, parameters) = classify_tokens(tokens).unwrap();

        let names: Vec<&str> = parameters.names().collect();
        assert_eq!(names, vec!["t", "p"]);
        assert_eq!(parameters.values("p").unwrap(), &["10", "20"]);
    }

    #[test]
    fn test_classify_rejects_pair_without_separator() {
        let err = classify_tokens(["x", "U", "@tbad"]).unwrap_err();
        match err {
            TranscodeError::MalformedParameter { token } => assert_eq!(token, "@tbad"),
            other => panic!("Expected MalformedParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_rejects_pair_with_extra_separator() {
        for token in ["@t=1=2", "@t=0,p=1=2", "@=="] {
            let err = classify_tokens(["x", "U", token]).unwrap_err();
            match err {
                TranscodeError::MalformedParameter { token: reported } => {
                    assert_eq!(reported, token)
                }
                other => panic!("Expected MalformedParameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_column_header() {
        let header = HeaderTable::from_tokens(["x", "y", "U", "sr", "@t=1", "@t=2"]).unwrap();
        assert_eq!(header.column_header(), "t,x,y,U,sr");
        assert_eq!(header.combination_count(), 2);
    }

    #[test]
    fn test_parse_comsol_descriptor_with_units() {
        let raw = "% x                       y                        spf.U (m/s) @ t=0         spf.sr (1/s) @ t=0        spf.U (m/s) @ t=0.1       spf.sr (1/s) @ t=0.1";
        let header = HeaderTable::parse(raw).unwrap();

        assert_eq!(header.coordinates(), &["x", "y"]);
        assert_eq!(header.variables(), &["spf.U(m/s)", "spf.sr(1/s)"]);
        assert_eq!(header.parameters().values("t").unwrap(), &["0", "0", "0.1", "0.1"]);
        assert_eq!(header.combination_count(), 4);
        assert_eq!(header.combination(0).unwrap(), vec!["0"]);
        assert_eq!(header.combination(1).unwrap(), vec!["0"]);
        assert_eq!(header.combination(2).unwrap(), vec!["0.1"]);
        assert_eq!(header.combination(3).unwrap(), vec!["0.1"]);
        assert!(header.combination(4).is_none());
    }

    #[test]
    fn test_repeated_values_use_plain_block_index() {
        let header = HeaderTable::from_tokens(["x", "Um", "sr", "@t=5", "@t=5"]).unwrap();
        assert_eq!(header.combination_count(), 2);
        assert_eq!(header.combination(0).unwrap(), vec!["5"]);
        assert_eq!(header.combination(1).unwrap(), vec!["5"]);
    }

    #[test]
    fn test_unequal_parameter_counts_rejected() {
        let err = HeaderTable::from_tokens(["x", "U", "@t=0,p=1", "@t=1"]).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn test_missing_variables_rejected() {
        let err = HeaderTable::from_tokens(["x", "y", "@t=0"]).unwrap_err();
        assert!(matches!(err, TranscodeError::MalformedHeader { .. }));
    }

    #[test]
    fn test_header_without_parameters() {
        let header = HeaderTable::from_tokens(["x", "y", "U"]).unwrap();
        assert_eq!(header.column_header(), ",x,y,U");
        assert_eq!(header.combination_count(), 0);
        assert_eq!(header.combination(5).unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn test_parse_preamble() {
        let lines: Vec<String> = [
            "% Model:              channel.mph",
            "% Version:            COMSOL 5.4.0.225",
            "% Date:               Mar 3 2020, 12:51",
            "% Dimension:          2",
            "% Nodes:              1520",
            "% Expressions:        4",
            "% Description:        Velocity magnitude, Shear rate",
            "% Length unit:        m",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let metadata = parse_preamble(&lines);
        assert_eq!(metadata.model.as_deref(), Some("channel.mph"));
        assert_eq!(metadata.date.as_deref(), Some("Mar 3 2020, 12:51"));
        assert_eq!(metadata.dimension, Some(2));
        assert_eq!(metadata.nodes, Some(1520));
        assert_eq!(metadata.expressions, Some(4));
        assert_eq!(metadata.length_unit.as_deref(), Some("m"));
    }

    #[test]
    fn test_parse_preamble_tolerates_noise() {
        let lines = vec![
            "garbage".to_string(),
            "% Nodes: many".to_string(),
            "% Unknown key: 5".to_string(),
        ];
        let metadata = parse_preamble(&lines);
        assert_eq!(metadata, ExportMetadata::default());
    }
}
