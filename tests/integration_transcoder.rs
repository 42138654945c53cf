//! Integration tests for the COMSOL transcoder public API
//!
//! Build small exports in temporary directories and check the CSV files the
//! library writes for them, through both the single-file and batch entry points.

use comsol_transcoder::{
    HeaderTable, RowExpander, StreamingTranscoder, TranscodeConfig, TranscodeError,
    transcode_batch,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const PREAMBLE: &str = "\
% Model:              mixer.mph
% Version:            COMSOL 5.4.0.225
% Date:               Mar 3 2020, 12:51
% Dimension:          2
% Nodes:              4
% Expressions:        2
% Description:        Velocity magnitude, Concentration
% Length unit:        m
";

fn write_export(dir: &Path, name: &str, descriptor: &str, data: &[&str]) -> PathBuf {
    let mut content = format!("{}{}\n", PREAMBLE, descriptor);
    for line in data {
        content.push_str(line);
        content.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Row count equals the sum of complete blocks over every data line
#[test]
fn test_row_count_matches_block_arithmetic() {
    let temp_dir = TempDir::new().unwrap();
    let data = [
        "0 0 1 2 3 4",
        "0 1 1 2 3",
        "1 0 1",
        "",
        "1 1 1 2 3 4 5 6",
    ];
    let input = write_export(
        temp_dir.path(),
        "mixer.txt",
        "% x y U (m/s) c (mol/m^3) @ t=0 @ t=1 @ t=2",
        &data,
    );

    let header = HeaderTable::parse("% x y U (m/s) c (mol/m^3) @ t=0 @ t=1 @ t=2").unwrap();
    let expander = RowExpander::new(&header);
    let expected: usize = data
        .iter()
        .map(|line| expander.row_count(line.split_whitespace().count()))
        .sum();

    let output = StreamingTranscoder::default()
        .transcode(&input, temp_dir.path())
        .unwrap();

    let content = fs::read_to_string(output).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("t,x,y,U(m/s),c(mol/m^3)"));
    assert_eq!(lines.count(), expected);
    assert_eq!(expected, 2 + 1 + 0 + 0 + 3);
}

/// Multiple parameters vary together, one value per combination
#[test]
fn test_multiple_parameters_share_combination_index() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_export(
        temp_dir.path(),
        "sweep.txt",
        "% x y U (m/s) @ t=0, p=1 @ t=5, p=2",
        &["0.5 0.25 10 20"],
    );

    let output = StreamingTranscoder::default()
        .transcode(&input, temp_dir.path())
        .unwrap();

    assert_eq!(
        fs::read_to_string(output).unwrap(),
        "t,p,x,y,U(m/s)\n0,1,0.5,0.25,10\n5,2,0.5,0.25,20\n"
    );
}

#[test]
fn test_malformed_descriptor_leaves_no_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_export(
        temp_dir.path(),
        "broken.txt",
        "% x y U @ t=1 @tbad",
        &["0 0 1 2"],
    );

    let err = StreamingTranscoder::default()
        .transcode(&input, temp_dir.path())
        .unwrap_err();

    assert!(err.is_malformed_header(), "unexpected error: {:?}", err);
    assert!(!temp_dir.path().join("parsed_broken.csv").exists());
    let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path() != input)
        .collect();
    assert!(leftovers.is_empty(), "staged files left behind: {:?}", leftovers);
}

#[tokio::test]
async fn test_batch_into_separate_output_directory() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&output_dir).unwrap();

    let inputs: Vec<PathBuf> = (0..4)
        .map(|i| {
            write_export(
                temp_dir.path(),
                &format!("run_{}.txt", i),
                "% x y U (m/s) @ t=0 @ t=1",
                &["0 0 1 2", "0 1 3 4"],
            )
        })
        .collect();

    let config = TranscodeConfig::default()
        .with_workers(3)
        .with_progress(false);
    let report = transcode_batch(&inputs, &output_dir, &config, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.total_rows(), 16);
    for (i, outcome) in report.outcomes.iter().enumerate() {
        let summary = outcome.result.as_ref().unwrap();
        assert_eq!(summary.output_path, output_dir.join(format!("parsed_run_{}.csv", i)));
        assert_eq!(summary.metadata.nodes, Some(4));
        assert_eq!(summary.combination_count, 2);
    }
}

#[tokio::test]
async fn test_batch_rejects_duplicate_input() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_export(temp_dir.path(), "twice.txt", "% x U @ t=0", &["0 1"]);
    let inputs = vec![input.clone(), input];

    let err = transcode_batch(
        &inputs,
        temp_dir.path(),
        &TranscodeConfig::default().with_progress(false),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TranscodeError::OutputConflict { .. }));
}
