//! Tests for the streaming transcoder
//!
//! Exercise the complete single-file pipeline against small synthetic
//! COMSOL exports written to temporary directories.


use std::fs;
use std::path::{Path, PathBuf};

/// Standard 8-line COMSOL preamble
pub const PREAMBLE: &str = "\
% Model:              channel.mph
% Version:            COMSOL 5.4.0.225
% Date:               Mar 3 2020, 12:51
% Dimension:          2
% Nodes:              3
% Expressions:        2
% Description:        Velocity magnitude, Shear rate
% Length unit:        m
";

/// Write an export made of the standard preamble, `descriptor` and `data`
pub fn write_export(dir: &Path, name: &str, descriptor: &str, data: &[&str]) -> PathBuf {
    let mut content = String::from(PREAMBLE);
    content.push_str(descriptor);
    content.push('\n');
    for line in data {
        content.push_str(line);
        content.push('\n');
    }

    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
