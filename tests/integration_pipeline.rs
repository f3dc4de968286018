//! End-to-end dedupe runs over real image files.
//!
//! Covers:
//! - Byte-identical copies collapse to the earliest file
//! - Distinct images are all kept
//! - The HTML report lists each duplicate set
//! - Unreadable files are kept or dropped per `skip_invalid`
//! - Empty input is reported, not silently accepted

use assert_fs::prelude::*;
use assert_fs::TempDir;
use image::{Rgb, RgbImage};
use media_sieve::core::hasher::HashAlgorithmKind;
use media_sieve::core::pipeline::{FailureStage, Pipeline};
use media_sieve::core::reporter::HtmlReportSink;
use media_sieve::core::sink::{CopySink, GroupSink};
use media_sieve::error::{MediaSieveError, PipelineError};
use predicates::prelude::*;
use std::path::Path;

fn gradient(path: &Path) {
    RgbImage::from_fn(128, 128, |x, _| Rgb([(x * 2) as u8, (x * 2) as u8, (x * 2) as u8]))
        .save(path)
        .unwrap();
}

fn checkerboard(path: &Path) {
    RgbImage::from_fn(128, 128, |x, y| {
        if (x / 16 + y / 16) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
    .save(path)
    .unwrap();
}

fn pipeline(input: &Path, skip_invalid: bool) -> Pipeline {
    Pipeline::builder()
        .paths(vec![input.to_path_buf()])
        .algorithm(HashAlgorithmKind::Perceptual)
        .threshold(0)
        .workers(Some(2))
        .skip_invalid(skip_invalid)
        .build()
}

#[test]
fn identical_copies_collapse_to_one() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("input");
    input.create_dir_all().unwrap();

    gradient(input.child("a_original.png").path());
    std::fs::copy(input.child("a_original.png").path(), input.child("b_copy.png").path()).unwrap();
    checkerboard(input.child("c_other.png").path());

    let output = temp.child("clean");
    let report_dir = temp.child("report");
    let mut sinks: Vec<Box<dyn GroupSink>> = vec![
        Box::new(CopySink::new(output.path())),
        Box::new(HtmlReportSink::new(report_dir.path())),
    ];

    let report = pipeline(input.path(), false).run(&mut sinks).unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.kept(), 2);
    assert_eq!(report.removed(), 1);
    assert!(report.failures.is_empty());

    let set = report.duplicate_sets().next().unwrap();
    assert!(set.kept.path.ends_with("a_original.png"));
    assert!(set.removed[0].path.ends_with("b_copy.png"));

    output.child("a_original.png").assert(predicate::path::exists());
    output.child("c_other.png").assert(predicate::path::exists());
    output.child("b_copy.png").assert(predicate::path::missing());

    report_dir
        .child("report.html")
        .assert(predicate::str::contains("(KEPT)").and(predicate::str::contains("(REMOVED)")));
    report_dir.child("group_1_kept_a_original.png").assert(predicate::path::exists());
    report_dir.child("group_1_removed_b_copy.png").assert(predicate::path::exists());

    // Sources are untouched
    input.child("b_copy.png").assert(predicate::path::exists());
}

#[test]
fn distinct_images_are_all_kept() {
    let temp = TempDir::new().unwrap();
    gradient(temp.child("gradient.png").path());
    checkerboard(temp.child("board.png").path());

    let report_dir = temp.child("report");
    let mut sinks: Vec<Box<dyn GroupSink>> = vec![Box::new(HtmlReportSink::new(report_dir.path()))];
    let report = pipeline(temp.path(), false).run(&mut sinks).unwrap();

    assert_eq!(report.kept(), 2);
    assert_eq!(report.removed(), 0);
    report_dir
        .child("report.html")
        .assert(predicate::str::contains("No duplicates found."));
}

#[test]
fn unreadable_file_is_kept_by_default() {
    let temp = TempDir::new().unwrap();
    gradient(temp.child("good.png").path());
    temp.child("corrupt.jpg").write_str("this is not a valid image file").unwrap();

    let output = temp.child("clean");
    let mut sinks: Vec<Box<dyn GroupSink>> = vec![Box::new(CopySink::new(output.path()))];
    let report = pipeline(temp.path(), false).run(&mut sinks).unwrap();

    assert_eq!(report.kept(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::Hash);
    assert!(!report.failures[0].excluded);
    output.child("corrupt.jpg").assert(predicate::path::exists());
}

#[test]
fn unreadable_file_is_dropped_with_skip_invalid() {
    let temp = TempDir::new().unwrap();
    gradient(temp.child("good.png").path());
    temp.child("corrupt.jpg").write_str("this is not a valid image file").unwrap();

    let output = temp.child("clean");
    let mut sinks: Vec<Box<dyn GroupSink>> = vec![Box::new(CopySink::new(output.path()))];
    let report = pipeline(temp.path(), true).run(&mut sinks).unwrap();

    assert_eq!(report.kept(), 1);
    assert_eq!(report.excluded().count(), 1);
    assert_eq!(report.kept() + report.removed() + report.excluded().count(), report.processed);
    output.child("corrupt.jpg").assert(predicate::path::missing());
}

#[test]
fn empty_directory_is_no_input() {
    let temp = TempDir::new().unwrap();
    temp.child("notes.txt").write_str("not media").unwrap();

    let result = pipeline(temp.path(), false).run(&mut []);

    assert!(matches!(
        result,
        Err(MediaSieveError::Pipeline(PipelineError::NoInput { .. }))
    ));
}

#[test]
fn nonexistent_directory_is_no_input() {
    let result = pipeline(Path::new("/nonexistent/path/for/media-sieve"), false).run(&mut []);
    assert!(result.is_err());
}
