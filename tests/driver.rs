use std::fs;

use acsmatmult::bench::{run_experiment, Experiment, FIELD_WIDTH};
use acsmatmult::{Backend, BenchmarkConfig, MatmulError};

fn config(from: u32, to: u32, repeats: u32) -> BenchmarkConfig {
    BenchmarkConfig {
        from,
        to,
        repeats,
        ..Default::default()
    }
}

fn fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).filter(|f| !f.is_empty()).collect()
}

#[test]
fn console_and_file_receive_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mat_simd.csv");
    let mut console = Vec::new();

    run_experiment(Experiment::Matrix(Backend::Vectorized), &config(1, 5, 2), &path, &mut console).unwrap();

    assert_eq!(fs::read(&path).unwrap(), console);
}

#[test]
fn header_and_rows_have_fixed_width_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mat.csv");

    run_experiment(Experiment::Matrix(Backend::Baseline), &config(2, 4, 3), &path, std::io::sink()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        fields(lines[0]),
        [
            "Experiment",
            "Matrix size",
            "Construct (s)",
            "Randomize (s)",
            "Float 0",
            "Float 1",
            "Float 2",
            "Double 0",
            "Double 1",
            "Double 2"
        ]
    );
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert_eq!(line.len(), 10 * FIELD_WIDTH);
    }
    assert_eq!(fields(lines[1])[..2], ["2", "4"]);
    assert_eq!(fields(lines[2])[..2], ["3", "8"]);
}

#[test]
fn parallel_experiment_writes_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mat_omp_t3.csv");

    run_experiment(
        Experiment::Matrix(Backend::Parallel { threads: 3 }),
        &config(1, 6, 1),
        &path,
        std::io::sink(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 6);
}

#[test]
fn offloaded_experiment_completes_with_or_without_device() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mat_ocl.csv");

    run_experiment(Experiment::Matrix(Backend::Offloaded), &config(1, 3, 2), &path, std::io::sink()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in &lines[1..] {
        let row = fields(line);
        assert_eq!(row.len(), 8);
        assert!(row[4..].iter().all(|f| *f == "n/a" || f.parse::<f64>().is_ok()));
    }
}

#[test]
fn unwritable_output_fails_before_any_trial() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("vec.csv");
    let mut console = Vec::new();

    let err = run_experiment(Experiment::Vector, &config(1, 4, 1), &path, &mut console).unwrap_err();

    assert!(matches!(err, MatmulError::OutputUnavailable { .. }));
    assert!(console.is_empty());
}
