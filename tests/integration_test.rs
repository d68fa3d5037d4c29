mod common;

use common::world::reference_c;
use std::fs;
use tempfile::TempDir;
use uneven_matrix_multiplication::config::{Dimensions, InputSource, RunConfig};
use uneven_matrix_multiplication::inputs;
use uneven_matrix_multiplication::matrix::Matrix;
use uneven_matrix_multiplication::output::{self, OutputOptions};
use uneven_matrix_multiplication::run_local;

#[test]
fn test_matrix_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("test_matrix.txt");

    let original = Matrix::from_vec(vec![1.5, 2.0, -3.25, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 3, 3).unwrap();

    original.save_to_file(&file_path).unwrap();
    let loaded = Matrix::load_from_file(&file_path).unwrap();

    assert_eq!(original, loaded);
}

#[test]
fn test_result_persists_and_reparses_exactly() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("uneven-test.txt");

    let (a, b) = inputs::reference();
    let options = OutputOptions {
        print: false,
        path: Some(file_path.clone()),
    };
    let c = run_local(2, a, b, &options).unwrap();

    let text = fs::read_to_string(&file_path).unwrap();
    assert_eq!(text, "14 32\n32 77\n50 122\n68 167\n86 212\n");

    let reparsed = Matrix::<i64>::load_from_file(&file_path).unwrap();
    assert_eq!(reparsed, c);
    assert_eq!(reparsed.data, reference_c());
}

#[test]
fn test_unwritable_output_does_not_fail_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let bad_path = temp_dir.path().join("missing-dir").join("c.txt");

    let (a, b) = inputs::reference();
    let options = OutputOptions {
        print: false,
        path: Some(bad_path.clone()),
    };
    let c = run_local(3, a, b, &options).unwrap();
    assert_eq!(c.data, reference_c());
    assert!(!bad_path.exists());

    let mut console = Vec::new();
    let report = output::emit(&c, &options, &mut console);
    assert!(report.written_to.is_none());
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_file_inputs_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let a_path = temp_dir.path().join("a.txt");
    let b_path = temp_dir.path().join("b.txt");
    fs::write(&a_path, "1 2 3\n4 5 6\n7 8 9\n10 11 12\n13 14 15\n").unwrap();
    fs::write(&b_path, "1 4\n2 5\n3 6\n").unwrap();

    let config_path = temp_dir.path().join("run.toml");
    fs::write(
        &config_path,
        format!(
            "participants = 4\n\n[input]\nkind = \"files\"\na = {:?}\nb = {:?}\n",
            a_path.display().to_string(),
            b_path.display().to_string()
        ),
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    assert_eq!(config.participants, 4);
    assert!(matches!(config.input, InputSource::Files { .. }));

    let (a, b) = inputs::load(&config.input, config.dimensions).unwrap();
    let c = run_local(config.participants, a, b, &OutputOptions::default()).unwrap();
    assert_eq!(c.data, reference_c());
}

#[test]
fn test_sequential_inputs_follow_dimensions() {
    let dims = Dimensions { m: 9, k: 5, n: 4 };
    let (a, b) = inputs::load(&InputSource::Sequential, dims).unwrap();
    let expected = a.multiply(&b).unwrap();
    let c = run_local(4, a, b, &OutputOptions::default()).unwrap();
    assert_eq!((c.rows, c.cols), (9, 4));
    assert_eq!(c, expected);
}

#[test]
fn test_large_matrix_file_operations() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("large_matrix.txt");

    let size = 100;
    let matrix = Matrix::from_fn(size, size, |i, j| (i * size + j) as i64);

    matrix.save_to_file(&file_path).unwrap();
    let loaded = Matrix::load_from_file(&file_path).unwrap();

    assert_eq!(matrix, loaded);
}

#[test]
fn test_error_handling() {
    let temp_dir = TempDir::new().unwrap();

    let non_existent = temp_dir.path().join("nonexistent.txt");
    assert!(Matrix::<i64>::load_from_file(&non_existent).is_err());

    let invalid_file = temp_dir.path().join("invalid.txt");
    fs::write(&invalid_file, "not a number 2\n").unwrap();
    assert!(Matrix::<i64>::load_from_file(&invalid_file).is_err());

    let missing = InputSource::Files {
        a: non_existent.clone(),
        b: non_existent,
    };
    assert!(inputs::load(&missing, Dimensions::default()).is_err());
}
