//! Integration tests for the compile pipeline.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use pairc_core::{
    compile_tree, parse_csv, run_archive, CellValue, Config, Error, RunReport, Warning,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Helper to write a file, creating parent directories.
fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Helper to build a zip archive from (name, content) entries.
fn build_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn zip_names(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn part_numbers(path: &Path) -> Vec<CellValue> {
    parse_csv(path)
        .unwrap()
        .column_values("PART_NO")
        .unwrap()
        .into_iter()
        .cloned()
        .collect()
}

fn ints(values: &[i64]) -> Vec<CellValue> {
    values.iter().map(|v| CellValue::Integer(*v)).collect()
}

fn standard_entries(prefix: &str) -> Vec<(String, String)> {
    vec![
        (format!("{prefix}A/X_e_detail.csv"), "PART_NO,Name\n3,c\n1,a\n".to_string()),
        (format!("{prefix}A/X_e_sup.csv"), "PART_NO,Name\n2,b\n5,e\n4,d\n".to_string()),
        (format!("{prefix}B/Y_e_detail.csv"), "PART_NO\n9\n".to_string()),
    ]
}

// =============================================================================
// Tree scenarios
// =============================================================================

#[test]
fn test_scenario_pair_is_merged_and_sorted() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "A/X_e_detail.csv", "PART_NO,Name\n3,c\n1,a\n");
    write(input.path(), "A/X_e_sup.csv", "PART_NO,Name\n2,b\n5,e\n4,d\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    let compiled = input.path().join("A/X_COMPILED.csv");
    assert_eq!(part_numbers(&compiled), ints(&[3, 1, 2, 5, 4]));

    let master = output.path().join("A/A_compiled_file.csv");
    assert_eq!(part_numbers(&master), ints(&[1, 2, 3, 4, 5]));

    let row = report.summary.find("A").unwrap();
    assert_eq!((row.pairs_found, row.master_rows), (1, 5));
    assert_eq!(report.total_pairs, 1);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_scenario_unpaired_directory() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "B/Y_e_detail.csv", "PART_NO\n1\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    let row = report.summary.find("B").unwrap();
    assert_eq!((row.pairs_found, row.master_rows), (0, 0));
    assert!(!output.path().join("B").exists());
    assert!(report.masters.is_empty());
    assert_eq!(report.summary.directories_with_pairs(), 0);
}

#[test]
fn test_scenario_malformed_pair_is_skipped() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "A/Good_e_detail.csv", "PART_NO\n2\n");
    write(input.path(), "A/Good_e_sup.csv", "PART_NO\n1\n");
    write(input.path(), "A/Bad_e_detail.csv", "PART_NO\n7\n");
    write(input.path(), "A/Bad_e_sup.csv", "PART_NO,Other\n1,2,3,4\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        &report.warnings[0],
        Warning::PairSkipped { directory, base, .. } if directory == "A" && base == "Bad"
    ));

    let master = output.path().join("A/A_compiled_file.csv");
    assert_eq!(part_numbers(&master), ints(&[1, 2]));

    let row = report.summary.find("A").unwrap();
    assert_eq!((row.pairs_found, row.master_rows), (2, 2));
}

#[test]
fn test_all_pairs_malformed_means_no_master() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "A/X_e_detail.csv", "");
    write(input.path(), "A/X_e_sup.csv", "PART_NO\n1\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    assert!(!output.path().join("A").exists());
    let row = report.summary.find("A").unwrap();
    assert_eq!((row.pairs_found, row.master_rows), (1, 0));
}

#[test]
fn test_missing_sort_key_is_warning() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "C/X_e_detail.csv", "ID\n3\n");
    write(input.path(), "C/X_e_sup.csv", "ID\n1\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    assert!(matches!(&report.warnings[0], Warning::MissingSortKey { directory, .. } if directory == "C"));
    let master = parse_csv(output.path().join("C/C_compiled_file.csv")).unwrap();
    assert_eq!(master.row_count(), 2);
    assert_eq!(master.rows[0].cells[0], CellValue::Integer(3));
}

#[test]
fn test_non_numeric_part_numbers_sort_last() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "D/X_e_detail.csv", "PART_NO,Name\nn/a,z\n10,w\n");
    write(input.path(), "D/X_e_sup.csv", "PART_NO,Name\n,x\n2,y\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    assert!(matches!(
        &report.warnings[0],
        Warning::UnsortableValues { count: 2, .. }
    ));
    let values = part_numbers(&output.path().join("D/D_compiled_file.csv"));
    assert_eq!(
        values,
        vec![
            CellValue::Integer(2),
            CellValue::Integer(10),
            CellValue::String("n/a".to_string()),
            CellValue::Empty,
        ]
    );
}

#[test]
fn test_master_rows_equal_sum_of_pairs_across_nested_dirs() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "r/one/P_e_detail.csv", "PART_NO\n1\n2\n");
    write(input.path(), "r/one/P_e_sup.csv", "PART_NO\n3\n");
    write(input.path(), "r/one/Q_e_detail.csv", "PART_NO,Extra\n4,x\n");
    write(input.path(), "r/one/Q_e_sup.csv", "Extra\ny\n");
    write(input.path(), "r/one/two/three/Z_e_detail.csv", "PART_NO\n5\n");
    write(input.path(), "r/one/two/three/Z_e_sup.csv", "PART_NO\n6\n7\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    assert_eq!(report.summary.find("one").unwrap().master_rows, 5);
    assert_eq!(report.summary.find("three").unwrap().master_rows, 3);
    assert_eq!(report.summary.total_master_rows(), 8);
    assert_eq!(report.summary.directories_with_pairs(), 2);
}

#[test]
fn test_directory_name_collision_gets_suffix() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "a/Same/X_e_detail.csv", "PART_NO\n1\n");
    write(input.path(), "a/Same/X_e_sup.csv", "PART_NO\n2\n");
    write(input.path(), "b/Same/X_e_detail.csv", "PART_NO\n3\n");
    write(input.path(), "b/Same/X_e_sup.csv", "PART_NO\n4\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    assert!(output.path().join("Same/Same_compiled_file.csv").exists());
    assert!(output.path().join("Same_2/Same_2_compiled_file.csv").exists());
    assert!(matches!(&report.warnings[0], Warning::NameCollision { .. }));
}

#[test]
fn test_outputs_have_bom() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "A/X_e_detail.csv", "PART_NO\n1\n");
    write(input.path(), "A/X_e_sup.csv", "PART_NO\n2\n");

    compile_tree(input.path(), output.path(), &Config::default()).unwrap();

    for path in [
        input.path().join("A/X_COMPILED.csv"),
        output.path().join("A/A_compiled_file.csv"),
    ] {
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    }
}

#[test]
fn test_custom_config() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "A/X-d.txt", "ID\n2\n");
    write(input.path(), "A/X-s.txt", "ID\n1\n");

    let mut config = Config::default();
    config.pairing.detail_suffix = "-d".to_string();
    config.pairing.supplement_suffix = "-s".to_string();
    config.pairing.extension = "txt".to_string();
    config.sort_column = "ID".to_string();
    config.write_bom = false;

    let report = compile_tree(input.path(), output.path(), &config).unwrap();

    assert!(report.warnings.is_empty());
    assert!(input.path().join("A/X_COMPILED.txt").exists());
    assert_eq!(report.masters, vec![Path::new("A").join("A_compiled_file.txt")]);
    assert!(!output.path().join("A/A_compiled_file.csv").exists());
    let bytes = fs::read(output.path().join("A/A_compiled_file.txt")).unwrap();
    assert_eq!(bytes, b"ID\n1\n2\n");
}

#[test]
fn test_cell_whitespace_survives_compilation() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "A/X_e_detail.csv", "PART_NO,Name\n2,\"  padded  \"\n");
    write(input.path(), "A/X_e_sup.csv", "PART_NO,Name\n 1,\" lead\"\n");

    let report = compile_tree(input.path(), output.path(), &Config::default()).unwrap();
    assert!(report.warnings.is_empty());

    let bytes = fs::read(output.path().join("A/A_compiled_file.csv")).unwrap();
    assert_eq!(&bytes[3..], b"PART_NO,Name\n 1, lead\n2,  padded  \n");

    let master = parse_csv(output.path().join("A/A_compiled_file.csv")).unwrap();
    assert_eq!(
        master.column_values("Name").unwrap(),
        vec![
            &CellValue::String(" lead".to_string()),
            &CellValue::String("  padded  ".to_string())
        ]
    );
}

// =============================================================================
// Archive runs
// =============================================================================

fn run_with_entries(entries: &[(String, String)]) -> (RunReport, Vec<String>, TempDir) {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("upload.zip");
    let output = temp.path().join("result.zip");
    let refs: Vec<(&str, &str)> = entries
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    build_zip(&input, &refs);

    let report = run_archive(&input, &output, &Config::default()).unwrap();
    let names = zip_names(&output);
    (report, names, temp)
}

#[test]
fn test_archive_run_packages_masters() {
    let (report, names, temp) = run_with_entries(&standard_entries(""));

    assert_eq!(names, vec!["A/A_compiled_file.csv"]);
    assert_eq!(report.masters, vec![Path::new("A").join("A_compiled_file.csv")]);

    let extracted = temp.path().join("check");
    pairc_core::extract_archive(temp.path().join("result.zip"), &extracted).unwrap();
    assert_eq!(
        part_numbers(&extracted.join("A/A_compiled_file.csv")),
        ints(&[1, 2, 3, 4, 5])
    );
}

#[test]
fn test_wrapper_directory_gives_identical_results() {
    let (plain, plain_names, _a) = run_with_entries(&standard_entries(""));
    let (wrapped, wrapped_names, _b) = run_with_entries(&standard_entries("export_2024/"));

    assert_eq!(plain_names, wrapped_names);
    assert_eq!(plain.summary, wrapped.summary);
    assert_eq!(plain.total_pairs, wrapped.total_pairs);
}

#[test]
fn test_rerun_on_output_is_noop() {
    let temp = TempDir::new().unwrap();
    let first_in = temp.path().join("upload.zip");
    let first_out = temp.path().join("first.zip");
    let second_out = temp.path().join("second.zip");
    let entries = standard_entries("");
    let refs: Vec<(&str, &str)> = entries
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    build_zip(&first_in, &refs);

    run_archive(&first_in, &first_out, &Config::default()).unwrap();
    let report = run_archive(&first_out, &second_out, &Config::default()).unwrap();

    assert_eq!(report.total_pairs, 0);
    assert!(report.summary.rows.is_empty());
    assert!(zip_names(&second_out).is_empty());
}

#[test]
fn test_bad_archive_aborts_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("broken.zip");
    let output = temp.path().join("result.zip");
    fs::write(&input, b"definitely not a zip").unwrap();

    let err = run_archive(&input, &output, &Config::default()).unwrap_err();

    assert!(matches!(err, Error::Extraction { .. }));
    assert!(!output.exists());
}

#[test]
fn test_archive_entry_escaping_destination_aborts() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("upload.zip");
    let output = temp.path().join("result.zip");
    build_zip(
        &input,
        &[
            ("A/X_e_detail.csv", "PART_NO\n1\n"),
            ("../../escaped_e_detail.csv", "PART_NO\n2\n"),
            ("A/X_e_sup.csv", "PART_NO\n3\n"),
        ],
    );

    let err = run_archive(&input, &output, &Config::default()).unwrap_err();

    assert!(matches!(err, Error::Extraction { .. }));
    assert!(!output.exists());
    assert!(!temp.path().join("escaped_e_detail.csv").exists());
    assert!(!std::env::temp_dir().join("escaped_e_detail.csv").exists());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}
