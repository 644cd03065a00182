// CLI integration tests: load fixture provinces and query them through the binary.
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_exportboard");
    let mut command = Command::new(exe);
    command.env_remove("EXPORTBOARD_DATA_DIR");
    command.env("RUST_LOG", "warn");
    command
}

fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("valid json")
}

fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write csv");
    path
}

fn run_with_files(files: &[&Path], args: &[&str]) -> Output {
    let mut command = cmd();
    for file in files {
        command.arg("--file").arg(file);
    }
    command.args(args).output().expect("run exportboard")
}

const SEVILLA: &str = "Sector,2019,2020\n\
    Agricultura,\"1.000,00\",\"1.234,50\"\n\
    Industria,\"250,25\",\"3.000.000,00\"\n";

const CADIZ: &str = "Sector,2019,2020\n\
    Agricultura,\"10,00\",\"20,00\"\n\
    Industria,\"0,75\",\"1,00\"\n";

#[test]
fn summary_counts_every_province_in_data_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let provinces = [
        "almeria", "cadiz", "cordoba", "granada", "huelva", "jaen", "malaga", "sevilla",
    ];
    for province in provinces {
        write_csv(temp.path(), &format!("{province}.csv"), SEVILLA);
    }

    let output = cmd()
        .arg("--data-dir")
        .arg(temp.path())
        .arg("summary")
        .output()
        .expect("summary");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary = parse_json(&output.stdout);
    assert_eq!(summary["rows"], 8 * 2 * 2);
    assert_eq!(summary["regions"][0], "Almeria");
    assert_eq!(summary["regions"][7], "Sevilla");
    assert_eq!(summary["sectors"], serde_json::json!(["Agricultura", "Industria"]));
    assert_eq!(summary["years"], serde_json::json!(["2019", "2020"]));
}

#[test]
fn table_prints_one_json_line_per_record() {
    let temp = tempfile::tempdir().expect("tempdir");
    let sevilla = write_csv(temp.path(), "sevilla.csv", SEVILLA);
    let output = run_with_files(&[&sevilla], &["table"]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<Value> = text.lines().map(|line| parse_json(line.as_bytes())).collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["region"], "Sevilla");
    assert_eq!(lines[0]["year"], "2019");
    assert_eq!(lines[0]["sector"], "Agricultura");
    assert_eq!(lines[0]["volume"], 1000.0);
    assert_eq!(lines[3]["volume"], 3_000_000.0);
}

#[test]
fn chart_sums_selected_regions_by_year() {
    let temp = tempfile::tempdir().expect("tempdir");
    let sevilla = write_csv(temp.path(), "sevilla.csv", SEVILLA);
    let cadiz = write_csv(temp.path(), "cadiz.csv", CADIZ);
    let output = run_with_files(
        &[&sevilla, &cadiz],
        &[
            "chart",
            "--region",
            "Sevilla",
            "--region",
            "Cadiz",
            "--sector",
            "Agricultura",
        ],
    );
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    let trace = &value["figure"]["data"][0];
    assert_eq!(trace["x"], serde_json::json!(["2019", "2020"]));
    assert_eq!(trace["y"], serde_json::json!([1010.0, 1254.5]));
    assert_eq!(trace["text"][1], "Año=2020<br>Volumen=1,254.50 €");
}

#[test]
fn lookup_reports_sentence_or_placeholder() {
    let temp = tempfile::tempdir().expect("tempdir");
    let sevilla = write_csv(temp.path(), "sevilla.csv", SEVILLA);

    let found = run_with_files(
        &[&sevilla],
        &[
            "lookup",
            "--region",
            "Sevilla",
            "--year",
            "2020",
            "--sector",
            "Agricultura",
        ],
    );
    assert!(found.status.success());
    let value = parse_json(&found.stdout);
    assert_eq!(value["lookup"]["found"], true);
    assert_eq!(
        value["lookup"]["text"],
        "El volumen de exportaciones de Agricultura en Sevilla en 2020 fue de 1,234.50 €."
    );

    let missing = run_with_files(
        &[&sevilla],
        &[
            "lookup", "--region", "Sevilla", "--year", "2021", "--sector", "Agricultura",
        ],
    );
    assert!(missing.status.success());
    let value = parse_json(&missing.stdout);
    assert_eq!(value["lookup"]["found"], false);
    assert!(value["lookup"]["volume"].is_null());
    assert_eq!(
        value["lookup"]["text"],
        "No hay datos disponibles para la selección."
    );
}

#[test]
fn summary_logs_differing_year_columns_to_stderr() {
    let temp = tempfile::tempdir().expect("tempdir");
    let almeria = write_csv(
        temp.path(),
        "almeria.csv",
        "Sector,2019,2020\nPesca,\"1,0\",\"2,0\"\n",
    );
    let sevilla = write_csv(
        temp.path(),
        "sevilla.csv",
        "Sector,2020,2021,2022\nPesca,\"3,0\",\"4,0\",\"5,0\"\n",
    );
    let output = run_with_files(&[&almeria, &sevilla], &["summary"]);
    assert!(output.status.success());
    let summary = parse_json(&output.stdout);
    assert_eq!(summary["rows"], 5);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("year columns differ"), "{stderr}");
    assert!(stderr.contains("Sevilla"), "{stderr}");
}

#[test]
fn missing_province_file_exits_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = cmd()
        .arg("--data-dir")
        .arg(temp.path())
        .arg("summary")
        .output()
        .expect("summary");
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "NotFound");
    assert!(
        err["error"]["path"]
            .as_str()
            .expect("path")
            .ends_with("almeria.csv")
    );
}

#[test]
fn malformed_volume_exits_with_format_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bad = write_csv(
        temp.path(),
        "huelva.csv",
        "Sector,2019\nPesca,\"1.000,00\"\nMineria,abc\n",
    );
    let output = run_with_files(&[&bad], &["summary"]);
    assert_eq!(output.status.code(), Some(4));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Format");
    assert_eq!(err["error"]["line"], 3);
    assert!(
        err["error"]["message"]
            .as_str()
            .expect("message")
            .contains("Mineria")
    );
}

#[test]
fn unknown_flag_is_usage_error() {
    let output = cmd().args(["summary", "--bogus"]).output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}
