use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SALES_CSV: &str = "Region,Sales,Date\nEast,10,2025-01-05\nEast,5,2025-02-10\nWest,7,2025-01-20\n";

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sheetlens").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn load_sales(&self) -> PathBuf {
        let path = self.write("sales.csv", SALES_CSV);
        self.cmd().arg("load").arg(&path).assert().success();
        path
    }

    fn exports(&self) -> PathBuf {
        self.home.path().join("Documents").join("sheetlens").join("exports")
    }
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn load_reports_shape_and_records_recent() {
    let env = Env::new();
    let path = env.write("sales.csv", SALES_CSV);
    env.cmd()
        .args(["load", path_str(&path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 3 rows x 3 columns"));

    env.cmd()
        .args(["recent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sales.csv"));
}

#[test]
fn load_missing_file_fails() {
    let env = Env::new();
    env.cmd()
        .args(["load", "/definitely/not/here.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: File not found"));
}

#[test]
fn chart_sums_by_category() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["chart", "sales.csv", "-x", "Region", "-y", "Sales"])
        .assert()
        .success()
        .stdout(predicate::str::contains("East").and(predicate::str::contains("15")))
        .stdout(predicate::str::contains("Total").and(predicate::str::contains("22")))
        .stdout(predicate::str::contains("Suggested: Pie chart"));
}

#[test]
fn chart_without_axes_asks_for_selection() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["chart", "sales.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Select both --category and --value"));
}

#[test]
fn chart_reads_a_file_path_directly() {
    let env = Env::new();
    let path = env.write("direct.csv", SALES_CSV);
    env.cmd()
        .args(["chart", path_str(&path), "-x", "Region", "-y", "Sales", "--top", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing the first 1 of 2 categories."));
}

#[test]
fn unknown_column_is_rejected() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["chart", "sales.csv", "-x", "Nope", "-y", "Sales"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown column: Nope"));
}

#[test]
fn unknown_dataset_is_rejected() {
    let env = Env::new();
    env.cmd()
        .args(["columns", "nothing-stored"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown dataset: nothing-stored"));
}

#[test]
fn columns_lists_kinds() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["columns", "sales.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sales").and(predicate::str::contains("number")));
}

#[test]
fn view_filters_and_pages() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["view", "sales.csv", "--search", "west"])
        .assert()
        .success()
        .stdout(predicate::str::contains("West"))
        .stdout(predicate::str::contains("Page 1 of 1"))
        .stdout(predicate::str::contains("of 1, 3 total"));

    env.cmd()
        .args(["view", "sales.csv", "--per-page", "1", "--page", "2", "--sort", "Sales"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 2 of 3"))
        .stdout(predicate::str::contains("7"));
}

#[test]
fn view_date_range_filter() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["view", "sales.csv", "--from", "2025-01-01", "--to", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("of 2, 3 total"));
}

#[test]
fn view_reports_when_nothing_matches() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["view", "sales.csv", "--min", "100", "-y", "Sales"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records match"));
}

#[test]
fn insights_show_statistics_and_recommendation() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["insights", "sales.csv", "-x", "Region", "-y", "Sales"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top category:  East"))
        .stdout(predicate::str::contains("Max value:     10"))
        .stdout(predicate::str::contains("Pie Chart"));
}

#[test]
fn insights_without_axes_show_placeholder() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["insights", "sales.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Upload data and select X/Y axes"))
        .stdout(predicate::str::contains("N/A"));
}

#[test]
fn export_csv_quotes_every_field() {
    let env = Env::new();
    env.load_sales();
    let out = env.home.path().join("out.csv");
    env.cmd()
        .args(["export", "sales.csv", "--search", "east", "--output", path_str(&out)])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 records)"));
    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        "\"Region\",\"Sales\",\"Date\"\n\"East\",\"10\",\"2025-01-05\"\n\"East\",\"5\",\"2025-02-10\"\n"
    );
}

#[test]
fn export_defaults_into_data_dir() {
    let env = Env::new();
    env.load_sales();
    env.cmd().args(["export", "sales.csv"]).assert().success();
    let files: Vec<_> = std::fs::read_dir(env.exports()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[cfg(feature = "pdf")]
#[test]
fn export_summary_pdf() {
    let env = Env::new();
    env.load_sales();
    let out = env.home.path().join("summary.pdf");
    env.cmd()
        .args([
            "export", "sales.csv", "-x", "Region", "-y", "Sales", "--format", "summary-pdf",
            "--output", path_str(&out),
        ])
        .assert()
        .success();
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
}

#[test]
fn templates_supply_defaults_and_flags_override() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["template", "save", "by-region", "-x", "Region", "-y", "Sales", "--chart-type", "pie"])
        .assert()
        .success();

    env.cmd()
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("by-region").and(predicate::str::contains("Pie chart")));

    env.cmd()
        .args(["chart", "sales.csv", "--template", "by-region"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sales by Region"))
        .stdout(predicate::str::contains("Suggested").not());

    env.cmd()
        .args(["chart", "sales.csv", "--template", "by-region", "-x", "Bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown column: Bogus"));

    env.cmd()
        .args(["template", "show", "by-region"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"chart_type\": \"pie\""));
}

#[test]
fn unknown_template_is_rejected() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["chart", "sales.csv", "--template", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown template: missing"));
}

#[test]
fn recent_pin_and_remove() {
    let env = Env::new();
    env.load_sales();
    env.cmd().args(["recent", "pin", "sales.csv"]).assert().success();
    env.cmd()
        .args(["recent", "list", "--search", "SALES"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*"));

    env.cmd().args(["recent", "remove", "sales.csv"]).assert().success();
    env.cmd()
        .args(["columns", "sales.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown dataset"));
    env.cmd().args(["recent", "unpin", "sales.csv"]).assert().failure();
}

#[test]
fn reset_clears_templates_but_keeps_data() {
    let env = Env::new();
    env.load_sales();
    env.cmd()
        .args(["template", "save", "t", "-x", "Region"])
        .assert()
        .success();
    env.cmd().arg("reset").assert().success();
    env.cmd()
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No templates."));
    env.cmd()
        .args(["recent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recent files."));
    env.cmd().args(["columns", "sales.csv"]).assert().success();
}

#[test]
fn status_reports_counts() {
    let env = Env::new();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
    env.load_sales();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Datasets:      1"));
}

#[test]
fn sheets_of_a_csv_is_its_stem() {
    let env = Env::new();
    let path = env.write("quarterly.csv", SALES_CSV);
    env.cmd()
        .args(["sheets", path_str(&path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("quarterly"));
}

#[test]
fn config_saves_settings_used_by_later_commands() {
    let env = Env::new();
    env.cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows_per_page\": 10"));
    assert!(!env.home.path().join(".config/sheetlens/settings.json").exists());

    env.cmd()
        .args(["config", "--rows-per-page", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows_per_page\": 1"));
    assert!(env.home.path().join(".config/sheetlens/settings.json").exists());

    env.load_sales();
    env.cmd()
        .args(["view", "sales.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 1 of 3"));
}

#[test]
fn config_rejects_zero_rows_per_page() {
    let env = Env::new();
    env.cmd()
        .args(["config", "--rows-per-page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rows-per-page must be at least 1"));
}

#[test]
fn exports_are_recorded_in_history_until_reset() {
    let env = Env::new();
    env.cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No exports yet."));

    env.load_sales();
    let out = env.home.path().join("east.csv");
    env.cmd()
        .args(["export", "sales.csv", "--output", path_str(&out)])
        .assert()
        .success();
    env.cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("CSV").and(predicate::str::contains("east.csv")));
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exports:       1"));

    env.cmd().arg("reset").assert().success();
    env.cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No exports yet."));
}
