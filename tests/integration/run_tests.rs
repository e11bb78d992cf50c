//! Integration tests for the run and template commands

use crate::common::{sample_tables, SharedBuffer, TestFixture};
use syncdiff::cli::{Commands, GenerateCommands};
use syncdiff::commands::{execute_command, run_task};
use syncdiff::config::TaskConfig;
use syncdiff::output::{SummaryReport, PATCH_DIR, SUMMARY_FILE};
use syncdiff::FailureKind;

#[test]
fn test_run_all_equal() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.write_config(sample_tables::all_equal()).unwrap();
    let config = TaskConfig::load(&path).unwrap();
    let buffer = SharedBuffer::new();

    let report = run_task(&config, buffer.clone()).unwrap();
    assert!(report.all_equal);
    assert_eq!(report.tables_compared, 3);
    assert_eq!(report.processed_chunks, 28);

    let out = buffer.contents();
    assert!(out.starts_with("A total of 3 tables need to be compared"));
    assert!(out.contains("A total of 3 tables have been compared and all are equal."));
    assert!(out.contains("Time Cost:"));

    let summary_path = fixture.output_dir().join(SUMMARY_FILE);
    let written: SummaryReport =
        serde_json::from_str(&std::fs::read_to_string(summary_path).unwrap()).unwrap();
    assert!(written.all_equal);
    assert_eq!(written.tables_compared, report.tables_compared);
    assert_eq!(written.processed_chunks, report.processed_chunks);
    assert_eq!(written.created, report.created);
}

#[test]
fn test_run_with_failures() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.write_config(sample_tables::with_failures()).unwrap();
    let config = TaskConfig::load(&path).unwrap();
    let buffer = SharedBuffer::new();

    let report = run_task(&config, buffer.clone()).unwrap();
    assert!(!report.all_equal);
    assert_eq!(report.processed_chunks, 20 + 40);

    let mut failed: Vec<_> = report
        .failed
        .iter()
        .map(|f| (f.table.as_str(), f.kind))
        .collect();
    failed.sort_by_key(|(name, _)| *name);
    assert_eq!(
        failed,
        vec![
            ("schema2.table2", FailureKind::Structure),
            ("schema3.table3", FailureKind::Data),
        ]
    );

    let out = buffer.contents();
    assert!(out.contains("Comparing the table data of `schema1.table1` ... equivalent"));
    assert!(out.contains("Comparing the table structure of `schema2.table2` ... failure"));
    assert!(out.contains("Comparing the table data of `schema3.table3` ... failure"));
    assert!(out.contains("The patch file has been generated to"));

    // Every path the summary points at exists after the run
    let patch_dir = fixture.output_dir().join(PATCH_DIR);
    assert!(out.contains(&format!("'{}'", patch_dir.display())));
    assert!(patch_dir.is_dir());
    assert!(fixture.output_dir().join(SUMMARY_FILE).is_file());
}

#[test]
fn test_template_command_writes_parsable_config() {
    let fixture = TestFixture::new().unwrap();
    let output = fixture.root().join("conf").join("template.toml");

    execute_command(Commands::GenerateConfig {
        command: GenerateCommands::Template {
            output: output.clone(),
        },
    })
    .unwrap();

    let config = TaskConfig::load(&output).unwrap();
    assert!(!config.tables.is_empty());
}

#[test]
fn test_run_command_with_missing_config() {
    let fixture = TestFixture::new().unwrap();
    let result = execute_command(Commands::Run {
        config: fixture.root().join("nope.toml"),
    });
    assert!(result.is_err());
}
