//! Edge case tests for printer shutdown and misuse

use crate::common::{printer_with, quiet_printer};
use std::thread;
use std::time::Duration;
use syncdiff::{PrinterOptions, SyncDiffError};

#[test]
fn test_producer_calls_after_close_fail_fast() {
    let (mut printer, _buffer) = quiet_printer(1);
    let handle = printer.handle();
    printer.close().unwrap();

    assert!(matches!(
        handle.start("t", 1, false, true),
        Err(SyncDiffError::ReporterClosed)
    ));
    assert!(matches!(handle.fail("t"), Err(SyncDiffError::ReporterClosed)));
    assert!(matches!(
        printer.update_total("t", 2, true),
        Err(SyncDiffError::ReporterClosed)
    ));
}

#[test]
fn test_second_terminal_call_is_rejected() {
    let (mut printer, _buffer) = quiet_printer(1);
    printer.close().unwrap();
    assert!(matches!(printer.close(), Err(SyncDiffError::ReporterClosed)));
    assert!(matches!(
        printer.report_error(&"late"),
        Err(SyncDiffError::ReporterClosed)
    ));
}

#[test]
fn test_report_error_prints_after_worker_stops() {
    let options = PrinterOptions::new(2)
        .tick_interval(Duration::from_secs(3600))
        .log_path("output_dir/sync_diff_inspector.log");
    let (mut printer, buffer) = printer_with(options);
    printer.start("a", 10, false, true).unwrap();
    printer.increment("a").unwrap();
    printer.report_error(&"checksum query timed out").unwrap();

    let out = buffer.contents();
    assert!(!out.contains("Progress ["));
    assert!(out.ends_with(
        "Error in comparison process:\nchecksum query timed out\n\n\
         You can view the comparison details through 'output_dir/sync_diff_inspector.log'\n"
    ));
    assert!(printer.is_closed());
}

#[test]
fn test_no_output_after_close_returns() {
    let options = PrinterOptions::new(1).tick_interval(Duration::from_millis(1));
    let (mut printer, buffer) = printer_with(options);
    printer.start("t", 3, false, true).unwrap();
    printer.close().unwrap();

    let snapshot = buffer.contents();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(buffer.contents(), snapshot);
}

#[test]
fn test_backpressure_with_single_slot_queue() {
    let options = PrinterOptions::new(1)
        .tick_interval(Duration::from_millis(1))
        .channel_capacity(1);
    let (mut printer, _buffer) = printer_with(options);

    let handle = printer.handle();
    let producer = thread::spawn(move || {
        handle.start("t", 500, false, true).unwrap();
        for _ in 0..500 {
            handle.increment("t").unwrap();
        }
    });
    producer.join().unwrap();
    printer.close().unwrap();

    let registry = printer.registry().unwrap();
    assert_eq!(registry.processed_units(), 500);
    assert_eq!(registry.counters().finished, 1);
}

#[test]
fn test_summary_before_close_is_rejected() {
    let (printer, _buffer) = quiet_printer(1);
    assert!(matches!(printer.summary(), Err(SyncDiffError::ReporterNotClosed)));
    assert!(printer.registry().is_none());
}

#[test]
fn test_zero_expected_tables() {
    let (mut printer, buffer) = quiet_printer(0);
    printer.close().unwrap();
    printer.print_summary("out").unwrap();
    let out = buffer.contents();
    assert!(out.contains("100%"));
    assert!(out.contains("A total of 0 tables have been compared and all are equal."));
}

#[test]
fn test_drop_without_close_stops_worker() {
    let (printer, buffer) = quiet_printer(1);
    printer.start("t", 1, false, true).unwrap();
    drop(printer);
    assert!(!buffer.contents().contains("Progress ["));
}
