use leads_core::{
    cache::DatasetCache,
    config::PipelineConfig,
    error::PipelineError,
    filter::FilterSelection,
    session::AnalyticsSession,
};
use std::{
    fs::File,
    io::Write,
    path::Path,
    sync::Arc,
    time::{Duration, SystemTime},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const HEADER: &str = "Toma de contacto,Fecha de Creación,Fecha de Conversión,Producto";

fn write_source(path: &Path, rows: &[&str], modified: SystemTime) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut file = File::create(path).unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.set_modified(modified).unwrap();
}

fn epoch_plus(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn unchanged_source_is_loaded_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    write_source(&path, &["Web,01/01/2019 10:00,,A"], epoch_plus(0));

    let mut cache = DatasetCache::new(&path, PipelineConfig::default());
    let a = cache.dataset().unwrap();
    let b = cache.dataset().unwrap();

    assert!(Arc::ptr_eq(&a, &b), "Second call should reuse the cached dataset");
    assert_eq!(cache.load_count(), 1);
}

#[test]
fn modified_source_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    write_source(&path, &["Web,01/01/2019 10:00,,A"], epoch_plus(0));

    let mut cache = DatasetCache::new(&path, PipelineConfig::default());
    assert_eq!(cache.dataset().unwrap().len(), 1);

    write_source(
        &path,
        &["Web,01/01/2019 10:00,,A", "Email,02/01/2019 10:00,,"],
        epoch_plus(60),
    );
    assert_eq!(cache.dataset().unwrap().len(), 2);
    assert_eq!(cache.load_count(), 2);
}

#[test]
fn invalidate_forces_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    write_source(&path, &["Web,01/01/2019 10:00,,A"], epoch_plus(0));

    let mut cache = DatasetCache::new(&path, PipelineConfig::default());
    let a = cache.dataset().unwrap();
    cache.invalidate();
    let b = cache.dataset().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.load_count(), 2);
}

/// Once the source disappears the cache refuses to serve the old dataset.
#[test]
fn removed_source_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    write_source(&path, &["Web,01/01/2019 10:00,,A"], epoch_plus(0));

    let mut cache = DatasetCache::new(&path, PipelineConfig::default());
    cache.dataset().unwrap();
    std::fs::remove_file(&path).unwrap();

    let err = cache.dataset().unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable { .. }), "got {err:?}");
}

#[test]
fn malformed_source_returns_no_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    std::fs::write(&path, "Toma de contacto,Producto\nWeb,A\n").unwrap();

    let mut cache = DatasetCache::new(&path, PipelineConfig::default());
    let err = cache.dataset().unwrap_err();
    assert!(matches!(err, PipelineError::DataMalformed { .. }), "got {err:?}");
    assert_eq!(cache.load_count(), 0);
}

#[test]
fn session_applies_and_resets_filters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    write_source(
        &path,
        &[
            "Web,01/01/2019 10:00,,A",
            "Web,15/01/2019 09:00,,",
            "Email,20/01/2019 10:00,,B",
        ],
        epoch_plus(0),
    );

    let mut session = AnalyticsSession::new(&path, PipelineConfig::default());
    let full = session.report().unwrap();
    assert_eq!(full.filtered_records, 3);
    assert_eq!(full.dataset.total_records, 3);

    let selection = full.selection.clone().unwrap().with_channels(["Web"]);
    session.set_filter(selection);
    let web = session.report().unwrap();
    assert_eq!(web.filtered_records, 2);
    assert_eq!(web.report.headline.conversion_rate, Some(50.0));
    assert_eq!(web.dataset.total_records, 3, "dataset info is not filtered");

    session.reset_filter();
    assert_eq!(session.report().unwrap().filtered_records, 3);
    assert!(session.selection().is_none());
}

#[test]
fn session_over_empty_dataset_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Ventas.csv");
    write_source(&path, &["Web,01/01/2010 10:00,,A"], epoch_plus(0));

    let mut session = AnalyticsSession::new(&path, PipelineConfig::default());
    let state = session.report().unwrap();

    assert_eq!(state.selection, None::<FilterSelection>);
    assert_eq!(state.filtered_records, 0);
    assert_eq!(state.report.headline.conversion_rate, None);
}
