//! End-to-end import tests against the in-memory store

use csvpost_common::config::{ImportConfig, ImportLogSettings, SiteTimeZone};
use csvpost_common::logging::{ImportLogger, LogLevel};
use csvpost_common::{CsvPostError, Result};
use csvpost_ingest::header::HeaderWarning;
use csvpost_ingest::importer::InputSource;
use csvpost_ingest::model::{CategoryId, PostId, PostRequest};
use csvpost_ingest::{ContentStore, MemoryStore, PostImporter, RowOutcome};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn importer_with(config: ImportConfig) -> PostImporter<MemoryStore> {
    PostImporter::with_logger(
        config,
        MemoryStore::new().expect("store"),
        ImportLogger::disabled(),
    )
    .expect("importer")
}

fn importer() -> PostImporter<MemoryStore> {
    importer_with(ImportConfig::default())
}

/// Refuses posts titled "Broken" and every metadata key starting with "x-"
struct PickyStore {
    inner: MemoryStore,
}

impl ContentStore for PickyStore {
    fn create_post(&self, request: &PostRequest) -> Result<PostId> {
        if request.title == "Broken" {
            return Err(CsvPostError::store("create_post", "database is read-only"));
        }
        self.inner.create_post(request)
    }

    fn resolve_or_create_category(&self, slug: &str) -> Result<CategoryId> {
        self.inner.resolve_or_create_category(slug)
    }

    fn set_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<()> {
        if key.starts_with("x-") {
            return Err(CsvPostError::store("set_meta", "key not allowed"));
        }
        self.inner.set_meta(post_id, key, value)
    }

    fn sanitize_plain_text(&self, value: &str) -> String {
        self.inner.sanitize_plain_text(value)
    }

    fn sanitize_rich_html(&self, value: &str) -> String {
        self.inner.sanitize_rich_html(value)
    }

    fn validate_url(&self, value: &str) -> String {
        self.inner.validate_url(value)
    }
}

// ============================================================================
// Pasted text
// ============================================================================

#[test]
fn test_minimal_text_import() {
    let importer = importer();
    let report = importer
        .import_text("Post Date,Title,Content\n2024-01-01 09:00,Hello,World")
        .unwrap();

    assert_eq!(report.source, InputSource::Text);
    assert_eq!(report.created, 1);
    assert_eq!(report.failed, 0);

    let posts = importer.store().posts();
    assert_eq!(posts.len(), 1);
    let request = &posts[0].request;
    assert_eq!(request.title, "Hello");
    assert_eq!(request.content, "World");
    assert_eq!(
        request.scheduled_utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "2024-01-01T09:00:00Z"
    );
}

#[test]
fn test_quoted_newlines_in_pasted_text() {
    let importer = importer();
    let report = importer
        .import_text("Post Date,Title,Content\n2024-01-01 09:00,Hello,\"first\nsecond\"\n")
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(importer.store().posts()[0].request.content, "first\nsecond");
}

#[test]
fn test_column_mismatch_halts_batch() {
    let importer = importer();
    let err = importer
        .import_text(
            "Post Date,Title,Content,Category,Tags\n\
             2024-01-01 09:00,One,Body,news,a\n\
             2024-01-02 09:00,Two,Body,news\n\
             2024-01-03 09:00,Three,Body,news,c\n",
        )
        .unwrap_err();

    match err {
        CsvPostError::ColumnCount {
            line,
            expected,
            actual,
        } => {
            assert_eq!(line, 3);
            assert_eq!(expected, 5);
            assert_eq!(actual, 4);
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(importer.store().post_count(), 0);
    assert!(importer.store().categories().is_empty());
}

#[test]
fn test_unknown_column_becomes_custom_field() {
    let importer = importer();
    let report = importer
        .import_text("Post Date,Title,Content,Foo\n2024-01-01 09:00,Hello,World,<em>bar</em>")
        .unwrap();

    assert_eq!(
        report.warnings,
        vec![HeaderWarning::UnknownFields(vec!["Foo".to_string()])]
    );
    let post = &importer.store().posts()[0];
    assert_eq!(post.request.custom_field_values["Foo"], "bar");
    assert_eq!(post.meta["Foo"], "bar");
}

#[test]
fn test_missing_required_header_uses_default_order() {
    let importer = importer();
    // "Content" is missing: the default eleven-field header replaces it and the
    // two-cell data row no longer fits
    let err = importer
        .import_text("Post Date,Title\n2024-01-01 09:00,Hello")
        .unwrap_err();
    assert_eq!(err.code(), "column_count");
}

#[test]
fn test_cells_mentioning_iframe_keep_their_text() {
    let importer = importer();
    let report = importer
        .import_text(
            "Post Date,Title,Content\n2024-01-01 09:00,Why <iframe is old,Compare <iframes> and embeds",
        )
        .unwrap();

    assert_eq!(report.created, 1);
    let request = &importer.store().posts()[0].request;
    assert_eq!(request.title, "Why <iframe is old");
    assert!(request.content.starts_with("Compare"));
    assert!(request.content.ends_with("and embeds"));
}

#[test]
fn test_oversized_input_is_rejected() {
    let config = ImportConfig::builder().max_input_bytes(16).build().unwrap();
    let importer = importer_with(config);
    let err = importer
        .import_text("Post Date,Title,Content\n2024-01-01 09:00,Hello,World")
        .unwrap_err();
    assert_eq!(err.code(), "input_too_large");
}

// ============================================================================
// Files and streams
// ============================================================================

#[test]
fn test_fixture_file_import() {
    let importer = importer();
    let report = importer.import_file(fixture_path("posts.csv")).unwrap();

    assert!(report.has_header);
    assert_eq!(report.created, 3);
    assert_eq!(
        report.summary_message(),
        "CSV file was successfully uploaded and processed."
    );
    assert_eq!(
        report.warnings,
        vec![HeaderWarning::UnknownFields(vec!["Source".to_string()])]
    );
    assert_eq!(
        report.rows.iter().map(RowOutcome::line).collect::<Vec<_>>(),
        vec![2, 3, 5]
    );

    let posts = importer.store().posts();

    let launch = &posts[0];
    assert_eq!(launch.request.content, "<p>We are <strong>live</strong>.</p>");
    assert_eq!(launch.request.tags, vec!["launch", "spring"]);
    assert_eq!(launch.meta["custom_fields_01"], "https://example.com/launch");
    assert_eq!(
        launch.meta["custom_fields_02"],
        r#"<iframe width="560" height="315" src="https://www.youtube.com/embed/abc" frameborder="0" allowfullscreen></iframe>"#
    );
    assert_eq!(launch.meta["Source"], "press kit");

    let second = &posts[1];
    assert_eq!(second.request.content, "Line one\nline two");
    assert_eq!(second.request.scheduled_local.to_string(), "2024-03-15 11:00:00");
    assert_eq!(second.request.category_id, launch.request.category_id);

    let third = &posts[2];
    assert_eq!(third.request.scheduled_local.to_string(), "2024-03-16 08:15:00");
    assert_eq!(third.meta["custom_fields_01"], "not a url");
    assert_eq!(third.meta["Source"], "newsletter");

    assert_eq!(importer.store().categories().len(), 2);
}

#[test]
fn test_temp_file_with_bom() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.csv");
    std::fs::write(
        &path,
        b"\xEF\xBB\xBFPost Date,Title,Content\n2024-01-01 09:00,Hello,World\n",
    )
    .unwrap();

    let report = importer().import_file(&path).unwrap();
    assert!(report.has_header);
    assert_eq!(report.created, 1);
    assert_eq!(
        report.source,
        InputSource::File {
            path: path.display().to_string()
        }
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = importer()
        .import_file(dir.path().join("absent.csv"))
        .unwrap_err();
    assert_eq!(err.code(), "io_error");
}

#[test]
fn test_reader_import() {
    let importer = importer();
    let report = importer
        .import_reader(std::io::Cursor::new(
            "Post Date,Title,Content\n2024-01-01 09:00,Hello,World\n",
        ))
        .unwrap();
    assert_eq!(report.source, InputSource::Stream);
    assert_eq!(report.created, 1);
}

// ============================================================================
// Row failures
// ============================================================================

#[test]
fn test_store_failures_are_isolated_per_row() {
    let store = PickyStore {
        inner: MemoryStore::new().unwrap(),
    };
    let importer =
        PostImporter::with_logger(ImportConfig::default(), store, ImportLogger::disabled())
            .unwrap();

    let report = importer
        .import_text(
            "Post Date,Title,Content,x-ref\n\
             2024-01-01 09:00,First,Body,1\n\
             2024-01-02 09:00,Broken,Body,2\n\
             2024-01-03 09:00,Third,Body,3\n",
        )
        .unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.meta_failures, 2);
    match &report.rows[1] {
        RowOutcome::Failed {
            line,
            code,
            message,
        } => {
            assert_eq!(*line, 3);
            assert_eq!(code, "store_error");
            assert!(message.contains("database is read-only"));
        },
        other => panic!("unexpected outcome: {other:?}"),
    }
    let titles: Vec<String> = importer
        .store()
        .inner
        .posts()
        .into_iter()
        .map(|p| p.request.title)
        .collect();
    assert_eq!(titles, vec!["First", "Third"]);
}

#[test]
fn test_category_survives_failed_post_insert() {
    let store = PickyStore {
        inner: MemoryStore::new().unwrap(),
    };
    let importer =
        PostImporter::with_logger(ImportConfig::default(), store, ImportLogger::disabled())
            .unwrap();

    let report = importer
        .import_text("Post Date,Title,Content,Category\n2024-01-01 09:00,Broken,Body,Orphans\n")
        .unwrap();

    assert_eq!(report.created, 0);
    assert_eq!(report.failed, 1);
    assert!(matches!(&report.rows[0], RowOutcome::Failed { line: 2, .. }));
    assert_eq!(importer.store().inner.post_count(), 0);
    assert!(importer.store().inner.categories().contains_key("Orphans"));
}

// ============================================================================
// Time zones and logging
// ============================================================================

#[test]
fn test_site_time_zone_and_dst() {
    let config = ImportConfig::builder()
        .time_zone("America/New_York".parse::<SiteTimeZone>().unwrap())
        .build()
        .unwrap();
    let importer = importer_with(config);
    importer
        .import_text(
            "Post Date,Title,Content\n\
             2024-03-10 02:30,Gap,Body\n\
             2024-11-03 01:30,Overlap,Body\n\
             2024-07-01 12:00,Summer,Body\n",
        )
        .unwrap();

    let utc: Vec<String> = importer
        .store()
        .posts()
        .iter()
        .map(|p| p.request.scheduled_utc.to_rfc3339())
        .collect();
    assert_eq!(
        utc,
        vec![
            "2024-03-10T07:30:00+00:00",
            "2024-11-03T05:30:00+00:00",
            "2024-07-01T16:00:00+00:00",
        ]
    );
}

#[test]
fn test_import_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("import.log");
    let config = ImportConfig::builder()
        .log(ImportLogSettings {
            enabled: true,
            level: LogLevel::Info,
            file: Some(log_path.clone()),
        })
        .build()
        .unwrap();
    let importer = PostImporter::new(config, MemoryStore::new().unwrap()).unwrap();

    importer
        .import_text("Post Date,Title,Content\n2024-01-01 09:00,Hello,World\nbad,Oops,Body")
        .unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("] INFO: Post created successfully. ID: 1"));
    assert!(log.contains("] ERROR: Error creating post from line 3"));
    assert!(!log.contains("DEBUG"));
}

#[test]
fn test_disabled_import_log_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("import.log");
    let config = ImportConfig::builder()
        .log(ImportLogSettings {
            enabled: false,
            level: LogLevel::Debug,
            file: Some(log_path.clone()),
        })
        .build()
        .unwrap();
    let importer = PostImporter::new(config, MemoryStore::new().unwrap()).unwrap();
    importer.import_text("garbage").unwrap_err();

    assert!(!log_path.exists());
}
