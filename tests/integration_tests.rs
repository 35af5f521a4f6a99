//! Integration tests for smartsort
//!
//! These tests exercise complete workflows against real temporary
//! directories: scan, sort, undo, journal bounds, heuristics, report export
//! and the command-line entry point.

use clap::Parser;
use smartsort::cli::{Cli, run};
use smartsort::{
    FileOrganizer, FileRecord, FilterSpec, MoveRecord, ReportFormat, RuleSet, UndoJournal,
    export_report, scan,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

const MIB: u64 = 1024 * 1024;

/// A temporary workspace with a `source/` tree, a `sorted/` destination and
/// an isolated settings file.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fixture = TestFixture { temp_dir };
        fs::create_dir(fixture.source()).expect("Failed to create source directory");
        fixture
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn source(&self) -> PathBuf {
        self.path().join("source")
    }

    fn dest(&self) -> PathBuf {
        self.path().join("sorted")
    }

    fn journal(&self) -> UndoJournal {
        UndoJournal::new(self.path().join("state").join("undo_log.json"))
    }

    /// Create a file with content below `source/`, creating parent folders.
    fn create_file(&self, rel_path: &str, content: &[u8]) -> PathBuf {
        let file_path = self.source().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content).expect("Failed to write file content");
        file_path
    }

    /// Create a sparse file of `len` bytes below `source/`.
    fn create_sized_file(&self, rel_path: &str, len: u64) -> PathBuf {
        let file_path = self.create_file(rel_path, b"");
        File::options()
            .write(true)
            .open(&file_path)
            .and_then(|file| file.set_len(len))
            .expect("Failed to size file");
        file_path
    }

    /// Writes a settings file pointing rules and journal into the fixture.
    fn write_config(&self) -> PathBuf {
        let config_path = self.path().join("config.toml");
        let content = format!(
            "[sorting]\nrules_file = {:?}\njournal_file = {:?}\n",
            self.path().join("state").join("rules.json"),
            self.path().join("state").join("undo_log.json"),
        );
        fs::write(&config_path, content).expect("Failed to write config");
        config_path
    }

    /// Runs the CLI with the fixture's settings file.
    fn run_cli(&self, args: &[&str]) -> anyhow::Result<()> {
        let config = self.write_config();
        let mut argv = vec!["smartsort".to_string(), "--config".to_string()];
        argv.push(config.display().to_string());
        argv.extend(args.iter().map(|arg| arg.to_string()));
        run(Cli::try_parse_from(argv)?)
    }

    fn assert_file_exists(&self, path: &Path) {
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, path: &Path) {
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }
}

fn sorted_by_path(mut records: Vec<FileRecord>) -> Vec<FileRecord> {
    records.sort_by(|a, b| a.path.cmp(&b.path));
    records
}

// ============================================================================
// Scanning
// ============================================================================

#[test]
fn test_scan_excludes_extension() {
    let fixture = TestFixture::new();
    fixture.create_sized_file("a.jpg", MIB);
    fixture.create_sized_file("b.tmp", 1024);

    let filters = FilterSpec::new().with_excluded_extensions([".tmp"]);
    let records = scan(&fixture.source(), true, &filters);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "a.jpg");
    assert_eq!(records[0].category, "Images");
    assert_eq!(records[0].size, "1.0 MB");
}

#[test]
fn test_scan_min_size() {
    let fixture = TestFixture::new();
    fixture.create_sized_file("small.png", MIB);
    fixture.create_sized_file("large.png", 11 * MIB);

    let filters = FilterSpec::new().with_min_size(10 * MIB);
    let records = scan(&fixture.source(), true, &filters);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "large.png");
}

#[test]
fn test_scan_exclude_pattern() {
    let fixture = TestFixture::new();
    fixture.create_file("keep.txt", b"keep");
    fixture.create_file("node_modules/pkg/index.js", b"skip");

    let filters = FilterSpec::new()
        .with_exclude_patterns(&["**/node_modules/**"])
        .expect("valid pattern");
    let records = scan(&fixture.source(), true, &filters);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "keep.txt");
}

#[test]
fn test_scan_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file("a.pdf", b"pdf");
    fixture.create_file("docs/b.docx", b"docx");
    fixture.create_file("music/c.flac", b"flac");

    let first = sorted_by_path(scan(&fixture.source(), true, &FilterSpec::default()));
    let second = sorted_by_path(scan(&fixture.source(), true, &FilterSpec::default()));

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_rules_take_precedence_over_builtin_table() {
    let fixture = TestFixture::new();
    fixture.create_file("lecture.pdf", b"pdf");
    fixture.create_file("invoice_final.pdf", b"pdf");

    let mut rules = RuleSet::new();
    rules.add("_final.pdf", "Finals");
    rules.add(".pdf", "Papers");
    let filters = FilterSpec::new().with_rules(rules);

    let records = sorted_by_path(scan(&fixture.source(), true, &filters));
    assert_eq!(records[0].category, "Finals");
    assert_eq!(records[1].category, "Papers");
}

// ============================================================================
// Sorting and undo
// ============================================================================

#[test]
fn test_sort_then_undo_round_trip() {
    let fixture = TestFixture::new();
    let files = [
        fixture.create_file("photo.jpg", b"jpg"),
        fixture.create_file("nested/report.pdf", b"pdf"),
        fixture.create_file("song.mp3", b"mp3"),
        fixture.create_file("README", b"text"),
    ];

    let records = scan(&fixture.source(), true, &FilterSpec::default());
    let report = FileOrganizer::execute(&records, &fixture.dest());
    assert!(report.is_complete_success());
    assert_eq!(report.moved.len(), 4);

    fixture.assert_file_exists(&fixture.dest().join("Images").join("photo.jpg"));
    fixture.assert_file_exists(&fixture.dest().join("Documents").join("report.pdf"));
    fixture.assert_file_exists(&fixture.dest().join("Audio").join("song.mp3"));
    fixture.assert_file_exists(&fixture.dest().join("Other").join("README"));
    for file in &files {
        fixture.assert_file_not_exists(file);
    }

    let journal = fixture.journal();
    assert!(journal.append(report.moved).unwrap());

    let (success, message) = journal.undo_last_summary();
    assert!(success, "{message}");
    assert_eq!(message, "Successfully undid 4 file(s).");

    for file in &files {
        fixture.assert_file_exists(file);
    }
    for category in ["Images", "Documents", "Audio", "Other"] {
        assert!(!fixture.dest().join(category).exists());
    }
}

#[test]
fn test_undo_with_empty_journal() {
    let fixture = TestFixture::new();
    assert_eq!(
        fixture.journal().undo_last_summary(),
        (false, "No previous sort operations to undo.".to_string())
    );
}

#[test]
fn test_journal_keeps_last_five_operations() {
    let fixture = TestFixture::new();
    let journal = fixture.journal();

    for n in 0..6 {
        let file = fixture.create_file(&format!("file{n}.txt"), b"x");
        let moved = FileOrganizer::move_to_category(&fixture.dest(), &file, "Documents").unwrap();
        journal.append(vec![moved]).unwrap();
    }

    let operations = journal.operations();
    assert_eq!(operations.len(), 5);
    assert!(operations[0].files[0].original_path.ends_with("file1.txt"));
    assert!(operations[4].files[0].original_path.ends_with("file5.txt"));
}

#[test]
fn test_sort_keeps_going_after_collision() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", b"incoming");
    fixture.create_file("b.txt", b"fine");
    fs::create_dir_all(fixture.dest().join("Documents")).unwrap();
    fs::write(fixture.dest().join("Documents").join("a.txt"), b"existing").unwrap();

    let records = scan(&fixture.source(), true, &FilterSpec::default());
    let report = FileOrganizer::execute(&records, &fixture.dest());

    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        fs::read(fixture.dest().join("Documents").join("a.txt")).unwrap(),
        b"existing"
    );
    fixture.assert_file_exists(&fixture.source().join("a.txt"));
}

#[test]
fn test_undo_reports_file_moved_away() {
    let fixture = TestFixture::new();
    let kept = fixture.create_file("kept.txt", b"1");
    let lost = fixture.create_file("lost.txt", b"2");

    let journal = fixture.journal();
    let moved: Vec<MoveRecord> = [&kept, &lost]
        .iter()
        .map(|file| FileOrganizer::move_to_category(&fixture.dest(), file, "Documents").unwrap())
        .collect();
    journal.append(moved).unwrap();

    fs::remove_file(fixture.dest().join("Documents").join("lost.txt")).unwrap();

    let report = journal.undo_last().unwrap();
    assert_eq!(report.restored, 1);
    assert_eq!(report.failures.len(), 1);
    fixture.assert_file_exists(&kept);
    fixture.assert_file_not_exists(&lost);
    assert!(journal.operations().is_empty());
}

// ============================================================================
// Heuristics and reports
// ============================================================================

#[test]
fn test_smart_sort_pipeline() {
    let fixture = TestFixture::new();
    fixture.create_file("Screenshot 2024-03-01.png", b"png");
    fixture.create_file("holiday_2023_08_14.txt", b"txt");
    fixture.create_sized_file("raw.jpg", 6 * MIB);
    fixture.create_file("script.py", b"print()");

    let mut records = scan(&fixture.source(), true, &FilterSpec::default());
    let changed = smartsort::smart::apply_smart_categories(&mut records);
    assert_eq!(changed, 4);

    let report = FileOrganizer::execute(&records, &fixture.dest());
    assert!(report.is_complete_success());

    let dest = fixture.dest();
    fixture.assert_file_exists(&dest.join("Smart - Screenshots").join("Screenshot 2024-03-01.png"));
    fixture.assert_file_exists(&dest.join("Smart - Dated Files").join("holiday_2023_08_14.txt"));
    fixture.assert_file_exists(&dest.join("Smart - High Quality Images").join("raw.jpg"));
    fixture.assert_file_exists(&dest.join("Smart - Code").join("script.py"));
}

#[test]
fn test_export_scan_report() {
    let fixture = TestFixture::new();
    fixture.create_file("a.zip", b"zip");
    fixture.create_file("b.mov", b"mov");

    let records = scan(&fixture.source(), true, &FilterSpec::default());
    let out = fixture.path().join("reports").join("scan.csv");
    export_report(&records, ReportFormat::Csv, &out).unwrap();

    let content = fs::read_to_string(&out).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("File Name,Type,Size,Category,Path,Modified"));
    assert_eq!(lines.count(), 2);
    assert!(content.contains(",Archives,"));
    assert!(content.contains(",Videos,"));
}

// ============================================================================
// Command line
// ============================================================================

#[test]
fn test_cli_sort_and_undo() {
    let fixture = TestFixture::new();
    let image = fixture.create_file("image.gif", b"gif");
    let temp = fixture.create_file("partial.tmp", b"tmp");

    let source = fixture.source().display().to_string();
    let dest = fixture.dest().display().to_string();
    fixture
        .run_cli(&["sort", &source, &dest, "--yes"])
        .expect("sort failed");

    fixture.assert_file_exists(&fixture.dest().join("Images").join("image.gif"));
    // .tmp is excluded by the default settings
    fixture.assert_file_exists(&temp);
    assert_eq!(fixture.journal().operations().len(), 1);

    fixture.run_cli(&["undo"]).expect("undo failed");
    fixture.assert_file_exists(&image);
    assert!(fixture.run_cli(&["undo"]).is_err());
}

#[test]
fn test_cli_sort_missing_source_fails() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("missing").display().to_string();
    let dest = fixture.dest().display().to_string();

    let err = fixture
        .run_cli(&["sort", &missing, &dest, "--yes"])
        .unwrap_err();
    assert!(err.to_string().contains("Source folder does not exist"));
}

#[test]
fn test_cli_sort_without_destination_fails() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", b"a");
    let source = fixture.source().display().to_string();

    assert!(fixture.run_cli(&["sort", &source, "--yes"]).is_err());
    fixture.assert_file_exists(&fixture.source().join("a.txt"));
}

#[test]
fn test_cli_rules_affect_sort() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.md", b"# notes");

    fixture
        .run_cli(&["rules", "add", ".md", "Notes"])
        .expect("rule add failed");
    let rules = RuleSet::load_or_init(&fixture.path().join("state").join("rules.json"));
    assert_eq!(rules.len(), 7);

    let source = fixture.source().display().to_string();
    let dest = fixture.dest().display().to_string();
    fixture
        .run_cli(&["sort", &source, &dest, "--yes", "--no-recursive"])
        .expect("sort failed");
    fixture.assert_file_exists(&fixture.dest().join("Notes").join("notes.md"));

    fixture.run_cli(&["rules", "remove", ".md"]).unwrap();
    assert!(fixture.run_cli(&["rules", "remove", ".md"]).is_err());
}

#[test]
fn test_cli_scan_export_json() {
    let fixture = TestFixture::new();
    fixture.create_file("a.wav", b"wav");
    fixture.create_file("deep/b.7z", b"7z");

    let source = fixture.source().display().to_string();
    let out = fixture.path().join("scan.json");
    fixture
        .run_cli(&["scan", &source, "--export", &out.display().to_string()])
        .expect("scan failed");

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    // scanning never moves anything
    fixture.assert_file_exists(&fixture.source().join("a.wav"));
}

#[test]
fn test_cli_config_init_and_show() {
    let fixture = TestFixture::new();
    let target = fixture.path().join("generated.toml");
    let target_arg = target.display().to_string();

    fixture
        .run_cli(&["config", "init", &target_arg])
        .expect("config init failed");
    assert!(fs::read_to_string(&target).unwrap().contains("[sorting]"));
    assert!(fixture.run_cli(&["config", "init", &target_arg]).is_err());
    fixture
        .run_cli(&["config", "init", &target_arg, "--force"])
        .expect("forced init failed");
    fixture.run_cli(&["config", "show"]).expect("config show failed");
}
