use super::*;
use crate::cli::{Cli, PolicyArg};
use clap::Parser;
use docsort_core::UnresolvedPolicy;
use lopdf::{dictionary, Document, Object, Stream};

/// Create a one-page PDF showing `text`
fn create_test_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => resources_id,
        "Contents" => content_id,
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn parse(args: &[&str]) -> Command {
    let mut argv = vec!["docsort"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

fn zip_entries(path: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    zip.file_names().map(str::to_string).collect()
}

// ============================================================================
// Input collection
// ============================================================================

#[tokio::test]
async fn test_collect_documents_expands_directories() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path();
    std::fs::write(dir.join("b.pdf"), b"b").unwrap();
    std::fs::write(dir.join("a.png"), b"a").unwrap();
    std::fs::write(dir.join(".DS_Store"), b"x").unwrap();
    std::fs::create_dir(dir.join("nested")).unwrap();

    let documents = collect_documents(&[dir.to_path_buf()], false).await.unwrap();
    let names: Vec<_> = documents.iter().map(|d| d.display_name()).collect();
    assert_eq!(names, vec!["a.png", "b.pdf"]);
    assert!(documents.iter().all(|d| d.bytes().is_none() && d.path().is_some()));
}

#[tokio::test]
async fn test_collect_documents_copy_reads_bytes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let file = temp_dir.path().join("scan.pdf");
    std::fs::write(&file, b"pdf").unwrap();

    let documents = collect_documents(&[file], true).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].bytes().map(|b| b.to_vec()), Some(b"pdf".to_vec()));
    assert_eq!(documents[0].file_name().as_deref(), Some("scan.pdf"));
}

#[tokio::test]
async fn test_collect_documents_missing_input() {
    let err = collect_documents(&[PathBuf::from("/nonexistent/scan.pdf")], false)
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Configuration { .. }));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_build_config_overrides() {
    let command = parse(&[
        "pattern",
        "-p",
        "x",
        "-a",
        "out.zip",
        "-o",
        "renamed",
        "--work-dir",
        "/tmp/docsort-test",
        "--unresolved",
        "keep-original",
        "--text-dump",
        "--no-log",
        "in.pdf",
    ]);
    assert_eq!(command.batch().unresolved, Some(PolicyArg::KeepOriginal));

    let config = build_config(command.batch());
    assert_eq!(config.work_dir, PathBuf::from("/tmp/docsort-test"));
    assert_eq!(config.output_dir, Some(PathBuf::from("renamed")));
    assert_eq!(config.unresolved_policy, UnresolvedPolicy::KeepOriginal);
    assert!(config.include_text_dump);
    assert!(!config.embed_audit_log);
}

// ============================================================================
// Batch runs
// ============================================================================

#[tokio::test]
async fn test_execute_pattern_batch_with_copy() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("scan.pdf");
    std::fs::write(&input, create_test_pdf("Invoice 42")).unwrap();
    let archive = temp_dir.path().join("out").join("batch.zip");
    let work_dir = temp_dir.path().join("jobs");

    let command = parse(&[
        "pattern",
        "-p",
        "invoice",
        "--copy",
        "-a",
        archive.to_str().unwrap(),
        "--work-dir",
        work_dir.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    let summary = execute(command).await.unwrap();

    assert_eq!(summary.documents, 1);
    assert!(summary.progress.done);
    assert_eq!(summary.archive_bytes, std::fs::metadata(&archive).unwrap().len());
    assert!(input.exists(), "copy must leave the original in place");

    let entries = zip_entries(&archive);
    assert!(entries.contains(&AUDIT_LOG_ENTRY.to_string()));
    assert_eq!(entries.iter().filter(|e| e.ends_with(".pdf")).count(), 1);
    assert!(!work_dir.join(&summary.job_id).exists());
}

#[tokio::test]
async fn test_unwritable_archive_keeps_moved_original() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("scan.pdf");
    let content = create_test_pdf("Invoice 42");
    std::fs::write(&input, &content).unwrap();
    // The archive destination is a directory, so writing it fails.
    let archive = temp_dir.path().join("taken");
    std::fs::create_dir(&archive).unwrap();
    let work_dir = temp_dir.path().join("jobs");

    let command = parse(&[
        "pattern",
        "-p",
        "invoice",
        "-a",
        archive.to_str().unwrap(),
        "--work-dir",
        work_dir.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    let err = execute(command).await.unwrap_err();
    assert!(matches!(err, CommandError::StorageError { .. }));
    assert!(!input.exists());

    let renamed_root = work_dir.join(docsort_core::jobs::RENAMED_DIR);
    let job_dirs: Vec<_> = std::fs::read_dir(&renamed_root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(job_dirs.len(), 1);
    let moved: Vec<_> = std::fs::read_dir(&job_dirs[0])
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(moved.len(), 1);
    assert_eq!(std::fs::read(&moved[0]).unwrap(), content);
}

#[tokio::test]
async fn test_execute_nothing_renamed_reports_job_failed() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("photo.png");
    std::fs::write(&input, b"not decoded").unwrap();
    let archive = temp_dir.path().join("batch.zip");

    let command = parse(&[
        "pattern",
        "-p",
        "anything",
        "-a",
        archive.to_str().unwrap(),
        "--work-dir",
        temp_dir.path().join("jobs").to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    let err = execute(command).await.unwrap_err();

    assert!(matches!(err, CommandError::JobFailed { .. }));
    assert!(!archive.exists());
    assert!(input.exists());
}

#[tokio::test]
async fn test_execute_sheet_with_missing_column() {
    let temp_dir = tempfile::tempdir().unwrap();
    let sheet = temp_dir.path().join("people.csv");
    std::fs::write(&sheet, "Name,Code\napple,A1\n").unwrap();
    let input = temp_dir.path().join("a.pdf");
    std::fs::write(&input, b"%PDF").unwrap();

    let command = parse(&[
        "sheet",
        "--sheet",
        sheet.to_str().unwrap(),
        "--find",
        "Nome",
        "--name",
        "Code",
        "-a",
        temp_dir.path().join("out.zip").to_str().unwrap(),
        "--work-dir",
        temp_dir.path().join("jobs").to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    let err = execute(command).await.unwrap_err();

    assert!(matches!(err, CommandError::Configuration { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(input.exists());
}

#[tokio::test]
async fn test_execute_generic_without_pattern() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("a.pdf");
    std::fs::write(&input, b"%PDF").unwrap();

    let command = parse(&[
        "pattern",
        "-a",
        temp_dir.path().join("out.zip").to_str().unwrap(),
        "--work-dir",
        temp_dir.path().join("jobs").to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    let err = execute(command).await.unwrap_err();
    assert!(matches!(err, CommandError::Configuration { .. }));
}
