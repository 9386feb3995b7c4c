//! Integration tests for PDF and DOCX documents in the filesystem corpus.
//!
//! Extracted Office text is chunked, indexed and cited like plain text;
//! files that fail extraction are skipped without failing the command.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn brief_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("brief");
    path
}

/// Minimal docx (ZIP) whose word/document.xml holds one paragraph per entry.
fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn setup_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    let files = root.join("files");
    fs::create_dir_all(files.join("Meridian Health Partners/Vendor Review")).unwrap();
    fs::write(
        files.join("Meridian Health Partners/Vendor Review/notes.md"),
        "# Notes\n\nThe vendor review began in March.\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[corpus]
root = "{}/files"
include_globs = ["**/*.md", "**/*.txt", "**/*.pdf", "**/*.docx"]
seed_demo = false

[chunking]
window_words = 80
overlap_words = 10
"#,
        root.display()
    );
    let config_path = root.join("config").join("brief.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, files)
}

fn run_brief(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = brief_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run brief: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn docx_is_searchable_and_tagged() {
    let (_tmp, config_path, files) = setup_env();
    fs::write(
        files.join("Meridian Health Partners/Vendor Review/Vendor_NDA.docx"),
        minimal_docx(&[
            "Mutual Nondisclosure Agreement",
            "The vendor shall keep patient records confidential for five years.",
        ]),
    )
    .unwrap();

    let (stdout, stderr, success) = run_brief(&config_path, &["search", "patient records"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(
        stdout.contains("1. Vendor_NDA.docx (Meridian Health Partners / Vendor Review)"),
        "got: {}",
        stdout
    );
}

#[test]
fn docx_answers_questions() {
    let (_tmp, config_path, files) = setup_env();
    fs::write(
        files.join("Meridian Health Partners/Vendor Review/Vendor_NDA.docx"),
        minimal_docx(&["The vendor shall keep patient records confidential for five years."]),
    )
    .unwrap();

    let (stdout, _, success) = run_brief(
        &config_path,
        &["ask", "How long must patient records stay confidential?", "--json"],
    );
    assert!(success);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(v["answer"].as_str().unwrap().contains("five years"));
    assert_eq!(v["sources"][0]["document"], "Vendor_NDA.docx");
}

#[test]
fn broken_pdf_is_skipped() {
    let (_tmp, config_path, files) = setup_env();
    fs::write(files.join("bad.pdf"), b"not a valid pdf").unwrap();

    let (stdout, stderr, success) = run_brief(&config_path, &["stats", "--json"]);
    assert!(success, "stats must succeed: stderr={}", stderr);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["documents"], 1);
    assert!(stderr.contains("skipping unreadable file"), "stderr={}", stderr);
}

#[test]
fn docx_without_body_is_skipped() {
    let (_tmp, config_path, files) = setup_env();
    let mut buf = Vec::new();
    {
        let zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.finish().unwrap();
    }
    fs::write(files.join("empty.docx"), buf).unwrap();

    let (stdout, stderr, success) = run_brief(&config_path, &["documents"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("notes.md"));
    assert!(!stdout.contains("empty.docx"));
}

#[test]
fn unlisted_extension_is_ignored() {
    let (_tmp, config_path, files) = setup_env();
    fs::write(files.join("scan.png"), [0u8, 1, 2, 3]).unwrap();

    let (stdout, _, success) = run_brief(&config_path, &["stats", "--json"]);
    assert!(success);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["documents"], 1);
}
