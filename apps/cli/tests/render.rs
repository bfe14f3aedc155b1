use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const INPUT: &str = r#"{
    "brand": "Brand X",
    "records": [
        {
            "confirmed_source": "Marketplace",
            "using_company": "X Corp",
            "company_name": "Acme",
            "store_url": "http://a.example",
            "order_name": "Kim",
            "phone": "010-1111-2222"
        },
        { "company_name": "Beta" }
    ],
    "reported": [
        { "company": "Foo", "url": "http://foo.example" }
    ]
}"#;

#[test]
fn render_writes_png_pdf_and_preview() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = write_config(temp.path(), r#"{ "layout": { "title": "Weekly report" } }"#)?;
    let input = temp.path().join("input.json");
    fs::write(&input, INPUT)?;
    let out_dir = temp.path().join("out");

    cli()?
        .arg("--config")
        .arg(&config)
        .args(["render", "--format", "both", "--page", "a4-150", "--preview"])
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let pngs = files_with_extension(&out_dir, "png")?;
    assert_eq!(pngs.len(), 2, "page and preview expected: {pngs:?}");
    for png in &pngs {
        let name = file_name(png);
        assert!(name.starts_with("Weekly_report_"), "{name}");
        let bytes = fs::read(png)?;
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"), "{name} is not a PNG");
    }
    assert!(pngs.iter().any(|png| file_name(png).ends_with("_preview.png")));

    let pdfs = files_with_extension(&out_dir, "pdf")?;
    assert_eq!(pdfs.len(), 1);
    let pdf = fs::read(&pdfs[0])?;
    assert!(pdf.starts_with(b"%PDF-1.4"));
    Ok(())
}

#[test]
fn render_without_records_warns_and_writes_nothing() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = write_config(temp.path(), "{}")?;
    let input = temp.path().join("empty.json");
    fs::write(&input, r#"{ "reported": [{ "company": "Foo" }] }"#)?;
    let out_dir = temp.path().join("out");

    cli()?
        .arg("--config")
        .arg(&config)
        .arg("render")
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: add at least one record before rendering",
        ));

    assert!(!out_dir.exists());
    Ok(())
}

#[test]
fn render_rejects_unknown_page_preset() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("input.json");
    fs::write(&input, INPUT)?;

    cli()?
        .args(["render", "--page", "letter"])
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown page preset 'letter'"));
    Ok(())
}

#[test]
fn summary_lists_records_and_reported_companies() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("input.json");
    fs::write(&input, INPUT)?;

    cli()?
        .arg("summary")
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("[신고 및 단속완료 요약]"))
        .stdout(predicate::str::contains("#1 [Acme] Marketplace"))
        .stdout(predicate::str::contains(
            " - 주문자명: Kim, 연락처: 010-1111-2222",
        ))
        .stdout(predicate::str::contains("#2 [Beta]"))
        .stdout(predicate::str::contains(" - URL: -"))
        .stdout(predicate::str::contains("[신고 완료 업체]"))
        .stdout(predicate::str::contains("1. Foo"))
        .stdout(predicate::str::contains("   - URL: http://foo.example"));
    Ok(())
}

#[test]
fn configured_capacity_limits_input_records() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = write_config(temp.path(), r#"{ "session": { "max_records": 1 } }"#)?;
    let input = temp.path().join("input.json");
    fs::write(&input, INPUT)?;

    cli()?
        .arg("--config")
        .arg(&config)
        .arg("summary")
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: at most 1 records can be entered",
        ))
        .stdout(predicate::str::contains("#1 [Acme]"))
        .stdout(predicate::str::contains("#2 [Beta]").not());
    Ok(())
}

#[test]
fn malformed_input_reports_the_file() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("broken.json");
    fs::write(&input, "{ records: ")?;

    cli()?
        .arg("summary")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"))
        .stderr(predicate::str::contains("broken.json"));
    Ok(())
}

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("reportsheet")?)
}

/// Writes preferences that keep rendering on the built-in face.
fn write_config(dir: &Path, overrides: &str) -> Result<PathBuf, Box<dyn Error>> {
    let mut value: serde_json::Value = serde_json::from_str(overrides)?;
    value["fonts"] = serde_json::json!({ "use_system_fonts": false });
    let path = dir.join("preferences.json");
    fs::write(&path, serde_json::to_string_pretty(&value)?)?;
    Ok(path)
}

fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|value| value.to_str()) == Some(ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
