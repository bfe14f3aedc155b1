use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use tempfile::tempdir;

#[test]
fn config_set_persists_sanitized_values() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("nested").join("preferences.json");

    cli()?
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "--page", "A4-150", "--max-records", "500"])
        .args(["--wrap-width", "40", "--title", "Weekly report"])
        .args(["--card-background", "true", "--system-fonts", "false"])
        .args(["--font", "/fonts/a.ttf", "--font", "/fonts/a.ttf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved preferences to"));

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config)?)?;
    assert_eq!(saved["layout"]["page"], "a4-150");
    assert_eq!(saved["session"]["max_records"], 200);
    assert_eq!(saved["layout"]["wrap_width"], 40);
    assert_eq!(saved["layout"]["title"], "Weekly report");
    assert_eq!(saved["layout"]["card_background"], true);
    assert_eq!(saved["layout"]["reported_section"], true);
    assert_eq!(saved["fonts"]["use_system_fonts"], false);
    assert_eq!(saved["fonts"]["candidates"], serde_json::json!(["/fonts/a.ttf"]));
    Ok(())
}

#[test]
fn config_set_keeps_untouched_values_and_show_reads_them() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("preferences.json");
    fs::write(
        &config,
        r#"{ "session": { "max_records": 5 }, "layout": { "title": "Old" } }"#,
    )?;

    cli()?
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "--title", "", "--reported-section", "false"])
        .assert()
        .success();

    cli()?
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""max_records": 5"#))
        .stdout(predicate::str::contains(r#""reported_section": false"#))
        .stdout(predicate::str::contains("Old").not());
    Ok(())
}

#[test]
fn configured_capacity_applies_to_later_runs() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("preferences.json");
    let script = temp.path().join("session.txt");
    fs::write(&script, "add company_name=A\nadd company_name=B\nsummary\n")?;

    cli()?
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "--max-records", "1"])
        .assert()
        .success();

    cli()?
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: line 2: at most 1 records can be entered",
        ))
        .stdout(predicate::str::contains("#1 [A]"))
        .stdout(predicate::str::contains("#2 [B]").not());
    Ok(())
}

#[test]
fn config_requires_a_path() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config commands need --config PATH"));
    Ok(())
}

#[test]
fn config_set_rejects_unknown_page_preset() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("preferences.json");

    cli()?
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "--page", "letter"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown page preset 'letter'"));

    assert!(!config.exists());
    Ok(())
}

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("reportsheet")?)
}
