use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn catidx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("catidx");
    path
}

const PARTS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PIES>
  <Header><PIESVersion>7.2</PIESVersion></Header>
  <Items>
    <Item MaintenanceType="A">
      <PartNumber>ABC123</PartNumber>
      <BrandAAIAID>BBVL</BrandAAIAID>
      <BrandLabel>Acme Brakes</BrandLabel>
      <Descriptions>
        <Description DescriptionCode="SHORT" LanguageCode="EN">Brake Pad</Description>
      </Descriptions>
      <Prices>
        <Pricing PriceType="LST"><CurrencyCode>USD</CurrencyCode><Price>19.99</Price></Pricing>
      </Prices>
    </Item>
    <Item>
      <BrandLabel>Orphan</BrandLabel>
    </Item>
    <Item>
      <PartNumber>XYZ9</PartNumber>
      <PartInterchangeInfo>
        <PartInterchange BrandAAIAID="ZZZZ" BrandLabel="Rival">
          <PartNumber InterchangeQuantity="1">R-1</PartNumber>
        </PartInterchange>
      </PartInterchangeInfo>
    </Item>
  </Items>
</PIES>
"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let feeds_dir = root.join("feeds");
    fs::create_dir_all(feeds_dir.join("nested")).unwrap();
    fs::write(feeds_dir.join("parts.xml"), PARTS_FEED).unwrap();
    fs::write(
        feeds_dir.join("nested/more.xml"),
        "<Items><Item><PartNumber>N-1</PartNumber></Item></Items>",
    )
    .unwrap();
    fs::write(feeds_dir.join("readme.txt"), "not a feed").unwrap();

    let config_content = format!(
        r#"[feed]
root = "{}/feeds"
include_globs = ["**/*.xml"]

[index]
name = "parts_core"
batch_size = 2

[logging]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("catidx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_catidx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = catidx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run catidx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn feed_path(config_path: &Path, name: &str) -> String {
    let root = config_path.parent().unwrap().parent().unwrap();
    root.join("feeds").join(name).to_str().unwrap().to_string()
}

#[test]
fn test_parse_prints_items_as_json_lines() {
    let (_tmp, config_path) = setup_test_env();
    let feed = feed_path(&config_path, "parts.xml");

    let (stdout, stderr, success) = run_catidx(&config_path, &["parse", &feed]);
    assert!(success, "parse failed: stdout={}, stderr={}", stdout, stderr);

    let items: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["partNumber"], "ABC123");
    assert_eq!(items[0]["descriptions"][0]["text"], "Brake Pad");
    assert_eq!(items[1]["partNumber"], "");
    assert_eq!(items[2]["partInterchangeInfo"][0]["productId"], "XYZ9");
    assert_eq!(items[2]["partInterchangeInfo"][0]["partNumberTo"], "R-1");
}

#[test]
fn test_parse_limit() {
    let (_tmp, config_path) = setup_test_env();
    let feed = feed_path(&config_path, "parts.xml");

    let (stdout, _, success) = run_catidx(&config_path, &["parse", &feed, "--limit", "1"]);
    assert!(success);
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_parse_limit_stops_before_reading_further() {
    let (tmp, config_path) = setup_test_env();
    let broken = tmp.path().join("broken_tail.xml");
    fs::write(
        &broken,
        "<Items><Item><PartNumber>A</PartNumber></Item><Item><PartNumber>B</Item></Items>",
    )
    .unwrap();

    let (stdout, stderr, success) = run_catidx(
        &config_path,
        &["parse", broken.to_str().unwrap(), "--limit", "1"],
    );
    assert!(success, "limit should stop before the broken item: stderr={}", stderr);
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_parse_malformed_feed_fails() {
    let (tmp, config_path) = setup_test_env();
    let broken = tmp.path().join("broken.xml");
    fs::write(
        &broken,
        "<Items><Item><PartNumber>A</PartNumber></Item><Item><PartNumber>B</Item></Items>",
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_catidx(&config_path, &["parse", broken.to_str().unwrap()]);
    assert!(!success, "malformed feed should fail");
    assert!(stderr.contains("broken.xml"), "stderr={}", stderr);
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_index_writes_batches_and_commit() {
    let (tmp, config_path) = setup_test_env();
    let feed = feed_path(&config_path, "parts.xml");
    let out = tmp.path().join("out/docs.jsonl");

    let (stdout, stderr, success) = run_catidx(
        &config_path,
        &["index", &feed, "--output", out.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("index parts_core"));
    assert!(stdout.contains("items parsed: 3"));
    assert!(stdout.contains("documents built: 2"));
    assert!(stdout.contains("items skipped: 1"));
    assert!(stdout.contains("child documents: 3"));
    assert!(stdout.contains("batches submitted: 1"));
    assert!(stdout.contains("ok"));

    let written = fs::read_to_string(&out).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    let batch: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(batch.as_array().unwrap().len(), 2);
    assert_eq!(batch[0]["productId"], "ABC123");
    assert_eq!(batch[0]["brandLabel"], "Acme Brakes");
    assert_eq!(batch[0]["descriptions"], "SHORT (EN): Brake Pad");
    assert_eq!(batch[0]["prices"], "PriceType=LST, CurrencyCode=USD, Price=19.99");
    assert_eq!(batch[0]["_childDocuments_"][1]["type"], "price - ABC123");
    assert_eq!(batch[0]["_childDocuments_"][1]["priceValue"], "19.99");
    assert_eq!(batch[1]["productId"], "XYZ9");
    assert_eq!(
        batch[1]["_childDocuments_"][0]["interchange_partBrandLabel"],
        "Rival"
    );
    assert_eq!(lines[1], r#"{"commit":{}}"#);
}

#[test]
fn test_index_discovers_feeds_from_config() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("docs.jsonl");
    let items = tmp.path().join("items.jsonl");

    let (stdout, stderr, success) = run_catidx(
        &config_path,
        &[
            "index",
            "--output",
            out.to_str().unwrap(),
            "--items",
            items.to_str().unwrap(),
            "--progress",
            "json",
        ],
    );
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("feed: "));
    assert!(stdout.contains("items parsed: 4"));
    assert!(stderr.contains(r#""phase":"discovering""#));

    let item_lines = fs::read_to_string(&items).unwrap();
    assert_eq!(item_lines.lines().count(), 4);

    // One commit per feed.
    let docs = fs::read_to_string(&out).unwrap();
    let commits = docs.lines().filter(|l| *l == r#"{"commit":{}}"#).count();
    assert_eq!(commits, 2);
}

#[test]
fn test_index_dry_run_writes_nothing() {
    let (tmp, config_path) = setup_test_env();
    let feed = feed_path(&config_path, "parts.xml");
    let out = tmp.path().join("dry.jsonl");

    let (stdout, stderr, success) = run_catidx(
        &config_path,
        &["index", &feed, "--dry-run", "--output", out.to_str().unwrap()],
    );
    assert!(success, "dry run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("documents built: 2"));
    assert!(!out.exists());
}

#[test]
fn test_index_to_stdout_keeps_summary_on_stderr() {
    let (_tmp, config_path) = setup_test_env();
    let feed = feed_path(&config_path, "nested/more.xml");

    let (stdout, stderr, success) =
        run_catidx(&config_path, &["index", &feed, "--progress", "off"]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    let batch: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(batch[0]["productId"], "N-1");
    assert!(stderr.contains("items parsed: 1"));
}

#[test]
fn test_feeds_lists_discovered_files() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_catidx(&config_path, &["feeds"]);
    assert!(success, "feeds failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("FEED"));
    assert!(stdout.contains("parts.xml"));
    assert!(stdout.contains("nested/more.xml"));
    assert!(!stdout.contains("readme.txt"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[index]\nbatch_size = 0\n").unwrap();

    let (_, stderr, success) = run_catidx(&bad, &["feeds"]);
    assert!(!success);
    assert!(stderr.contains("batch_size"));
}

#[test]
fn test_completions() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_catidx(&config_path, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("catidx"));
}
