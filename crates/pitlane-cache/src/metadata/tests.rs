//! Unit tests for metadata URL injection

use super::*;
use percent_encoding::percent_decode_str;
use proptest::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const BASE: &str = "http://example.com";

fn injector(blacklist: &[&str], overwrite: bool) -> MetadataInjector {
    MetadataInjector::new(
        Url::parse(BASE).unwrap(),
        blacklist.iter().map(|s| s.to_string()).collect(),
        overwrite,
    )
    .unwrap()
}

/// Create an item with the given metadata document, returning its directory
fn create_item(install_root: &Path, kind: AssetKind, name: &str, metadata: &str) -> PathBuf {
    let item_dir = kind.item_dir(install_root, name);
    let metadata_path = item_dir.join(kind.metadata_rel_path());
    fs::create_dir_all(metadata_path.parent().unwrap()).unwrap();
    fs::write(&metadata_path, metadata).unwrap();
    item_dir
}

fn read_metadata(item_dir: &Path, kind: AssetKind) -> Map<String, Value> {
    let raw = fs::read(item_dir.join(kind.metadata_rel_path())).unwrap();
    serde_json::from_slice(&raw).unwrap()
}

fn install_root() -> TempDir {
    tempdir().unwrap()
}

#[test]
fn test_download_url_format() {
    let injector = injector(&[], false);
    assert_eq!(
        injector.download_url(AssetKind::Car, "ferrari_f40"),
        "http://example.com/download/cars/ferrari_f40"
    );
    assert_eq!(
        injector.download_url(AssetKind::Track, "monza"),
        "http://example.com/download/tracks/monza"
    );
}

#[test]
fn test_download_url_escapes_reserved_characters() {
    let injector = injector(&[], false);
    assert_eq!(
        injector.download_url(AssetKind::Car, "my car/v2?#"),
        "http://example.com/download/cars/my%20car%2Fv2%3F%23"
    );
}

#[test]
fn test_download_url_keeps_control_characters() {
    let injector = injector(&[], false);
    assert_eq!(
        injector.download_url(AssetKind::Car, "a\tb"),
        "http://example.com/download/cars/a%09b"
    );
    assert_eq!(
        injector.download_url(AssetKind::Track, "line\r\nbreak"),
        "http://example.com/download/tracks/line%0D%0Abreak"
    );
    assert_eq!(
        injector.download_url(AssetKind::Car, "100%\\pure"),
        "http://example.com/download/cars/100%25%5Cpure"
    );
}

#[test]
fn test_download_url_uses_normalized_base() {
    let injector =
        MetadataInjector::new(Url::parse("HTTP://Example.COM:80").unwrap(), vec![], false).unwrap();
    assert_eq!(
        injector.download_url(AssetKind::Car, "abarth"),
        "http://example.com/download/cars/abarth"
    );
}

#[test]
fn test_download_url_base_variants() {
    let with_slash =
        MetadataInjector::new(Url::parse("http://example.com/").unwrap(), vec![], false).unwrap();
    assert_eq!(
        with_slash.download_url(AssetKind::Car, "abarth"),
        "http://example.com/download/cars/abarth"
    );

    let with_path =
        MetadataInjector::new(Url::parse("https://example.com/mods").unwrap(), vec![], false)
            .unwrap();
    assert_eq!(
        with_path.download_url(AssetKind::Track, "spa"),
        "https://example.com/mods/download/tracks/spa"
    );
}

#[test]
fn test_rejects_base_without_path() {
    let result = MetadataInjector::new(Url::parse("mailto:someone@example.com").unwrap(), vec![], false);
    assert!(matches!(result, Err(PitlaneError::ConfigValidation { .. })));
}

#[test]
fn test_sets_url_and_preserves_other_keys() {
    let root = install_root();
    let item_dir = create_item(
        root.path(),
        AssetKind::Car,
        "ferrari_f40",
        r#"{"name": "Ferrari F40", "author": "kunos", "specs": {"bhp": "471bhp"}, "tags": ["rwd", "turbo"], "year": 1987}"#,
    );

    let outcome = injector(&[], false)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::Updated);

    let document = read_metadata(&item_dir, AssetKind::Car);
    assert_eq!(
        document["downloadURL"],
        json!("http://example.com/download/cars/ferrari_f40")
    );
    assert_eq!(document["name"], json!("Ferrari F40"));
    assert_eq!(document["specs"], json!({"bhp": "471bhp"}));
    assert_eq!(document["tags"], json!(["rwd", "turbo"]));
    assert_eq!(document["year"], json!(1987));

    // Key order survives the rewrite, the new key goes last
    let keys: Vec<_> = document.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "author", "specs", "tags", "year", "downloadURL"]);
}

#[test]
fn test_item_name_is_percent_encoded() {
    let root = install_root();
    let item_dir = create_item(root.path(), AssetKind::Track, "ks nordschleife", r#"{"name": "Nordschleife"}"#);

    injector(&[], false)
        .rewrite_one(&item_dir, AssetKind::Track)
        .unwrap();

    let document = read_metadata(&item_dir, AssetKind::Track);
    assert_eq!(
        document["downloadURL"],
        json!("http://example.com/download/tracks/ks%20nordschleife")
    );
}

#[test]
fn test_blacklisted_author_is_untouched() {
    let root = install_root();
    let original = "{\n\"author\":\"john\",   \"name\":\"F40\"}";
    let item_dir = create_item(root.path(), AssetKind::Car, "ferrari_f40", original);

    let outcome = injector(&["someone", "john"], false)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::SkippedBlacklisted);

    let after = fs::read_to_string(item_dir.join("ui/ui_car.json")).unwrap();
    assert_eq!(after, original);
}

#[test]
fn test_blacklist_is_exact_match() {
    let root = install_root();
    let item_dir = create_item(root.path(), AssetKind::Car, "a", r#"{"author": "John"}"#);

    let outcome = injector(&["john"], false)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::Updated);
}

#[test]
fn test_non_string_author_is_coerced() {
    let root = install_root();
    let item_dir = create_item(root.path(), AssetKind::Car, "numbered", r#"{"author": 42}"#);

    let outcome = injector(&["42"], false)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::SkippedBlacklisted);
}

#[test]
fn test_existing_url_kept_without_overwrite() {
    let root = install_root();
    let original = r#"{"downloadURL": "https://elsewhere.example/f40.zip"}"#;
    let item_dir = create_item(root.path(), AssetKind::Car, "ferrari_f40", original);

    let outcome = injector(&[], false)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::SkippedExisting);
    assert_eq!(fs::read_to_string(item_dir.join("ui/ui_car.json")).unwrap(), original);
}

#[test]
fn test_existing_url_replaced_with_overwrite() {
    let root = install_root();
    let item_dir = create_item(
        root.path(),
        AssetKind::Car,
        "ferrari_f40",
        r#"{"downloadURL": "https://elsewhere.example/f40.zip"}"#,
    );

    let outcome = injector(&[], true)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::Updated);
    assert_eq!(
        read_metadata(&item_dir, AssetKind::Car)["downloadURL"],
        json!("http://example.com/download/cars/ferrari_f40")
    );
}

#[test]
fn test_empty_url_is_filled() {
    let root = install_root();
    let item_dir = create_item(root.path(), AssetKind::Car, "blank", r#"{"downloadURL": ""}"#);

    let outcome = injector(&[], false)
        .rewrite_one(&item_dir, AssetKind::Car)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::Updated);
}

#[test]
fn test_byte_order_mark_is_accepted() {
    let root = install_root();
    let item_dir = create_item(root.path(), AssetKind::Track, "bom", "\u{feff}{\"name\": \"BOM\"}");

    let outcome = injector(&[], false)
        .rewrite_one(&item_dir, AssetKind::Track)
        .unwrap();
    assert_eq!(outcome, RewriteOutcome::Updated);
    assert_eq!(read_metadata(&item_dir, AssetKind::Track)["name"], json!("BOM"));
}

#[test]
fn test_missing_metadata_is_read_error() {
    let root = install_root();
    let item_dir = AssetKind::Car.item_dir(root.path(), "bare");
    fs::create_dir_all(&item_dir).unwrap();

    let result = injector(&[], false).rewrite_one(&item_dir, AssetKind::Car);
    assert!(matches!(result, Err(PitlaneError::MetadataRead { .. })));
}

#[test]
fn test_invalid_json_is_parse_error() {
    let root = install_root();
    for (name, content) in [("broken", "{not json"), ("array", "[1, 2, 3]")] {
        let item_dir = create_item(root.path(), AssetKind::Car, name, content);
        let result = injector(&[], false).rewrite_one(&item_dir, AssetKind::Car);
        assert!(
            matches!(result, Err(PitlaneError::MetadataParse { .. })),
            "expected parse error for {}",
            name
        );
    }
}

#[test]
fn test_rewrite_all_collects_errors() {
    let root = install_root();
    let good_a = create_item(root.path(), AssetKind::Car, "a_good", r#"{"name": "A"}"#);
    create_item(root.path(), AssetKind::Car, "b_broken", "{oops");
    let good_c = create_item(root.path(), AssetKind::Car, "c_good", r#"{"name": "C"}"#);
    // Stray files next to item directories are ignored
    fs::write(AssetKind::Car.content_dir(root.path()).join("readme.txt"), "hi").unwrap();

    let errors = injector(&[], false).rewrite_all(root.path(), AssetKind::Car);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], PitlaneError::MetadataParse { .. }));

    // One bad item does not block the rest
    assert!(read_metadata(&good_a, AssetKind::Car).contains_key("downloadURL"));
    assert!(read_metadata(&good_c, AssetKind::Car).contains_key("downloadURL"));
}

#[test]
fn test_rewrite_all_missing_content_root() {
    let root = install_root();
    let errors = injector(&[], false).rewrite_all(root.path(), AssetKind::Track);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], PitlaneError::Io { .. }));
}

#[test]
fn test_rewrite_all_is_idempotent() {
    let root = install_root();
    let items = [
        create_item(root.path(), AssetKind::Car, "one", r#"{"author": "x"}"#),
        create_item(root.path(), AssetKind::Car, "two", r#"{"author": "john"}"#),
        create_item(root.path(), AssetKind::Car, "three", r#"{"downloadURL": "http://other/3"}"#),
    ];
    let injector = injector(&["john"], false);

    assert!(injector.rewrite_all(root.path(), AssetKind::Car).is_empty());
    let first: Vec<_> = items
        .iter()
        .map(|dir| fs::read(dir.join("ui/ui_car.json")).unwrap())
        .collect();

    assert!(injector.rewrite_all(root.path(), AssetKind::Car).is_empty());
    let second: Vec<_> = items
        .iter()
        .map(|dir| fs::read(dir.join("ui/ui_car.json")).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_rewrite_every_kind_report() {
    let root = install_root();
    create_item(root.path(), AssetKind::Car, "ferrari_f40", r#"{"author": "john"}"#);
    create_item(root.path(), AssetKind::Car, "abarth", r#"{"author": "kunos"}"#);
    create_item(root.path(), AssetKind::Track, "monza", r#"{"downloadURL": "http://x/monza"}"#);
    create_item(root.path(), AssetKind::Track, "spa", "not json");

    let report = injector(&["john"], false).rewrite_every_kind(root.path());
    assert_eq!(report.updated, 1);
    assert_eq!(report.blacklisted, 1);
    assert_eq!(report.existing, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.processed(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]
    /// Names made of unreserved characters appear verbatim after the route prefix
    #[test]
    fn unreserved_names_are_verbatim(name in "[A-Za-z0-9_.~-]{1,40}") {
        prop_assume!(name != "." && name != "..");
        let url = injector(&[], false).download_url(AssetKind::Car, &name);
        prop_assert_eq!(url, format!("{}/download/cars/{}", BASE, name));
    }

    /// Whatever the name, it stays a single path segment that decodes back to it
    #[test]
    fn names_stay_one_segment(name in "[\\PC\\x00-\\x1F\\x7F]{1,30}") {
        prop_assume!(name != "." && name != "..");
        let url = injector(&[], false).download_url(AssetKind::Track, &name);
        let parsed = Url::parse(&url).unwrap();
        let segments: Vec<_> = parsed.path_segments().unwrap().collect();
        prop_assert_eq!(segments.len(), 3);
        prop_assert_eq!(segments[0], "download");
        prop_assert_eq!(segments[1], "tracks");
        let decoded = percent_decode_str(segments[2]).decode_utf8().unwrap();
        prop_assert_eq!(decoded, name.as_str());
    }
}
