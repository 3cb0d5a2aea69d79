//! Credential record persistence tests

use keywatch::config::ApiCredentials;

#[test]
fn test_roundtrip_through_flat_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api_config.json");

    let credentials = ApiCredentials::new(123456, "0123456789abcdef");
    credentials.save(&path).unwrap();

    let loaded = ApiCredentials::load(&path).unwrap().unwrap();
    assert_eq!(loaded, credentials);
}

#[test]
fn test_load_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api_config.json");
    assert_eq!(ApiCredentials::load(&path).unwrap(), None);
}

#[test]
fn test_stored_id_is_a_string() {
    // The on-disk document keeps the numeric ID as a string, matching
    // config files written by earlier versions of the panel.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api_config.json");
    ApiCredentials::new(42, "hash").save(&path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["api_id"], "42");
    assert_eq!(raw["api_hash"], "hash");
}

#[test]
fn test_load_accepts_legacy_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api_config.json");
    std::fs::write(&path, r#"{"api_id": "123456", "api_hash": "abcdef"}"#).unwrap();

    let loaded = ApiCredentials::load(&path).unwrap().unwrap();
    assert_eq!(loaded.api_id, 123456);
    assert_eq!(loaded.api_hash, "abcdef");
}

#[test]
fn test_parse_validates_form_fields() {
    let parsed = ApiCredentials::parse(" 123456 ", " abcdef ").unwrap();
    assert_eq!(parsed.api_id, 123456);
    assert_eq!(parsed.api_hash, "abcdef");

    assert!(ApiCredentials::parse("not-a-number", "abcdef").is_err());
    assert!(ApiCredentials::parse("123", "   ").is_err());
}
