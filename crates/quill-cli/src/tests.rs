use std::path::PathBuf;

use pretty_assertions::assert_eq;
use quill_core::models::{Conflict, ConflictKind, Quote, QuoteId, ResolutionChoice};

use crate::error::CliError;
use crate::{
    format_conflict_lines, format_last_sync, format_quote_line, format_size_kb,
    format_sync_timestamp, open_store, parse_resolution_choice, resolve_data_dir,
    resolve_server_url, sync_config,
};

fn quote(id: i64, text: &str, category: &str) -> Quote {
    Quote {
        id: QuoteId::new(id),
        text: text.to_string(),
        category: category.to_string(),
        last_modified: None,
        source: None,
    }
}

#[test]
fn parse_resolution_choice_defaults_to_server() {
    assert_eq!(parse_resolution_choice(""), ResolutionChoice::Server);
    assert_eq!(parse_resolution_choice("s\n"), ResolutionChoice::Server);
    assert_eq!(parse_resolution_choice("server"), ResolutionChoice::Server);
    assert_eq!(parse_resolution_choice("anything"), ResolutionChoice::Server);
}

#[test]
fn parse_resolution_choice_accepts_local_spellings() {
    assert_eq!(parse_resolution_choice("l"), ResolutionChoice::Local);
    assert_eq!(parse_resolution_choice("  LOCAL \n"), ResolutionChoice::Local);
}

#[test]
fn format_quote_line_includes_id_category_and_text() {
    let line = format_quote_line(&quote(3, "Hello", "Wisdom"));
    assert_eq!(line, "#3 [Wisdom] \"Hello\"");
}

#[test]
fn format_conflict_lines_show_both_sides() {
    let conflicts = vec![Conflict {
        id: QuoteId::new(1),
        local: quote(1, "A", "X"),
        remote: quote(1, "B", "Y"),
        kind: ConflictKind::Modified,
    }];

    let lines = format_conflict_lines(&conflicts);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("quote 1"));
    assert!(lines[0].contains("local \"A\" [X]"));
    assert!(lines[0].contains("server \"B\" [Y]"));
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn format_last_sync_handles_absent_timestamp() {
    assert_eq!(format_last_sync(None), "Never");
    assert_eq!(format_last_sync(Some(0)), "1970-01-01 00:00:00 UTC");
}

#[test]
fn format_size_kb_rounds_to_two_decimals() {
    assert_eq!(format_size_kb(1024), "1.00 KB");
    assert_eq!(format_size_kb(1536), "1.50 KB");
}

#[test]
fn resolve_data_dir_prefers_explicit_flag() {
    let dir = resolve_data_dir(Some(PathBuf::from("/tmp/custom")));
    assert_eq!(dir, PathBuf::from("/tmp/custom"));
}

#[test]
fn resolve_server_url_requires_http_scheme() {
    assert_eq!(
        resolve_server_url(Some("https://api.example.com/posts".to_string())).unwrap(),
        Some("https://api.example.com/posts".to_string())
    );
    assert!(matches!(
        resolve_server_url(Some("api.example.com/posts".to_string())),
        Err(CliError::InvalidServerUrl(_))
    ));
}

#[test]
fn sync_config_applies_url_override() {
    let config = sync_config(Some("https://api.example.com/posts".to_string())).unwrap();
    assert_eq!(config.server_url, "https://api.example.com/posts");

    let default_config = sync_config(None).unwrap();
    assert_eq!(default_config.fetch_limit, 8);
}

#[test]
fn open_store_seeds_defaults_in_fresh_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).unwrap();
    assert_eq!(store.len(), 5);
    assert!(dir.path().join("store.json").exists());
}
