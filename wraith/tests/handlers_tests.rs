use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use wraith::handlers::*;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "httpbin.org")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "https://api.example.com")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://httpbin.org");
    assert_eq!(urls[2], "https://api.example.com");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_urls_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_file_missing() {
    let result = load_urls_from_file(&PathBuf::from("/definitely/not/here.txt"));
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Failed to read input file"));
}

#[test]
fn test_generate_check_report_counters() {
    use std::time::Duration;
    use wraith::CheckReport;

    let report = CheckReport {
        input_count: 10,
        reduced_count: 8,
        sitemap_confirmed: 2,
        classified_count: 6,
        http_live: 3,
        needs_js: 2,
        js_live: 1,
        live_urls: vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ],
        http_elapsed: Duration::from_secs(4),
        js_elapsed: Duration::from_secs(9),
        total_elapsed: Duration::from_secs(14),
    };

    let rendered = wraith::generate_check_report(&report);
    assert!(rendered.contains("Input URLs:          10"));
    assert!(rendered.contains("Sitemap-confirmed:   2"));
    assert!(rendered.contains("Queued for JS:       2"));
    assert!(rendered.contains("Live total:          2"));
}
