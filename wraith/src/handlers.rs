use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use wraith_core::output::{remove_stale_output, write_live_urls};
use wraith_core::{CheckOptions, execute_check, generate_check_report};

/// Load and parse URLs from a newline-delimited file.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read input file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed.
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("[!] Skipping invalid URL '{}'", line);
    None
}

pub async fn handle_check(sub_matches: &ArgMatches) {
    // Logging level follows -v / -vv.
    let level = match sub_matches.get_count("verbose") {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let input_file = sub_matches.get_one::<String>("input-file").unwrap();
    let output_file = sub_matches.get_one::<String>("output-file").unwrap();
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&50);
    let processes = sub_matches.get_one::<usize>("processes").copied();
    let user_agent = sub_matches.get_one::<String>("user-agent").unwrap().clone();
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&20);
    let max_repeats = *sub_matches.get_one::<usize>("max-repeats").unwrap_or(&2);
    let max_urls = sub_matches.get_one::<usize>("max-urls").copied();
    let js_ceiling_secs = *sub_matches
        .get_one::<u64>("js-ceiling-secs")
        .unwrap_or(&36_000);
    let json_summary = sub_matches.get_flag("json");

    let input_path = PathBuf::from(shellexpand::tilde(input_file).as_ref());
    let output_path = PathBuf::from(shellexpand::tilde(output_file).as_ref());

    let urls = match load_urls_from_file(&input_path) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let mut options = CheckOptions {
        urls,
        threads,
        user_agent,
        max_depth,
        max_repeats,
        max_urls,
        js_ceiling: Duration::from_secs(js_ceiling_secs),
        show_progress_bars: true, // Enable progress bars in CLI mode
        ..CheckOptions::default()
    };
    if let Some(processes) = processes {
        options.processes = processes;
    }

    // Print check configuration
    println!("\nChecking {} candidate URLs", options.urls.len());
    println!("HTTP workers: {}", options.threads);
    println!("Browser workers: {}", options.processes);
    println!("JS ceiling: {}s", options.js_ceiling.as_secs());
    if let Some(cap) = options.max_urls {
        println!("Classification cap: {}", cap);
    }
    println!();

    // A fresh run never inherits last run's output.
    remove_stale_output(&output_path);

    let report = match execute_check(options).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Check failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_live_urls(&output_path, &report.live_urls) {
        eprintln!(
            "{} Failed to write {}: {}",
            "✗".red().bold(),
            output_path.display(),
            e
        );
        std::process::exit(1);
    }

    println!("\n{} Check complete!\n", "✓".green().bold());
    if json_summary {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} Could not serialize summary: {}", "✗".red().bold(), e),
        }
    } else {
        print!("{}", generate_check_report(&report));
    }
    println!(
        "\n{} {} live URLs written to {}",
        "✓".green().bold(),
        report.live_urls.len().to_string().cyan(),
        output_path.display().to_string().bright_white()
    );
}
