use crate::reduce::{ReduceOptions, reduce};
use crate::report::CheckReport;
use crate::sitemap::SitemapOracle;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use wraith_render::{RenderOptions, execute_render};
use wraith_scanner::Classifier;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Options for configuring a full check run.
pub struct CheckOptions {
    pub urls: Vec<String>,
    /// Worker pool size for the HTTP phase.
    pub threads: usize,
    /// Browser workers for the JS phase.
    pub processes: usize,
    pub user_agent: String,
    /// Reducer: maximum non-empty path segments.
    pub max_depth: usize,
    /// Reducer: maximum consecutive repeats of one segment.
    pub max_repeats: usize,
    /// Cap on URLs sent into classification. Applies to the pending tail
    /// only; sitemap-confirmed results are never truncated.
    pub max_urls: Option<usize>,
    /// Wall-clock ceiling on the JS phase.
    pub js_ceiling: Duration,
    /// Per-navigation timeout in the JS phase.
    pub navigation_timeout: Duration,
    pub show_progress_bars: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            threads: 50,
            processes: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_depth: 20,
            max_repeats: 2,
            max_urls: None,
            js_ceiling: Duration::from_secs(10 * 60 * 60),
            navigation_timeout: Duration::from_secs(15),
            show_progress_bars: false,
        }
    }
}

/// Run the whole pipeline: reduce, consult sitemaps, classify over HTTP,
/// re-check the JS stragglers in a browser, merge. Network trouble never
/// fails the run; whatever was confirmed live is returned.
pub async fn execute_check(options: CheckOptions) -> Result<CheckReport, String> {
    let CheckOptions {
        urls,
        threads,
        processes,
        user_agent,
        max_depth,
        max_repeats,
        max_urls,
        js_ceiling,
        navigation_timeout,
        show_progress_bars,
    } = options;

    let run_started = Instant::now();
    let input_count = urls.len();

    // Stage 1: reduction, no network involved.
    let reduced = reduce(
        urls,
        ReduceOptions {
            max_depth,
            max_repeats,
        },
    );
    info!("Reduced {} input URLs to {}", input_count, reduced.len());
    let reduced_count = reduced.len();

    // Stage 2: sitemap oracle.
    let spinner = show_progress_bars.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Consulting sitemaps...");
        pb
    });

    let mut oracle = SitemapOracle::new(&user_agent);
    let (confirmed, mut pending) = oracle.partition(reduced).await;

    if let Some(pb) = spinner {
        pb.finish_with_message(format!("Sitemaps confirmed {} URLs", confirmed.len()));
    }

    // Confirmed results are never truncated; the cap trims only what still
    // needs classifying.
    if let Some(cap) = max_urls
        && pending.len() > cap
    {
        info!(
            "Capping classification at {} of {} pending URLs",
            cap,
            pending.len()
        );
        pending.truncate(cap);
    }
    let classified_count = pending.len();

    // Stage 3: HTTP classification.
    let bar = show_progress_bars.then(|| {
        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb.set_message("classifying");
        pb
    });

    let mut classifier = Classifier::new(&user_agent);
    if let Some(pb) = &bar {
        let pb = pb.clone();
        classifier = classifier.with_progress_callback(Arc::new(
            move |_worker_id: usize, _url: String| {
                pb.inc(1);
            },
        ));
    }

    let http_started = Instant::now();
    let classified = classifier
        .classify_all(pending, threads)
        .await
        .map_err(|e| format!("HTTP classification failed: {}", e))?;
    let http_elapsed = http_started.elapsed();

    if let Some(pb) = bar {
        pb.finish_with_message(format!(
            "{} live, {} queued for JS",
            classified.live.len(),
            classified.needs_js.len()
        ));
    }

    // Stage 4: JS fallback over the deduplicated queue.
    let mut seen = HashSet::new();
    let needs_js: Vec<String> = classified
        .needs_js
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect();
    let needs_js_count = needs_js.len();

    let js_spinner = (show_progress_bars && !needs_js.is_empty()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Rendering {} URLs in headless browsers...", needs_js_count));
        pb
    });

    let js_started = Instant::now();
    let js_live = execute_render(
        needs_js,
        RenderOptions {
            processes,
            navigation_timeout,
            ceiling: js_ceiling,
        },
    )
    .await;
    let js_elapsed = js_started.elapsed();

    if let Some(pb) = js_spinner {
        pb.finish_with_message(format!("Rendering confirmed {} URLs", js_live.len()));
    }

    // Merge: set union over final URLs, first occurrence wins.
    let http_live_count = classified.live.len();
    let js_live_count = js_live.len();
    let mut seen = HashSet::new();
    let mut live_urls = Vec::new();
    for url in confirmed
        .iter()
        .chain(classified.live.iter())
        .chain(js_live.iter())
    {
        if seen.insert(url.clone()) {
            live_urls.push(url.clone());
        }
    }

    Ok(CheckReport {
        input_count,
        reduced_count,
        sitemap_confirmed: confirmed.len(),
        classified_count,
        http_live: http_live_count,
        needs_js: needs_js_count,
        js_live: js_live_count,
        live_urls,
        http_elapsed,
        js_elapsed,
        total_elapsed: run_started.elapsed(),
    })
}
