use crate::error::Result;
use crate::fetch::{build_client, fetch_with_retry};
use crate::result::{Classified, DeadReason, FetchedPage, Verdict};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tracing::{debug, info};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Phrases that mark a heading or title as an error page.
pub const BAD_PHRASES: &[&str] = &[
    "not found",
    "not exist",
    "don't exist",
    "can't be found",
    "invalid page",
    "invalid webpage",
    "invalid path",
    "cannot get path ",
];

/// Elements whose text gets scanned for bad phrases.
const PHRASE_SELECTORS: &str = "h1, h2, h3, title";

/// Phrases meaning the page only renders with JavaScript enabled.
const JS_REQUIRED_PHRASES: &[&str] = &[
    "enable javascript",
    "requires javascript",
    "javascript is disabled",
];

/// Path token guaranteed to point at a nonexistent resource.
const PROBE_SENTINEL: &str = "wr41th-p8zkq0vhe3";

/// Host-root equivalents, one row per variant; `{host}` is substituted with
/// the candidate's hostname. Extend by adding rows.
const ROOT_VARIANTS: &[&str] = &[
    "{host}",
    "http://{host}",
    "https://{host}",
    "http://{host}/",
    "https://{host}/",
    "http://{host}/#",
    "https://{host}/#",
    "http://{host}:80",
    "https://{host}:443",
    "http://{host}:80/",
    "https://{host}:443/",
    "http://{host}:80/#",
    "https://{host}:443/#",
];

const DEFAULT_TIMEOUT_SECS: u64 = 5;

type ProbeCache = Arc<Mutex<HashMap<String, Option<FetchedPage>>>>;

/// Heuristic soft-404 detector. One instance is shared across all workers of
/// a run so they see the same probe cache.
#[derive(Clone)]
pub struct Classifier {
    client: Client,
    probe_cache: ProbeCache,
    timeout: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl Classifier {
    pub fn new(user_agent: &str) -> Self {
        Self::with_timeout(user_agent, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(user_agent: &str, timeout_secs: u64) -> Self {
        Self {
            client: build_client(user_agent),
            probe_cache: Arc::new(Mutex::new(HashMap::new())),
            timeout: Duration::from_secs(timeout_secs),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Classify a batch with a bounded worker pool. Unreachable URLs are
    /// dropped; everything else lands in `live` or `needs_js` keyed by its
    /// final URL.
    pub async fn classify_all(&self, urls: Vec<String>, workers: usize) -> Result<Classified> {
        let total = urls.len();
        info!("Classifying {} URLs with {} workers", total, workers);

        let semaphore = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let urls_per_worker = total.div_ceil(workers.max(1));
        let mut worker_tasks = Vec::new();

        for worker_id in 0..workers {
            let start_idx = worker_id * urls_per_worker;
            if start_idx >= total {
                break;
            }
            let end_idx = std::cmp::min(start_idx + urls_per_worker, total);
            let worker_urls = urls[start_idx..end_idx].to_vec();

            let classifier = self.clone();
            let semaphore = semaphore.clone();
            let tx = tx.clone();

            worker_tasks.push(tokio::spawn(async move {
                for url in worker_urls {
                    let _permit = semaphore.acquire().await.unwrap();

                    if let Some(ref callback) = classifier.progress_callback {
                        callback(worker_id, url.clone());
                    }

                    if let Some(verdict) = classifier.classify(&url).await {
                        let _ = tx.send((url, verdict));
                    }
                }
            }));
        }
        drop(tx);

        for task in worker_tasks {
            task.await?;
        }

        let mut classified = Classified::default();
        while let Some((url, verdict)) = rx.recv().await {
            match verdict {
                Verdict::Live { final_url } => {
                    debug!("{} found legit at {}", url, final_url);
                    classified.live.push(final_url);
                }
                Verdict::NeedsJs { final_url } => {
                    debug!("{} deferred to the JS check as {}", url, final_url);
                    classified.needs_js.push(final_url);
                }
                Verdict::Dead { reason } => {
                    debug!("{} judged dead: {:?}", url, reason);
                }
            }
        }

        info!(
            "Classification done: {} live, {} queued for JS",
            classified.live.len(),
            classified.needs_js.len()
        );
        Ok(classified)
    }

    /// Classify one URL. `None` means unreachable: the URL is excluded from
    /// every output.
    pub async fn classify(&self, url: &str) -> Option<Verdict> {
        let page = match fetch_with_retry(&self.client, url, self.timeout).await {
            Ok(page) => page,
            Err(e) => {
                info!("{} unreachable after retry, dropping: {}", url, e);
                return None;
            }
        };

        // A literal 404 needs no probe.
        if page.status_code == 404 {
            return Some(Verdict::Dead {
                reason: DeadReason::Status404,
            });
        }

        let probe = self.probe_for(url).await;

        // Error text in a heading or title, unless the probe carries the same
        // boilerplate (then the whole site shares it and it proves nothing).
        if has_bad_phrase(&page.body) {
            let probe_matches_too = probe
                .as_ref()
                .map(|p| has_bad_phrase(&p.body))
                .unwrap_or(false);
            if !probe_matches_too {
                return Some(Verdict::Dead {
                    reason: DeadReason::BadPhrase,
                });
            }
            debug!("Bad phrase in {} suppressed, probe shows the same text", url);
        }

        // Quietly bounced back to the site root.
        if redirects_to_root(url, &page) {
            return Some(Verdict::Dead {
                reason: DeadReason::RootRedirect,
            });
        }

        if let Some(probe) = probe {
            // Landed on the same page the probe landed on.
            if page.final_url == probe.final_url {
                return Some(Verdict::Dead {
                    reason: DeadReason::ProbeRedirect,
                });
            }

            // The site answers missing pages with this same error status.
            if probe.status_code == page.status_code && matches!(page.status_code / 100, 4 | 5) {
                return Some(Verdict::Dead {
                    reason: DeadReason::SharedErrorStatus,
                });
            }

            // Same content as a guaranteed-missing page.
            if probe.body == page.body {
                return Some(Verdict::Dead {
                    reason: DeadReason::ProbeBodyMatch,
                });
            }

            // The probe errors differently, so this page is real.
            if probe.status_code != page.status_code {
                return Some(Verdict::Live {
                    final_url: page.final_url,
                });
            }
        }

        let lowered = page.body.to_lowercase();
        if JS_REQUIRED_PHRASES.iter().any(|p| lowered.contains(p)) {
            Some(Verdict::NeedsJs {
                final_url: page.final_url,
            })
        } else {
            Some(Verdict::Live {
                final_url: page.final_url,
            })
        }
    }

    /// Fetch (or reuse) the reference probe for a URL's directory. The cache
    /// lock is not held across the fetch: two tasks sharing a directory may
    /// both probe it, and the later insert wins.
    async fn probe_for(&self, url: &str) -> Option<FetchedPage> {
        let probe_url = probe_url_for(url)?;

        if let Some(cached) = self.probe_cache.lock().await.get(&probe_url) {
            return cached.clone();
        }

        let probe = match fetch_with_retry(&self.client, &probe_url, self.timeout).await {
            Ok(page) => Some(page),
            Err(e) => {
                info!("No reference probe at {}: {}", probe_url, e);
                None
            }
        };

        self.probe_cache
            .lock()
            .await
            .insert(probe_url, probe.clone());
        probe
    }
}

/// Derive the known-nonexistent probe URL for a candidate: paths with more
/// than one segment swap their last segment for the sentinel, shorter paths
/// get the sentinel appended.
pub fn probe_url_for(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let segments: Vec<String> = parsed.path_segments()?.map(str::to_string).collect();

    {
        let mut path = parsed.path_segments_mut().ok()?;
        path.clear();
        if segments.len() > 1 {
            path.extend(&segments[..segments.len() - 1]);
        } else {
            path.extend(segments.iter().filter(|s| !s.is_empty()));
        }
        path.push(PROBE_SENTINEL);
    }
    parsed.set_query(None);
    parsed.set_fragment(None);

    Some(parsed.to_string())
}

/// Expand the root-variant table for one hostname.
pub fn root_variants(host: &str) -> Vec<String> {
    ROOT_VARIANTS
        .iter()
        .map(|template| template.replace("{host}", host))
        .collect()
}

/// True when the candidate was redirected onto a root-equivalent of its own
/// host, judged by the final URL or any raw `Location` target on the way.
fn redirects_to_root(url: &str, page: &FetchedPage) -> bool {
    if page.redirect_targets.is_empty() {
        return false;
    }
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str().map(str::to_string) else {
        return false;
    };

    // Hosts on an explicit port get a second authority form.
    let mut variants = root_variants(&host);
    if let Some(port) = parsed.port() {
        variants.extend(root_variants(&format!("{}:{}", host, port)));
    }

    variants.iter().any(|v| *v == page.final_url)
        || page
            .redirect_targets
            .iter()
            .any(|target| variants.contains(target))
}

/// True when any h1/h2/h3/title text contains an error phrase.
pub fn has_bad_phrase(html: &str) -> bool {
    let document = Html::parse_document(html);
    let selector = Selector::parse(PHRASE_SELECTORS).unwrap();

    for element in document.select(&selector) {
        let text = element.text().collect::<String>().to_lowercase();
        if BAD_PHRASES.iter().any(|phrase| text.contains(phrase)) {
            return true;
        }
    }
    false
}
