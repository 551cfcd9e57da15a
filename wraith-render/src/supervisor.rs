use crate::render::RenderWorker;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Options for the JS rendering phase.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Browser workers; the queue is split into one contiguous chunk each.
    pub processes: usize,
    /// Per-navigation timeout inside a worker.
    pub navigation_timeout: Duration,
    /// Hard wall-clock ceiling on the whole phase.
    pub ceiling: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            processes: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            navigation_timeout: Duration::from_secs(15),
            ceiling: Duration::from_secs(10 * 60 * 60),
        }
    }
}

/// Render every queued URL and return the ones that look live, keyed by
/// their rendered final URL. Never fails the run: a worker that cannot
/// launch a browser forfeits its chunk, and a ceiling breach aborts the
/// stragglers while keeping their unfinished URLs (unresolved is not known
/// bad).
pub async fn execute_render(urls: Vec<String>, options: RenderOptions) -> Vec<String> {
    let RenderOptions {
        processes,
        navigation_timeout,
        ceiling,
    } = options;

    if urls.is_empty() {
        info!("No URLs queued for JS rendering");
        return Vec::new();
    }

    let chunk_len = urls.len().div_ceil(processes.max(1));
    info!(
        "Rendering {} URLs across {} browser workers",
        urls.len(),
        urls.len().div_ceil(chunk_len)
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut jobs = Vec::new();

    for chunk in urls.chunks(chunk_len) {
        let chunk = chunk.to_vec();
        let handle = tokio::spawn(run_chunk(chunk.clone(), tx.clone(), navigation_timeout));
        jobs.push((handle, chunk));
    }
    drop(tx);

    // Poll worker liveness once a second until everyone is done or the
    // ceiling is hit.
    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut kept_back: Vec<String> = Vec::new();

    loop {
        ticker.tick().await;
        jobs.retain(|(handle, _)| !handle.is_finished());
        if jobs.is_empty() {
            break;
        }
        if started.elapsed() >= ceiling {
            warn!(
                "Render ceiling of {:?} reached with {} workers still running",
                ceiling,
                jobs.len()
            );
            for (handle, chunk) in &jobs {
                handle.abort();
                kept_back.extend(chunk.iter().cloned());
            }
            break;
        }
    }

    let mut live = Vec::new();
    while let Some(url) = rx.recv().await {
        live.push(url);
    }
    merge_kept_back(live, kept_back)
}

/// Drive one worker's chunk through a private browser, reporting live URLs
/// as they are confirmed.
async fn run_chunk(
    urls: Vec<String>,
    tx: mpsc::UnboundedSender<String>,
    navigation_timeout: Duration,
) {
    let worker = match RenderWorker::launch(navigation_timeout).await {
        Ok(worker) => worker,
        Err(e) => {
            warn!("Browser launch failed, forfeiting {} URLs: {}", urls.len(), e);
            return;
        }
    };

    for url in &urls {
        debug!("Rendering {}", url);
        match worker.check(url).await {
            Ok(Some(final_url)) => {
                let _ = tx.send(final_url);
            }
            Ok(None) => debug!("{} judged dead after rendering", url),
            Err(e) => info!("Dropping {} after render failure: {}", url, e),
        }
    }

    worker.close().await;
}

/// Append aborted workers' leftover URLs unless already confirmed.
fn merge_kept_back(mut live: Vec<String>, kept_back: Vec<String>) -> Vec<String> {
    for url in kept_back {
        if !live.contains(&url) {
            live.push(url);
        }
    }
    live
}
