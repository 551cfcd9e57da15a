use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Remove any stale output from an earlier run. Call before the pipeline
/// starts; the file is only ever written once, at completion.
pub fn remove_stale_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed stale output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not remove {}: {}", path.display(), e),
    }
}

/// Write the live list, one URL per line.
pub fn write_live_urls(path: &Path, urls: &[String]) -> io::Result<()> {
    let mut contents = String::with_capacity(urls.iter().map(|u| u.len() + 1).sum());
    for url in urls {
        contents.push_str(url);
        contents.push('\n');
    }
    fs::write(path, contents)?;
    info!("Wrote {} live URLs to {}", urls.len(), path.display());
    Ok(())
}
