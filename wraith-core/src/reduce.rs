use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Thresholds for the reduction passes.
#[derive(Debug, Clone, Copy)]
pub struct ReduceOptions {
    /// Maximum non-empty path segments before a URL is dropped.
    pub max_depth: usize,
    /// Maximum consecutive repeats of one path segment.
    pub max_repeats: usize,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            max_depth: 20,
            max_repeats: 2,
        }
    }
}

/// Numeric-tailed URLs kept per directory group.
const NUMERIC_GROUP_CAP: usize = 20;
/// URLs kept per directory group overall.
const TOTAL_GROUP_CAP: usize = 50;

/// Shrink a candidate list before any network traffic. Four passes, each
/// preserving the relative order of survivors; the whole pipeline is pure
/// and idempotent.
pub fn reduce(urls: Vec<String>, options: ReduceOptions) -> Vec<String> {
    let urls = filter_depth(urls, options.max_depth);
    let urls = filter_repeats(urls, options.max_repeats);
    let urls = collapse_language_variants(urls);
    cap_directory_groups(urls)
}

fn path_segments(url: &str) -> Option<Vec<String>> {
    let parsed = Url::parse(url).ok()?;
    Some(parsed.path_segments()?.map(str::to_string).collect())
}

/// Pass 1: drop URLs nested deeper than `max_depth` non-empty segments.
/// Unparseable URLs fall out here too; nothing downstream could fetch them.
fn filter_depth(urls: Vec<String>, max_depth: usize) -> Vec<String> {
    urls.into_iter()
        .filter(|url| match path_segments(url) {
            Some(segments) => segments.iter().filter(|s| !s.is_empty()).count() <= max_depth,
            None => {
                debug!("Dropping unparseable URL {}", url);
                false
            }
        })
        .collect()
}

/// Pass 2: drop URLs where one segment repeats more than `max_repeats`
/// times back to back, the signature of a crawler trap.
fn filter_repeats(urls: Vec<String>, max_repeats: usize) -> Vec<String> {
    urls.into_iter()
        .filter(|url| {
            let Some(segments) = path_segments(url) else {
                return false;
            };
            !has_excessive_run(&segments, max_repeats)
        })
        .collect()
}

fn has_excessive_run(segments: &[String], max_repeats: usize) -> bool {
    let mut run = 0usize;
    let mut prev: Option<&str> = None;
    for segment in segments {
        if prev == Some(segment.as_str()) {
            run += 1;
        } else {
            run = 1;
            prev = Some(segment.as_str());
        }
        if run > max_repeats {
            return true;
        }
    }
    false
}

/// Pass 3: URLs that differ only in their first path segment are language
/// mirrors of one another; keep one per group, preferring English.
fn collapse_language_variants(urls: Vec<String>) -> Vec<String> {
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();
    // Groups in first-seen order, members as (first segment, url).
    let mut groups: Vec<Vec<(String, String)>> = Vec::new();

    for url in urls {
        let Some((key, first_segment)) = variant_key(&url) else {
            continue;
        };
        match index.get(&key) {
            Some(&i) => groups[i].push((first_segment, url)),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![(first_segment, url)]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(pick_language_representative)
        .collect()
}

/// Key is (scheme, authority, path minus the first segment); the value kept
/// alongside is that first segment. An empty first segment (root path) is a
/// valid value.
fn variant_key(url: &str) -> Option<((String, String, String), String)> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<String> = parsed.path_segments()?.map(str::to_string).collect();
    let (first, rest) = match segments.split_first() {
        Some((first, rest)) => (first.clone(), rest.join("/")),
        None => (String::new(), String::new()),
    };
    Some(((parsed.scheme().to_string(), authority(&parsed), rest), first))
}

fn authority(url: &Url) -> String {
    match url.port() {
        Some(port) => format!("{}:{}", url.host_str().unwrap_or(""), port),
        None => url.host_str().unwrap_or("").to_string(),
    }
}

fn is_english_like(segment: &str) -> bool {
    segment == "en" || (segment.len() < 7 && segment.starts_with("en-"))
}

fn pick_language_representative(group: Vec<(String, String)>) -> Option<String> {
    for (segment, url) in &group {
        if is_english_like(segment) {
            return Some(url.clone());
        }
    }
    for (segment, url) in &group {
        if segment.eq_ignore_ascii_case("zh") {
            return Some(url.clone());
        }
    }
    for (segment, url) in &group {
        if segment.eq_ignore_ascii_case("es") {
            return Some(url.clone());
        }
    }
    group.into_iter().next().map(|(_, url)| url)
}

/// Pass 4: per directory, keep at most the first 20 numeric-tailed URLs and
/// at most the first 50 URLs overall. The numeric cap is applied first; both
/// walk the same original order.
fn cap_directory_groups(urls: Vec<String>) -> Vec<String> {
    let mut numeric_kept: HashMap<(String, String, String), usize> = HashMap::new();
    let mut total_kept: HashMap<(String, String, String), usize> = HashMap::new();
    let mut survivors = Vec::new();

    for url in urls {
        let Some((key, last_segment)) = directory_key(&url) else {
            continue;
        };

        let numeric =
            !last_segment.is_empty() && last_segment.chars().all(|c| c.is_ascii_digit());
        if numeric {
            let kept = numeric_kept.entry(key.clone()).or_insert(0);
            if *kept >= NUMERIC_GROUP_CAP {
                debug!("Dropping {}: numeric cap reached for its directory", url);
                continue;
            }
            *kept += 1;
        }

        let kept = total_kept.entry(key).or_insert(0);
        if *kept >= TOTAL_GROUP_CAP {
            debug!("Dropping {}: directory cap reached", url);
            continue;
        }
        *kept += 1;
        survivors.push(url);
    }

    survivors
}

/// Key is (scheme, authority, path minus the last segment); the value kept
/// alongside is that last segment.
fn directory_key(url: &str) -> Option<((String, String, String), String)> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<String> = parsed.path_segments()?.map(str::to_string).collect();
    let (last, dir) = match segments.split_last() {
        Some((last, dir)) => (last.clone(), dir.join("/")),
        None => (String::new(), String::new()),
    };
    Some(((parsed.scheme().to_string(), authority(&parsed), dir), last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_depth_filter_drops_deep_paths() {
        let input = urls(&[
            "https://x.test/a/b/c",
            "https://x.test/a/b/c/d",
            "https://x.test/",
        ]);
        let out = filter_depth(input, 3);
        assert_eq!(
            out,
            urls(&["https://x.test/a/b/c", "https://x.test/"])
        );
    }

    #[test]
    fn test_depth_filter_never_exceeds_limit() {
        let input: Vec<String> = (1..=30)
            .map(|depth| {
                let path: Vec<String> = (0..depth).map(|i| format!("s{i}")).collect();
                format!("https://x.test/{}", path.join("/"))
            })
            .collect();
        for url in filter_depth(input, 20) {
            let depth = Url::parse(&url)
                .unwrap()
                .path_segments()
                .unwrap()
                .filter(|s| !s.is_empty())
                .count();
            assert!(depth <= 20);
        }
    }

    #[test]
    fn test_repeat_filter_drops_consecutive_runs() {
        let input = urls(&["https://x.test/a/a/a/x", "https://x.test/a/a/b/a"]);
        let out = filter_repeats(input, 2);
        assert_eq!(out, urls(&["https://x.test/a/a/b/a"]));
    }

    #[test]
    fn test_language_collapse_prefers_english() {
        let input = urls(&["https://x.test/fr/p", "https://x.test/en/p"]);
        let out = collapse_language_variants(input);
        assert_eq!(out, urls(&["https://x.test/en/p"]));
    }

    #[test]
    fn test_language_collapse_regional_english_variant() {
        let input = urls(&["https://x.test/de/p", "https://x.test/en-US/p"]);
        let out = collapse_language_variants(input);
        assert_eq!(out, urls(&["https://x.test/en-US/p"]));
    }

    #[test]
    fn test_language_collapse_priority_order() {
        let input = urls(&[
            "https://x.test/fr/p",
            "https://x.test/es/p",
            "https://x.test/ZH/p",
        ]);
        let out = collapse_language_variants(input);
        assert_eq!(out, urls(&["https://x.test/ZH/p"]));
    }

    #[test]
    fn test_language_collapse_falls_back_to_first_seen() {
        let input = urls(&["https://x.test/de/p", "https://x.test/fr/p"]);
        let out = collapse_language_variants(input);
        assert_eq!(out, urls(&["https://x.test/de/p"]));
    }

    #[test]
    fn test_language_collapse_keeps_singleton_groups() {
        let input = urls(&["https://x.test/fr/one", "https://x.test/fr/two"]);
        let out = collapse_language_variants(input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn test_language_collapse_root_is_a_valid_segment() {
        // "/p" groups with "/en/p"? No: "/p" has first segment "p", rest "".
        // "/" has first segment "" and rest "", its own group.
        let input = urls(&["https://x.test/", "https://x.test/en/p"]);
        let out = collapse_language_variants(input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn test_numeric_cap_keeps_first_twenty() {
        let input: Vec<String> = (1..=30)
            .map(|i| format!("https://x.test/items/{i}"))
            .collect();
        let out = cap_directory_groups(input.clone());
        assert_eq!(out, input[..20].to_vec());
    }

    #[test]
    fn test_total_cap_keeps_first_fifty() {
        let input: Vec<String> = (1..=60)
            .map(|i| format!("https://x.test/pages/page-{i}"))
            .collect();
        let out = cap_directory_groups(input.clone());
        assert_eq!(out, input[..50].to_vec());
    }

    #[test]
    fn test_caps_are_per_group() {
        let mut input: Vec<String> = (1..=25)
            .map(|i| format!("https://x.test/a/{i}"))
            .collect();
        input.extend((1..=25).map(|i| format!("https://x.test/b/{i}")));
        let out = cap_directory_groups(input);
        assert_eq!(out.len(), 40);
    }

    #[test]
    fn test_numeric_cap_ignores_named_segments() {
        let mut input: Vec<String> = (1..=30)
            .map(|i| format!("https://x.test/mixed/{i}"))
            .collect();
        input.push("https://x.test/mixed/about".to_string());
        let out = cap_directory_groups(input);
        // 20 numeric survivors plus the named one.
        assert_eq!(out.len(), 21);
        assert!(out.contains(&"https://x.test/mixed/about".to_string()));
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let input = urls(&[
            "https://x.test/en/p",
            "https://x.test/fr/p",
            "https://x.test/a/a/a/x",
            "https://x.test/items/1",
            "https://x.test/items/2",
            "https://x.test/deep/deep2/page",
        ]);
        let once = reduce(input, ReduceOptions::default());
        let twice = reduce(once.clone(), ReduceOptions::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reduce_preserves_order_across_groups() {
        let input = urls(&[
            "https://x.test/a/1",
            "https://b.test/solo",
            "https://x.test/a/2",
        ]);
        let out = reduce(input.clone(), ReduceOptions::default());
        assert_eq!(out, input);
    }
}
