use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// What one subdomain's discovery turned up.
#[derive(Debug, Clone, Default)]
pub struct SubdomainRecord {
    /// Sitemap documents seen while expanding this subdomain's seeds.
    pub sitemap_urls: Vec<String>,
    /// Content URLs collected from urlset documents.
    pub content_urls: HashSet<String>,
}

/// Everything discovered for one registrable domain. Created on first URL
/// seen for the domain, never dropped during a run.
#[derive(Debug, Clone, Default)]
pub struct DomainRecord {
    subdomains: HashMap<String, SubdomainRecord>,
    /// Union of content URLs across all subdomains; membership checks hit
    /// this set only.
    all_content_urls: HashSet<String>,
}

/// A parsed sitemap document, classified by its root element.
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// A sitemapindex: child locs are further sitemap documents.
    Index(Vec<String>),
    /// A urlset: child locs are content URLs.
    UrlSet(Vec<String>),
    /// Anything else, including documents too malformed to classify.
    Unrecognized,
}

const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Cheap pre-classifier: a URL listed in its own domain's sitemaps is live
/// without ever fetching it. Discovery runs once per (domain, subdomain)
/// pair; a shared visited set keeps recursive sitemap indexes from being
/// fetched twice.
pub struct SitemapOracle {
    client: Client,
    domains: HashMap<String, DomainRecord>,
    visited: HashSet<String>,
    timeout: Duration,
}

impl SitemapOracle {
    pub fn new(user_agent: &str) -> Self {
        Self::with_timeout(user_agent, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(user_agent: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            domains: HashMap::new(),
            visited: HashSet::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Split candidates into (sitemap-confirmed, still unknown), preserving
    /// order within each half.
    pub async fn partition(&mut self, urls: Vec<String>) -> (Vec<String>, Vec<String>) {
        let mut confirmed = Vec::new();
        let mut pending = Vec::new();

        for url in urls {
            if self.confirm(&url).await {
                debug!("{} confirmed by sitemap", url);
                confirmed.push(url);
            } else {
                pending.push(url);
            }
        }

        info!(
            "Sitemaps confirmed {} URLs, {} left to classify",
            confirmed.len(),
            pending.len()
        );
        (confirmed, pending)
    }

    /// True when the URL exactly matches a content URL discovered in its
    /// domain's sitemaps. Triggers discovery on first contact with the
    /// URL's (domain, subdomain) pair.
    pub async fn confirm(&mut self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str().map(str::to_string) else {
            return false;
        };

        let (domain, subdomain) = split_domain(&host);
        self.discover(&domain, &subdomain, &origin_base(&parsed)).await;

        self.domains
            .get(&domain)
            .map(|record| record.all_content_urls.contains(url))
            .unwrap_or(false)
    }

    /// Run discovery for one (domain, subdomain) pair, once. A failed
    /// discovery still counts as done; it is not retried within a run.
    async fn discover(&mut self, domain: &str, subdomain: &str, base: &str) {
        let already_done = self
            .domains
            .get(domain)
            .map(|record| record.subdomains.contains_key(subdomain))
            .unwrap_or(false);
        if already_done {
            return;
        }

        debug!("Discovering sitemaps for {} (subdomain '{}')", domain, subdomain);
        let mut sub_record = SubdomainRecord::default();
        let mut queue: VecDeque<String> = VecDeque::new();

        for sitemap_url in self.robots_sitemaps(base).await {
            queue.push_back(sitemap_url);
        }
        queue.push_back(format!("{}/sitemap.xml", base));

        while let Some(sitemap_url) = queue.pop_front() {
            if !self.visited.insert(sitemap_url.clone()) {
                continue;
            }
            sub_record.sitemap_urls.push(sitemap_url.clone());

            let Some(xml) = self.fetch_text(&sitemap_url).await else {
                continue;
            };
            match parse_sitemap(&xml) {
                SitemapDocument::Index(children) => {
                    debug!("{} is a sitemap index with {} children", sitemap_url, children.len());
                    queue.extend(children);
                }
                SitemapDocument::UrlSet(urls) => {
                    debug!("{} lists {} content URLs", sitemap_url, urls.len());
                    sub_record.content_urls.extend(urls);
                }
                SitemapDocument::Unrecognized => {
                    debug!("Skipping unrecognized sitemap document at {}", sitemap_url);
                }
            }
        }

        let record = self.domains.entry(domain.to_string()).or_default();
        record
            .all_content_urls
            .extend(sub_record.content_urls.iter().cloned());
        record.subdomains.insert(subdomain.to_string(), sub_record);
    }

    async fn robots_sitemaps(&self, base: &str) -> Vec<String> {
        let robots_url = format!("{}/robots.txt", base);
        let Some(body) = self.fetch_text(&robots_url).await else {
            return Vec::new();
        };
        parse_robots_sitemaps(&body)
    }

    /// Fetch a text resource. Network failures retry once at double timeout;
    /// an error status is a definitive answer and is not retried. Any
    /// failure yields `None`; sitemap discovery never fails a run.
    async fn fetch_text(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Fetch of {} failed ({}), retrying at double timeout", url, e);
                self.client
                    .get(url)
                    .timeout(self.timeout * 2)
                    .send()
                    .await
                    .ok()?
            }
        };
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }
}

/// Split a host into (registrable domain, subdomain) against the public
/// suffix list. Hosts the list cannot place (IPs, localhost) count as their
/// own domain with no subdomain.
pub fn split_domain(host: &str) -> (String, String) {
    if host.parse::<std::net::IpAddr>().is_ok() {
        return (host.to_string(), String::new());
    }
    let domain = psl::domain_str(host).unwrap_or(host).to_string();
    let subdomain = host
        .strip_suffix(domain.as_str())
        .map(|rest| rest.trim_end_matches('.').to_string())
        .unwrap_or_default();
    (domain, subdomain)
}

/// Scheme plus authority of a URL, the base all discovery fetches hang off.
fn origin_base(url: &Url) -> String {
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), url.host_str().unwrap_or(""), port),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or("")),
    }
}

/// Pull sitemap URLs out of a robots.txt body. Key match is
/// case-insensitive; the value is everything after the first colon.
pub fn parse_robots_sitemaps(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

/// Classify and flatten one sitemap document. Parse errors yield
/// `Unrecognized`: a document we cannot read contributes nothing.
pub fn parse_sitemap(xml: &str) -> SitemapDocument {
    #[derive(Clone, Copy, PartialEq)]
    enum RootKind {
        Index,
        UrlSet,
        Other,
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<RootKind> = None;
    let mut in_loc = false;
    let mut locs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = name.as_ref();
                if root.is_none() {
                    root = Some(if local.ends_with(b"sitemapindex") {
                        RootKind::Index
                    } else if local.ends_with(b"urlset") {
                        RootKind::UrlSet
                    } else {
                        RootKind::Other
                    });
                } else if local.ends_with(b"loc") {
                    in_loc = true;
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref().ends_with(b"loc") {
                    in_loc = false;
                }
            }
            Ok(Event::Text(t)) => {
                if in_loc && let Ok(text) = t.unescape() {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        locs.push(text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Malformed sitemap XML: {}", e);
                return SitemapDocument::Unrecognized;
            }
            _ => {}
        }
    }

    match root {
        Some(RootKind::Index) => SitemapDocument::Index(locs),
        Some(RootKind::UrlSet) => SitemapDocument::UrlSet(locs),
        _ => SitemapDocument::Unrecognized,
    }
}
