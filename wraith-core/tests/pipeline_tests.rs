// End-to-end pipeline tests over a mock server. The JS phase stays empty in
// all of these, so no browser is ever launched.

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wraith_core::{CheckOptions, execute_check};

fn html(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
}

async fn mount_page(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at.to_string()))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "text/html")
                .set_body_string(body.to_string()),
        )
        .mount(server)
        .await;
}

async fn mount_fallback(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "text/html")
                .set_body_string(body.to_string()),
        )
        .mount(server)
        .await;
}

fn options(urls: Vec<String>) -> CheckOptions {
    CheckOptions {
        urls,
        threads: 4,
        js_ceiling: Duration::from_secs(60),
        ..CheckOptions::default()
    }
}

#[tokio::test]
async fn test_page_matching_probe_body_is_excluded() {
    let server = MockServer::start().await;
    // page1 has its own content; page2 serves the directory's catch-all
    // placeholder, byte for byte. Both answer 200, like the probe.
    mount_page(&server, "/dir/page1", 200, &html("Page one", "real content")).await;
    mount_page(&server, "/dir/page2", 200, &html("Oops", "placeholder")).await;
    mount_fallback(&server, 200, &html("Oops", "placeholder")).await;

    let report = execute_check(options(vec![
        format!("{}/dir/page1", server.uri()),
        format!("{}/dir/page2", server.uri()),
    ]))
    .await
    .unwrap();

    assert_eq!(report.live_urls, vec![format!("{}/dir/page1", server.uri())]);
    assert_eq!(report.http_live, 1);
    assert_eq!(report.needs_js, 0);
}

#[tokio::test]
async fn test_output_dedups_by_final_url() {
    let server = MockServer::start().await;
    let common = format!("{}/redir/common", server.uri());

    for from in ["/redir/one", "/redir/two"] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/redir/common"))
            .mount(&server)
            .await;
    }
    mount_page(&server, "/redir/common", 200, &html("Common", "shared target")).await;
    mount_fallback(&server, 404, &html("gone", "gone")).await;

    let report = execute_check(options(vec![
        format!("{}/redir/one", server.uri()),
        format!("{}/redir/two", server.uri()),
    ]))
    .await
    .unwrap();

    assert_eq!(report.live_urls, vec![common]);
}

#[tokio::test]
async fn test_sitemap_confirmed_urls_skip_classification() {
    let server = MockServer::start().await;
    let listed = format!("{}/docs/listed", server.uri());

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(format!(
                    "<urlset><url><loc>{listed}</loc></url></urlset>"
                )),
        )
        .mount(&server)
        .await;
    // The listed page itself would classify dead; sitemap membership must
    // keep it out of classification entirely.
    mount_page(&server, "/docs/listed", 404, &html("gone", "gone")).await;
    mount_fallback(&server, 404, &html("gone", "gone")).await;

    let report = execute_check(options(vec![listed.clone()])).await.unwrap();

    assert_eq!(report.live_urls, vec![listed]);
    assert_eq!(report.sitemap_confirmed, 1);
    assert_eq!(report.classified_count, 0);
}

#[tokio::test]
async fn test_max_urls_caps_pending_but_not_confirmed() {
    let server = MockServer::start().await;
    let listed_a = format!("{}/docs/a", server.uri());
    let listed_b = format!("{}/docs/b", server.uri());
    let pending_c = format!("{}/docs/c", server.uri());
    let pending_d = format!("{}/docs/d", server.uri());

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(format!(
                    "<urlset><url><loc>{listed_a}</loc></url><url><loc>{listed_b}</loc></url></urlset>"
                )),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/docs/c", 200, &html("C", "content c")).await;
    mount_page(&server, "/docs/d", 200, &html("D", "content d")).await;
    mount_fallback(&server, 404, &html("gone", "gone")).await;

    let mut opts = options(vec![
        listed_a.clone(),
        listed_b.clone(),
        pending_c.clone(),
        pending_d,
    ]);
    opts.max_urls = Some(1);
    let report = execute_check(opts).await.unwrap();

    // Both confirmed URLs survive the cap; only one pending URL was
    // classified and the other is excluded outright.
    assert_eq!(report.live_urls, vec![listed_a, listed_b, pending_c]);
    assert_eq!(report.classified_count, 1);
}

#[tokio::test]
async fn test_unreachable_host_produces_empty_output() {
    // Nothing listens on port 1; every fetch is refused immediately.
    let mut opts = options(vec!["http://127.0.0.1:1/a/page".to_string()]);
    opts.threads = 1;
    let report = execute_check(opts).await.unwrap();

    assert!(report.live_urls.is_empty());
    assert_eq!(report.classified_count, 1);
}
