use crate::error::{Result, ScanError};
use crate::result::FetchedPage;
use reqwest::Client;
use reqwest::header::LOCATION;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Hop limit when resolving a redirect chain by hand.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Build the shared client. Redirects are disabled so every `Location`
/// target stays observable; certificate errors are ignored because a page
/// behind a broken certificate can still be a live page.
pub fn build_client(user_agent: &str) -> Client {
    Client::builder()
        .user_agent(user_agent)
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .expect("Failed to create HTTP client")
}

/// Fetch a URL, retrying once at double the timeout before giving up.
pub async fn fetch_with_retry(client: &Client, url: &str, timeout: Duration) -> Result<FetchedPage> {
    match fetch_once(client, url, timeout).await {
        Ok(page) => Ok(page),
        Err(e) => {
            debug!("Fetch of {} failed ({}), retrying at double timeout", url, e);
            fetch_once(client, url, timeout * 2).await
        }
    }
}

/// Fetch a URL, following redirects manually and recording each hop's raw
/// `Location` value.
async fn fetch_once(client: &Client, url: &str, timeout: Duration) -> Result<FetchedPage> {
    let mut current =
        Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    let mut redirect_targets = Vec::new();

    for _ in 0..MAX_REDIRECT_HOPS {
        let response = client.get(current.clone()).timeout(timeout).send().await?;
        let status = response.status();

        if status.is_redirection()
            && let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        {
            // A Location we cannot resolve ends the chain where it stands.
            match current.join(&location) {
                Ok(next) => {
                    debug!("{} -> {}", current, location);
                    redirect_targets.push(location);
                    current = next;
                    continue;
                }
                Err(e) => {
                    debug!("Unresolvable Location '{}' from {}: {}", location, current, e);
                }
            }
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        return Ok(FetchedPage {
            status_code: status.as_u16(),
            final_url,
            redirect_targets,
            body,
        });
    }

    Err(ScanError::TooManyRedirects(MAX_REDIRECT_HOPS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_records_redirect_chain() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/middle"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/middle"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/end"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/end"))
            .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
            .mount(&mock_server)
            .await;

        let client = build_client("wraith-test");
        let page = fetch_with_retry(
            &client,
            &format!("{}/start", mock_server.uri()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.final_url, format!("{}/end", mock_server.uri()));
        assert_eq!(page.redirect_targets, vec!["/middle", "/end"]);
        assert_eq!(page.body, "landed");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_on_redirect_loop() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .mount(&mock_server)
            .await;

        let client = build_client("wraith-test");
        let result = fetch_with_retry(
            &client,
            &format!("{}/loop", mock_server.uri()),
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(ScanError::TooManyRedirects(_))));
    }

    #[tokio::test]
    async fn test_fetch_keeps_redirect_without_location() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/odd"))
            .respond_with(ResponseTemplate::new(302).set_body_string("no location header"))
            .mount(&mock_server)
            .await;

        let client = build_client("wraith-test");
        let page = fetch_with_retry(
            &client,
            &format!("{}/odd", mock_server.uri()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(page.status_code, 302);
        assert!(page.redirect_targets.is_empty());
    }
}
