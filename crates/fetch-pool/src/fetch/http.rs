use super::{FetchError, FetchResult, Fetcher};
use core::time::Duration;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

/// Default end-to-end timeout for a single retrieval.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Fetcher`] that performs an HTTP `GET` with `reqwest`.
///
/// The response body is never read; only the status code matters to the
/// pool. The timeout covers the whole request, connection included.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if the TLS backend or client cannot be
    /// initialized.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("fetch-pool/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    /// Wraps a preconfigured client.
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str) -> FetchResult {
        match self.client.get(target).send().await {
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) => Err(classify_error(&e)),
        }
    }
}

fn classify_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect {
            reason: e.to_string(),
        }
    } else {
        FetchError::Request {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_remote_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        assert_eq!(fetcher.fetch(&format!("{}/ok", server.uri())).await, Ok(200));
        assert_eq!(
            fetcher.fetch(&format!("{}/missing", server.uri())).await,
            Ok(404)
        );
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();

        assert_eq!(fetcher.fetch(&server.uri()).await, Err(FetchError::Timeout));
    }

    #[tokio::test]
    async fn unreachable_address_is_a_transport_error() {
        // Port 9 on loopback (discard) is closed in test environments.
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let result = fetcher.fetch("http://127.0.0.1:9/").await;
        assert!(matches!(
            result,
            Err(FetchError::Connect { .. } | FetchError::Request { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_target_is_a_request_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let result = fetcher.fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::Request { .. })));
    }
}
