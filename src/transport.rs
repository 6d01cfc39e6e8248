use log::info;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use url::Url;

use crate::error::{Error, Result};
use crate::grid::GriddedDataset;
use crate::request::RequestParameters;

const API_KEY_HEADER: &str = "private-token";

/// Fetches the grid described by a request. Authentication, job queuing and
/// file decoding all live behind this boundary.
pub trait Transport {
    fn fetch(&self, request: &RequestParameters) -> Result<GriddedDataset>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, request: &RequestParameters) -> Result<GriddedDataset> {
        (**self).fetch(request)
    }
}

#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Base URL; the dataset id is appended as the last path segment.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub verify_tls: bool,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/grids".to_string(),
            api_key: None,
            verify_tls: true,
            user_agent: concat!("era5-site-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Blocking HTTP transport for a grid service that takes the archive request
/// body as JSON and answers with an already-decoded [`GriddedDataset`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(opts: TransportOptions) -> Result<Self> {
        let mut endpoint = Url::parse(&opts.endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidRequest(format!(
                "endpoint cannot be a base url: {}",
                opts.endpoint
            )));
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&opts.user_agent)
                .map_err(|_| Error::InvalidRequest(format!("invalid user agent: {}", opts.user_agent)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &opts.api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| Error::InvalidRequest("api key is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let mut builder = HttpClient::builder().default_headers(headers);
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self { endpoint, http })
    }

    pub fn url_for(&self, request: &RequestParameters) -> Result<Url> {
        Ok(self.endpoint.join(request.dataset.id())?)
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, request: &RequestParameters) -> Result<GriddedDataset> {
        let url = self.url_for(request)?;
        info!("requesting {} variable(s) from {url}", request.variable.len());

        let dataset: GriddedDataset = self
            .http
            .post(url)
            .json(request)
            .send()?
            .error_for_status()?
            .json()?;

        info!("received {} grid variable(s)", dataset.variables.len());
        Ok(dataset)
    }
}
