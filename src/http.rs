//! Fetching status documents over HTTP.

use log::debug;
use serde_json::Value;

use crate::CheckError;

/// Anything which can hand out the JSON document behind an API path. Checks are written against
/// this trait so they can be driven without a live service.
pub trait JsonSource {
    fn get_json(&self, path: &str) -> Result<Value, CheckError>;
}

/// User name and password for HTTP basic auth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// A blocking HTTP client bound to one `http://<host>:<port>` base.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl HttpSource {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<Credentials>,
    ) -> Result<Self, CheckError> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(HttpSource {
            client,
            base_url: format!("http://{}:{}", host.trim_end_matches('/'), port),
            credentials,
        })
    }

    /// The full url for an API path, with or without a leading `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl JsonSource for HttpSource {
    fn get_json(&self, path: &str) -> Result<Value, CheckError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::HttpStatus { status, url });
        }

        let body = response.text()?;
        debug!("received {} bytes from {}", body.len(), url);
        Ok(serde_json::from_str(&body)?)
    }
}
