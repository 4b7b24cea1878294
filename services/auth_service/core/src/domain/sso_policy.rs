//! Validates `redirect_uri` against a configured allow-list of exact origins
//! (C8). Never touches `state`/`nonce` beyond what `validator` already checks
//! — both must thread through unchanged.

use url::Url;

#[derive(Debug, Clone)]
pub struct SsoPolicy {
    allowed_origins: Vec<String>,
}

impl SsoPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// `true` iff `redirect_uri` parses, uses `http`/`https`, and its origin
    /// (`scheme://host[:port]`) exact-matches an allow-listed entry.
    pub fn is_allowed(&self, redirect_uri: &str) -> bool {
        let Ok(url) = Url::parse(redirect_uri) else { return false };
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        let Some(host) = url.host_str() else { return false };
        let origin = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        self.allowed_origins.iter().any(|allowed| allowed == &origin)
    }
}
