use reqwest::{Client, Method, RequestBuilder};

use crate::error::ListenerResult;

/// Connection details shared by the status sink and the change feed.
#[derive(Clone)]
pub struct FirebaseSession {
    base_url: String,
    secret: Option<String>,
    client: Client,
}

impl FirebaseSession {
    /// No client-wide timeout: it would also cut off the streaming feed.
    pub fn new(base_url: impl Into<String>, secret: Option<String>) -> ListenerResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// REST URL of the node at `path`.
    pub fn node_url(&self, path: &str) -> String {
        let path = path.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}.json", self.base_url, path)
        } else {
            format!("{}/{}.json", self.base_url, path)
        }
    }

    /// Request for `path` with the auth secret attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.node_url(path));
        match &self.secret {
            Some(secret) => builder.query(&[("auth", secret.as_str())]),
            None => builder,
        }
    }
}
