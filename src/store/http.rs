//! HTTP object store
//!
//! Talks to any server exposing objects as plain resources under a base URL
//! (WebDAV, nginx `dav_methods`, an S3 bucket behind a signing proxy):
//! `HEAD` for existence, `GET` to download, `PUT` to upload and `DELETE` on
//! the prefix collection to remove. The server must only expose an object
//! once its `PUT` has completed.

use super::ObjectStore;
use crate::error::{CofferError, CofferResult};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

/// Object store reached over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpObjectStore {
    /// Create a store rooted at `base_url`, optionally sending a bearer token
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            base_url,
            token,
            agent,
        }
    }

    /// Full URL of an object key
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }

    fn authorized<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn http_error(url: &str, err: ureq::Error) -> CofferError {
        let message = match err {
            ureq::Error::StatusCode(code) => format!("server returned status {}", code),
            other => other.to_string(),
        };
        CofferError::Http {
            url: url.to_string(),
            message,
        }
    }
}

impl ObjectStore for HttpObjectStore {
    fn exists(&self, key: &str) -> CofferResult<bool> {
        let url = self.url_for(key);
        match self.authorized(self.agent.head(&url)).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(404)) => Ok(false),
            Err(e) => Err(Self::http_error(&url, e)),
        }
    }

    fn get(&self, key: &str, dest: &mut dyn Write) -> CofferResult<u64> {
        let url = self.url_for(key);
        let mut response = match self.authorized(self.agent.get(&url)).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(CofferError::ObjectNotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(Self::http_error(&url, e)),
        };

        let mut reader = response.body_mut().as_reader();
        let bytes = io::copy(&mut reader, dest)
            .map_err(|e| CofferError::io(format!("downloading {}", url), e))?;
        debug!(url = %url, bytes, "downloaded object");
        Ok(bytes)
    }

    fn put(&self, key: &str, source: &mut dyn Read) -> CofferResult<u64> {
        let url = self.url_for(key);
        let mut counting = CountingReader {
            inner: source,
            count: 0,
        };

        self.authorized(self.agent.put(&url))
            .send(ureq::SendBody::from_reader(&mut counting))
            .map_err(|e| Self::http_error(&url, e))?;

        debug!(url = %url, bytes = counting.count, "uploaded object");
        Ok(counting.count)
    }

    fn delete_prefix(&self, prefix: &str) -> CofferResult<()> {
        let url = self.url_for(prefix);
        match self.authorized(self.agent.delete(&url)).call() {
            Ok(_) | Err(ureq::Error::StatusCode(404)) => Ok(()),
            Err(e) => Err(Self::http_error(&url, e)),
        }
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

struct CountingReader<'a> {
    inner: &'a mut dyn Read,
    count: u64,
}

impl Read for CountingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}
