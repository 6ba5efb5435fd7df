//! Network transport for the carrier trip planner
//!
//! The trip fetcher only needs one capability: post a form and get back a
//! status code and a body. `HttpTransport` does that over reqwest; tests swap
//! in a canned implementation.

use reqwest::Client;
use thiserror::Error;

/// Errors raised before any HTTP status is available
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Status and body of a planner response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is 2xx
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Form-post capability used by the trip fetcher
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Posts `form` as `application/x-www-form-urlencoded` to `url` with
    /// `query` appended as the query string.
    async fn post(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &[(&str, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// Transport backed by a shared reqwest client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Uses an already configured client (timeouts, proxies, headers)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &[(&str, String)],
    ) -> Result<TransportResponse, TransportError> {
        let response = self.client.post(url).query(query).form(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Canned transport for fetcher and batch tests

    use std::sync::Mutex;

    use super::*;

    type Responder = dyn Fn(usize, &[(String, String)]) -> TransportResponse + Send + Sync;

    /// Records every post and answers through a closure given the call index
    /// (0-based) and the submitted form
    pub struct MockTransport {
        responder: Box<Responder>,
        calls: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl MockTransport {
        pub fn new(
            responder: impl Fn(usize, &[(String, String)]) -> TransportResponse + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Answers every request with a result page listing `total`
        pub fn with_fare(total: &'static str) -> Self {
            Self::new(move |_, _| ok_page(total))
        }

        /// Answers every request with the given status and an empty body
        pub fn with_status(status: u16) -> Self {
            Self::new(move |_, _| TransportResponse {
                status,
                body: String::new(),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Submitted forms, in call order
        pub fn calls(&self) -> Vec<Vec<(String, String)>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        async fn post(
            &self,
            _url: &str,
            _query: &[(&str, &str)],
            form: &[(&str, String)],
        ) -> Result<TransportResponse, TransportError> {
            let form: Vec<(String, String)> = form
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(form.clone());
                calls.len() - 1
            };
            Ok((self.responder)(index, &form))
        }
    }

    /// Looks up one submitted form field
    pub fn field<'a>(form: &'a [(String, String)], name: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// A 200 response holding one trip option with the given total
    pub fn ok_page(total: &str) -> TransportResponse {
        TransportResponse {
            status: 200,
            body: format!(
                r#"<html><body><div id="Accordion1"><div class="AccordionPanel"><table>
                    <tr><td>Depart</td><td>9:30 AM</td></tr>
                    <tr><td>Total Regular</td><td>{total}</td></tr>
                    <tr><td>Reduced</td><td>$1.00</td></tr>
                    <tr><td>Transfers</td><td>0</td></tr>
                </table></div></div></body></html>"#
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_ok_for_2xx_only() {
        let response = |status| TransportResponse {
            status,
            body: String::new(),
        };
        assert!(response(200).is_ok());
        assert!(response(204).is_ok());
        assert!(!response(302).is_ok());
        assert!(!response(404).is_ok());
        assert!(!response(500).is_ok());
    }
}
