//! # Service — Coin Service HTTP Collaborator
//!
//! The remote service owns the authoritative puzzle input. Two point-in-time
//! calls: fetch the current input, and submit a candidate solution. Both may
//! fail transiently; callers log and retry on their own cadence rather than
//! backing off here.
//!
//! Non-2xx statuses on submission are data, not transport errors: the
//! supervisor's recovery protocol reads the 400 body to find the service's
//! idea of the current input.

use std::time::Duration;

use anyhow::Result;

/// Raw verdict from the service on a submission.
#[derive(Clone, Debug)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

/// Seam between the supervisor and the remote service, so the retasking
/// protocol can be driven by a scripted service in tests.
pub trait CoinService {
    /// The service's current puzzle input, trimmed.
    fn fetch_current(&self) -> Result<String>;

    /// Submit a solved message. Transport failures are `Err`; HTTP-level
    /// rejections come back as an `Ok` response carrying status and body.
    fn submit(&self, message: &str) -> Result<ServiceResponse>;
}

pub struct HttpCoinService {
    server: String,
    agent: ureq::Agent,
}

impl HttpCoinService {
    pub fn new(server: &str) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_connect(Some(Duration::from_secs(5)))
                .timeout_send_request(Some(Duration::from_secs(10)))
                .http_status_as_error(false)
                .build(),
        );
        HttpCoinService {
            server: server.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.server, path)
    }
}

impl CoinService for HttpCoinService {
    fn fetch_current(&self) -> Result<String> {
        let mut response = self.agent.get(&self.endpoint("current")).call()?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        if !(200..300).contains(&status) {
            anyhow::bail!("fetch current returned status {status}");
        }
        Ok(body.trim().to_string())
    }

    fn submit(&self, message: &str) -> Result<ServiceResponse> {
        let mut response = self
            .agent
            .post(&self.endpoint("coins"))
            .send_form([("coin", message)])?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok(ServiceResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let service = HttpCoinService::new("http://example.test/");
        assert_eq!(service.endpoint("current"), "http://example.test/current");
        assert_eq!(service.endpoint("coins"), "http://example.test/coins");
    }

    #[test]
    fn endpoint_keeps_bare_server() {
        let service = HttpCoinService::new("http://example.test");
        assert_eq!(service.endpoint("current"), "http://example.test/current");
    }
}
