use crate::client::base::{ClientParams, FeeEstimator};
use crate::client::error::FeeEstimateError;
use crate::models::{EstimateFeeRequest, EstimateFeeResponse, Fee};
use async_trait::async_trait;
use std::time::Duration;
use ureq::{Agent, Proxy};

pub const TONCENTER_V2_URL: &str = "https://toncenter.com/api/v2";

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ToncenterV2Client {
    params: ClientParams,
    agent: Agent,
}

impl ToncenterV2Client {
    pub fn new(params: Option<ClientParams>) -> Result<Self, FeeEstimateError> {
        let params = params.unwrap_or_default();
        let proxy = params.proxy.as_deref().map(Proxy::new).transpose()?;

        let config = Agent::config_builder()
            .timeout_global(params.timeout.map(Duration::from_secs))
            .http_status_as_error(false)
            .proxy(proxy)
            .build();

        Ok(Self {
            params,
            agent: Agent::new_with_config(config),
        })
    }

    pub fn params(&self) -> &ClientParams {
        &self.params
    }

    fn url(&self, endpoint: &str) -> String {
        let base_url = self.params.base_url.as_deref().unwrap_or(TONCENTER_V2_URL);
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// POSTs a JSON document and returns the body of a 2xx response
    async fn post(&self, endpoint: &str, payload: String) -> Result<String, FeeEstimateError> {
        let url = self.url(endpoint);
        let agent = self.agent.clone();
        let api_key = self.params.api_key.clone();

        tokio::task::spawn_blocking(move || {
            let mut request = agent
                .post(url.as_str())
                .header("Content-Type", "application/json");
            if let Some(api_key) = &api_key {
                request = request.header("X-API-Key", api_key.as_str());
            }

            let mut response = request.send(payload.as_bytes())?;
            let status = response.status().as_u16();
            let body = response.body_mut().read_to_string()?;

            if !(200..300).contains(&status) {
                return Err(FeeEstimateError::Status { status, body });
            }
            Ok(body)
        })
        .await?
    }

    fn backoff(&self, attempt: u64) -> Duration {
        let base = Duration::from_millis(self.params.retry_backoff_ms.unwrap_or(0));
        base.saturating_mul(1 << attempt.min(16)).min(MAX_BACKOFF)
    }
}

#[async_trait]
impl FeeEstimator for ToncenterV2Client {
    async fn estimate_fee(&self, address: &str, body: &str) -> Result<Fee, FeeEstimateError> {
        let payload = serde_json::to_string(&EstimateFeeRequest::new(address, body))?;
        let max_retries = self.params.max_retries.unwrap_or(0);
        let mut attempt = 0;

        loop {
            log::debug!("estimateFee for {} (attempt {})", address, attempt + 1);
            let result = self
                .post("estimateFee", payload.clone())
                .await
                .and_then(|text| parse_estimate_fee(&text));

            match result {
                Err(e) if e.is_transient() && attempt < max_retries => {
                    let delay = self.backoff(attempt);
                    log::warn!("estimateFee failed: {}; retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => {
                    if let Ok(fee) = &result {
                        log::debug!("estimateFee for {}: {:.9} TON", address, fee.as_ton());
                    }
                    return result;
                }
            }
        }
    }
}

/// Sums the source fees of an `estimateFee` response
pub fn parse_estimate_fee(text: &str) -> Result<Fee, FeeEstimateError> {
    let response: EstimateFeeResponse = serde_json::from_str(text)?;
    if !response.ok {
        let reason = response
            .error
            .unwrap_or_else(|| "invalid response".to_string());
        return Err(FeeEstimateError::Rejected(reason));
    }

    let result = response
        .result
        .ok_or_else(|| FeeEstimateError::Rejected("response has no result".to_string()))?;
    Ok(Fee::from_nanotons(result.source_fees.total()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;

    const FEES_OK: &str = r#"{"ok":true,"result":{"source_fees":{"in_fwd_fee":1000000,"storage_fee":12,"gas_fee":3,"fwd_fee":5}}}"#;

    /// Serves the given responses, one connection each, and hands back raw requests
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                tx.send(read_request(&mut stream)).unwrap();
                let reply = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
        });

        (format!("http://{}", addr), rx)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(base_url: String, max_retries: u64) -> ToncenterV2Client {
        ToncenterV2Client::new(Some(ClientParams {
            base_url: Some(base_url),
            api_key: Some("secret".to_string()),
            max_retries: Some(max_retries),
            retry_backoff_ms: Some(1),
            ..ClientParams::default()
        }))
        .unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client("http://localhost/api/v2/".to_string(), 0);
        assert_eq!(client.url("/estimateFee"), "http://localhost/api/v2/estimateFee");

        let default = ToncenterV2Client::new(None).unwrap();
        assert_eq!(default.url("estimateFee"), "https://toncenter.com/api/v2/estimateFee");
    }

    #[test]
    fn test_backoff_doubles() {
        let client = ToncenterV2Client::new(Some(ClientParams {
            retry_backoff_ms: Some(100),
            ..ClientParams::default()
        }))
        .unwrap();
        assert_eq!(client.backoff(0), Duration::from_millis(100));
        assert_eq!(client.backoff(3), Duration::from_millis(800));
        assert_eq!(client.backoff(40), MAX_BACKOFF);
    }

    #[test]
    fn test_parse_estimate_fee() {
        assert_eq!(parse_estimate_fee(FEES_OK).unwrap().nanotons(), 1_000_020);
        assert!(matches!(
            parse_estimate_fee(r#"{"ok":false}"#),
            Err(FeeEstimateError::Rejected(reason)) if reason == "invalid response"
        ));
        assert!(matches!(
            parse_estimate_fee(r#"{"ok":true}"#),
            Err(FeeEstimateError::Rejected(_))
        ));
        assert!(matches!(
            parse_estimate_fee("<html>"),
            Err(FeeEstimateError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_estimate_fee_request() {
        let (base_url, requests) = serve(vec![(200, FEES_OK)]);
        let client = client(base_url, 0);

        let fee = client.estimate_fee("ab12", "te6ccgEBAQEAAgAAAA==").await.unwrap();
        assert_eq!(fee.nanotons(), 1_000_020);
        assert_eq!(fee.to_string(), "0.001000020");

        let request = requests.recv().unwrap();
        let lower = request.to_lowercase();
        assert!(request.starts_with("POST /estimateFee"));
        assert!(lower.contains("content-type: application/json"));
        assert!(lower.contains("x-api-key: secret"));

        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["address"], "ab12");
        assert_eq!(json["body"], "te6ccgEBAQEAAgAAAA==");
        assert_eq!(json["ignoreChksig"], true);
        assert_eq!(json["initCode"], "");
        assert_eq!(json["initData"], "");
    }

    #[tokio::test]
    async fn test_retries_transient_status() {
        let (base_url, requests) = serve(vec![(502, "bad gateway"), (200, FEES_OK)]);
        let client = client(base_url, 2);

        let fee = client.estimate_fee("ab12", "body").await.unwrap();
        assert_eq!(fee.nanotons(), 1_000_020);
        assert_eq!(requests.iter().take(2).count(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (base_url, _requests) = serve(vec![(503, "busy"), (503, "still busy")]);
        let client = client(base_url, 1);

        let err = client.estimate_fee("ab12", "body").await.unwrap_err();
        assert!(matches!(err, FeeEstimateError::Status { status: 503, ref body } if body == "still busy"));
    }

    #[test]
    fn test_client_error_is_not_retried() {
        let (base_url, requests) = serve(vec![(400, r#"{"ok":false,"error":"bad body"}"#)]);
        let client = client(base_url, 3);

        let err = tokio_test::block_on(client.estimate_fee("ab12", "body")).unwrap_err();
        assert!(matches!(err, FeeEstimateError::Status { status: 400, .. }));
        assert_eq!(requests.iter().count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_response() {
        let (base_url, _requests) = serve(vec![(200, r#"{"ok":false,"error":"Incorrect address"}"#)]);
        let client = client(base_url, 3);

        let err = client.estimate_fee("nope", "body").await.unwrap_err();
        assert_eq!(err.to_string(), "Fee estimation rejected: Incorrect address");
    }

    #[test]
    fn test_invalid_proxy() {
        let params = ClientParams {
            proxy: Some("not a proxy ::".to_string()),
            ..ClientParams::default()
        };
        assert!(ToncenterV2Client::new(Some(params)).is_err());
    }
}
