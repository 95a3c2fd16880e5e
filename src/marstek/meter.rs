use crate::prelude::*;

use crate::marstek::frame::{self, MetricSnapshot};
use std::time::Duration;
use tokio::net::UdpSocket;

/// Replies longer than this are vendor-impossible; anything past the cap
/// would be a different protocol.
const MAX_RESPONSE_LEN: usize = 1024;

/// One Marstek CT meter endpoint. The request frame is a pure function of
/// the identity, so it is built once here and reused for every poll.
#[derive(Debug)]
pub struct Meter {
    host: String,
    port: u16,
    timeout: Duration,
    request: Vec<u8>,
}

impl Meter {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.host().to_string(),
            port: config.port(),
            timeout: config.timeout(),
            request: frame::build_request(&config.identity()),
        }
    }

    pub fn request(&self) -> &[u8] {
        &self.request
    }

    /// One request/response pair: send the request datagram, wait for a
    /// single reply within the timeout, decode it. No retry, no connection
    /// reuse; the socket lives for exactly one exchange and is dropped on
    /// every exit path.
    pub async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .send_to(&self.request, (self.host.as_str(), self.port))
            .await?;

        let mut buf = [0u8; MAX_RESPONSE_LEN];
        match tokio::time::timeout(self.timeout, socket.recv_from(&mut buf)).await {
            Err(_) => Err(FetchError::Timeout),
            Ok(Err(err)) => Err(FetchError::Transport(err)),
            Ok(Ok((len, _))) => frame::decode_response(&buf[..len]),
        }
    }
}
