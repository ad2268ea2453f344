//! Context-bounded dialer (C6): connects directly or through a SOCKS5 proxy,
//! yielding a session. The dial runs in a background task so that deadline
//! expiry returns promptly even though the underlying connect call cannot
//! itself be interrupted; if the deadline fires first, the task closes
//! whatever socket it eventually produces instead of handing it back.

use crate::smtp::client::Stream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum DialError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("socks proxy error: {0}")]
    Socks(String),
    #[error("invalid proxy url: {0}")]
    InvalidProxyUrl(String),
    #[error("dial deadline exceeded")]
    Timeout,
}

/// Dials `addr` (`host:port`), optionally through `proxy` (a
/// `socks5://[user:pass@]host:port` URL), bounded by `timeout`.
pub async fn dial(
    addr: String,
    proxy: Option<String>,
    timeout: Duration,
) -> Result<Box<dyn Stream>, DialError> {
    let need_close = Arc::new(AtomicBool::new(false));
    let need_close_task = Arc::clone(&need_close);
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let result = match proxy.filter(|p| !p.is_empty()) {
            Some(proxy_url) => socks_dial(&addr, &proxy_url).await,
            None => direct_dial(&addr).await,
        };

        match result {
            Ok(mut stream) => {
                if need_close_task.load(Ordering::SeqCst) {
                    let _ = stream.shutdown().await;
                } else {
                    let _ = tx.send(Ok(stream));
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
            }
        }
    });

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(DialError::Timeout),
        Err(_) => {
            need_close.store(true, Ordering::SeqCst);
            Err(DialError::Timeout)
        }
    }
}

async fn direct_dial(addr: &str) -> Result<Box<dyn Stream>, DialError> {
    let stream = TcpStream::connect(addr).await?;
    Ok(Box::new(stream))
}

async fn socks_dial(addr: &str, proxy_url: &str) -> Result<Box<dyn Stream>, DialError> {
    let url = url::Url::parse(proxy_url)
        .map_err(|e| DialError::InvalidProxyUrl(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| DialError::InvalidProxyUrl(proxy_url.to_string()))?;
    let port = url
        .port()
        .ok_or_else(|| DialError::InvalidProxyUrl(proxy_url.to_string()))?;
    let proxy_addr = format!("{host}:{port}");

    let stream = if !url.username().is_empty() {
        tokio_socks::tcp::Socks5Stream::connect_with_password(
            proxy_addr.as_str(),
            addr,
            url.username(),
            url.password().unwrap_or(""),
        )
        .await
        .map_err(|e| DialError::Socks(e.to_string()))?
    } else {
        tokio_socks::tcp::Socks5Stream::connect(proxy_addr.as_str(), addr)
            .await
            .map_err(|e| DialError::Socks(e.to_string()))?
    };

    Ok(Box::new(stream))
}
