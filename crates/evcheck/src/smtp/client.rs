//! Raw, line-oriented SMTP client over any `AsyncRead + AsyncWrite` stream
//! (plain TCP, SOCKS5-proxied TCP, or the `tokio-rustls` stream produced by
//! STARTTLS). Mirrors the shape of the source's `SMTPClient` interface:
//! one method per envelope command plus `extension` for capability checks.

use std::collections::HashMap;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

/// A parsed SMTP reply: a three-digit code and the (possibly multi-line) text.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn is_positive(&self) -> bool {
        self.code < 400
    }

    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed reply line: {0}")]
    MalformedReply(String),
    #[error("server replied {code} {text}")]
    Rejected { code: u16, text: String },
    #[error("STARTTLS not advertised by server")]
    StartTlsUnsupported,
    #[error("tls handshake failed: {0}")]
    Tls(String),
}

/// Any stream the client can speak SMTP over: a direct TCP connection, a
/// SOCKS5-proxied one, or (after STARTTLS) a TLS stream wrapping either.
pub trait Stream: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send {}
impl<T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send> Stream for T {}

pub struct SmtpClient {
    reader: Option<BufReader<Box<dyn Stream>>>,
    extensions: HashMap<String, String>,
}

impl SmtpClient {
    /// Wraps a freshly dialed stream and consumes the server's greeting.
    pub async fn connect(stream: Box<dyn Stream>) -> Result<Self, ClientError> {
        let mut client = Self {
            reader: Some(BufReader::new(stream)),
            extensions: HashMap::new(),
        };
        let greeting = client.read_reply().await?;
        if !greeting.is_positive() {
            return Err(ClientError::Rejected {
                code: greeting.code,
                text: greeting.text(),
            });
        }
        Ok(client)
    }

    /// Replaces the underlying stream in place, used after a STARTTLS
    /// upgrade. The new connection's EHLO response (if any) replaces the
    /// previously advertised extensions.
    pub fn rebind(&mut self, stream: Box<dyn Stream>) {
        self.reader = Some(BufReader::new(stream));
        self.extensions.clear();
    }

    /// Takes ownership of the underlying stream, leaving the client
    /// temporarily empty. Used to splice a TLS layer in after STARTTLS;
    /// callers must `rebind` before issuing another command.
    pub fn take_stream(&mut self) -> Box<dyn Stream> {
        self.reader
            .take()
            .expect("stream missing: rebind was not called after take_stream")
            .into_inner()
    }

    fn reader_mut(&mut self) -> &mut BufReader<Box<dyn Stream>> {
        self.reader
            .as_mut()
            .expect("stream missing: rebind was not called after take_stream")
    }

    pub async fn hello(&mut self, local_name: &str) -> Result<(), ClientError> {
        let reply = self.command(&format!("EHLO {local_name}")).await?;
        if !reply.is_positive() {
            // Fall back to legacy HELO, matching servers without ESMTP.
            let reply = self.command(&format!("HELO {local_name}")).await?;
            return self.expect_positive(reply);
        }
        for line in &reply.lines {
            let mut parts = line.splitn(2, ' ');
            if let Some(keyword) = parts.next() {
                self.extensions
                    .insert(keyword.to_ascii_uppercase(), parts.next().unwrap_or("").to_string());
            }
        }
        Ok(())
    }

    pub fn extension(&self, name: &str) -> Option<&str> {
        self.extensions.get(&name.to_ascii_uppercase()).map(|s| s.as_str())
    }

    pub async fn starttls_command(&mut self) -> Result<(), ClientError> {
        if self.extension("STARTTLS").is_none() {
            return Err(ClientError::StartTlsUnsupported);
        }
        let reply = self.command("STARTTLS").await?;
        self.expect_positive(reply)
    }

    pub async fn auth_plain(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        if self.extension("AUTH").is_none() {
            return Err(ClientError::Rejected {
                code: 0,
                text: "server doesn't support AUTH".to_string(),
            });
        }
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64_encode(credentials.as_bytes());
        let reply = self.command(&format!("AUTH PLAIN {encoded}")).await?;
        self.expect_positive(reply)
    }

    pub async fn mail(&mut self, from: &str) -> Result<(), ClientError> {
        let reply = self.command(&format!("MAIL FROM:<{from}>")).await?;
        self.expect_positive(reply)
    }

    /// Sends `RCPT TO` for each address, returning per-address failures.
    /// Addresses that are accepted are simply absent from the map.
    pub async fn rcpts(&mut self, addrs: &[String]) -> Result<HashMap<String, ClientError>, ClientError> {
        let mut failures = HashMap::new();
        for addr in addrs {
            let reply = self.command(&format!("RCPT TO:<{addr}>")).await?;
            if !reply.is_positive() {
                failures.insert(
                    addr.clone(),
                    ClientError::Rejected {
                        code: reply.code,
                        text: reply.text(),
                    },
                );
            }
        }
        Ok(failures)
    }

    pub async fn quit(&mut self) -> Result<(), ClientError> {
        let reply = self.command("QUIT").await?;
        self.expect_positive(reply)
    }

    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.reader_mut().get_mut().shutdown().await?;
        Ok(())
    }

    async fn command(&mut self, line: &str) -> Result<Reply, ClientError> {
        let reader = self.reader_mut();
        reader.get_mut().write_all(line.as_bytes()).await?;
        reader.get_mut().write_all(b"\r\n").await?;
        reader.get_mut().flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply, ClientError> {
        let mut lines = Vec::new();
        let mut code = 0u16;
        loop {
            let mut line = String::new();
            let n = self.reader_mut().read_line(&mut line).await?;
            if n == 0 {
                return Err(ClientError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )));
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.len() < 4 {
                return Err(ClientError::MalformedReply(line.to_string()));
            }
            code = line[..3]
                .parse()
                .map_err(|_| ClientError::MalformedReply(line.to_string()))?;
            let separator = line.as_bytes()[3];
            lines.push(line[4..].to_string());
            if separator == b' ' {
                break;
            }
        }
        Ok(Reply { code, lines })
    }

    fn expect_positive(&self, reply: Reply) -> Result<(), ClientError> {
        if reply.is_positive() {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                code: reply.code,
                text: reply.text(),
            })
        }
    }
}

/// Minimal base64 encoder for AUTH PLAIN; avoids pulling in a whole base64
/// crate for one 3-field SASL payload.
fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}
