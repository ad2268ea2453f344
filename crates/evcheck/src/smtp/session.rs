//! SMTP session (C5): a thin facade over a connected [`SmtpClient`]
//! exposing one method per envelope stage, matching `SendMailStruct` in
//! the source. Owns the opportunistic STARTTLS-then-AUTH policy.

use crate::smtp::client::{ClientError, SmtpClient, Stream};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::{rustls::ClientConfig, TlsConnector};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("server doesn't support AUTH")]
    AuthUnsupported,
    #[error("invalid server name for TLS: {0}")]
    InvalidServerName(String),
}

pub struct Session {
    client: SmtpClient,
    tls_config: Option<Arc<ClientConfig>>,
    credentials: Option<Credentials>,
}

impl Session {
    pub fn new(
        client: SmtpClient,
        tls_config: Option<Arc<ClientConfig>>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            client,
            tls_config,
            credentials,
        }
    }

    pub async fn hello(&mut self, local_name: &str) -> Result<(), SessionError> {
        self.client.hello(local_name).await.map_err(Into::into)
    }

    /// Opportunistically upgrades to TLS if the server advertised STARTTLS
    /// and a TLS config was supplied, then authenticates if credentials
    /// were supplied. Credentials without server-side AUTH support is an
    /// error; a missing TLS config or unadvertised STARTTLS is not.
    pub async fn auth(&mut self, host: &str) -> Result<(), SessionError> {
        if self.client.extension("STARTTLS").is_some() {
            if let Some(config) = self.tls_config.clone() {
                self.upgrade_to_tls(host, config).await?;
            }
        }

        if let Some(credentials) = self.credentials.clone() {
            if self.client.extension("AUTH").is_none() {
                return Err(SessionError::AuthUnsupported);
            }
            self.client
                .auth_plain(&credentials.username, &credentials.password)
                .await?;
        }

        Ok(())
    }

    async fn upgrade_to_tls(
        &mut self,
        host: &str,
        config: Arc<ClientConfig>,
    ) -> Result<(), SessionError> {
        self.client.starttls_command().await?;
        let raw = self.client.take_stream();
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| SessionError::InvalidServerName(host.to_string()))?;
        let connector = TlsConnector::from(config);
        let tls_stream = connector
            .connect(server_name, raw)
            .await
            .map_err(ClientError::Io)?;
        self.client.rebind(Box::new(tls_stream) as Box<dyn Stream>);
        self.client.hello(host).await?;
        Ok(())
    }

    pub async fn mail(&mut self, from: &str) -> Result<(), SessionError> {
        self.client.mail(from).await.map_err(Into::into)
    }

    pub async fn rcpts(
        &mut self,
        addrs: &[String],
    ) -> Result<HashMap<String, ClientError>, SessionError> {
        self.client.rcpts(addrs).await.map_err(Into::into)
    }

    pub async fn quit(&mut self) -> Result<(), SessionError> {
        self.client.quit().await.map_err(Into::into)
    }

    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.client.close().await.map_err(Into::into)
    }
}
