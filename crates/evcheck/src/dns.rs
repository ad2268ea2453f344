//! MX record lookup. The checker consumes only the `host` field of each
//! record and the iteration order given by the resolver (§6).

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct MxRecord {
    pub host: String,
    pub preference: u16,
}

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("mx lookup failed: {0}")]
    Lookup(String),
    #[error("no mx records for domain")]
    NoRecords,
}

pub struct MxResolver {
    resolver: TokioAsyncResolver,
}

impl MxResolver {
    pub fn new() -> Self {
        let opts = ResolverOpts {
            try_tcp_on_error: true,
            use_hosts_file: false,
            ..ResolverOpts::default()
        };
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::cloudflare(), opts),
        }
    }

    pub async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsError> {
        let lookup = self
            .resolver
            .mx_lookup(domain)
            .await
            .map_err(|e| DnsError::Lookup(e.to_string()))?;

        let mut records: Vec<MxRecord> = lookup
            .iter()
            .map(|mx| MxRecord {
                host: mx.exchange().to_string().trim_end_matches('.').to_string(),
                preference: mx.preference(),
            })
            .collect();

        if records.is_empty() {
            return Err(DnsError::NoRecords);
        }

        records.sort_by_key(|r| r.preference);
        Ok(records)
    }
}

impl Default for MxResolver {
    fn default() -> Self {
        Self::new()
    }
}
