//! Random-recipient cache (C8): per-domain memoization of the catch-all
//! probe's outcome, since it is deterministic per domain and stable for the
//! cache's lifetime. Implemented as a second `RandomRcptPort`, not a
//! subclass of the real probe (§9 redesign flag).

use async_trait::async_trait;
use evcheck_core::stage_error::ValidationError;
use evcheck_core::Cache;
use std::sync::Arc;
use tracing::error;

use crate::smtp::random_rcpt::RandomRcptPort;
use crate::smtp::session::Session;

pub struct CachingRandomRcpt {
    inner: Arc<dyn RandomRcptPort>,
    cache: Arc<dyn Cache<Vec<ValidationError>>>,
}

impl CachingRandomRcpt {
    pub fn new(inner: Arc<dyn RandomRcptPort>, cache: Arc<dyn Cache<Vec<ValidationError>>>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl RandomRcptPort for CachingRandomRcpt {
    async fn call(&self, session: &mut Session, domain: &str) -> Vec<ValidationError> {
        match self.cache.get(domain).await {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(err) => error!(%err, domain, "random-rcpt cache get"),
        }

        let errors = self.inner.call(session, domain).await;
        if let Err(err) = self.cache.set(domain, &errors).await {
            error!(%err, domain, "random-rcpt cache set");
        }
        errors
    }
}
