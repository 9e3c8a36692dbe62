//! Live game server directory.
//!
//! The directory is fetched from the load balancer as one payload: a
//! 2-byte prefix followed by NUL-separated fields read pairwise as
//! `(address, name)`. Each successful fetch builds a new immutable
//! [`DirectorySnapshot`] which replaces the active one in a single swap.
//! Lookups work against whatever snapshot they were handed and never
//! wait on a refresh in progress.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::common::error::{DirectoryError, DirectoryResult};
use crate::common::wait_for_shutdown;
use crate::link::record::DirectoryRecord;

/// Default directory endpoint.
pub const DEFAULT_DIRECTORY_URL: &str = "http://lb.diep.io/v2/find_servers";

/// Leading bytes of the payload that carry no records.
const PAYLOAD_PREFIX_LEN: usize = 2;

const FIELD_SEPARATOR: char = '\0';

/// Split a raw directory payload into records.
///
/// An empty body after the prefix is an empty directory. An odd number of
/// fields, invalid UTF-8 or any malformed record fails the whole payload.
pub fn parse_payload(payload: &[u8]) -> DirectoryResult<Vec<DirectoryRecord>> {
    let body = payload
        .get(PAYLOAD_PREFIX_LEN..)
        .ok_or_else(|| DirectoryError::Malformed {
            message: format!("payload is {} bytes, shorter than its prefix", payload.len()),
        })?;

    let text = std::str::from_utf8(body).map_err(|e| DirectoryError::Malformed {
        message: format!("payload is not UTF-8: {}", e),
    })?;

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
    if fields.len() % 2 != 0 {
        return Err(DirectoryError::Malformed {
            message: format!("odd field count {}", fields.len()),
        });
    }

    fields
        .chunks_exact(2)
        .map(|pair| DirectoryRecord::new(pair[0], pair[1]).map_err(DirectoryError::from))
        .collect()
}

/// One complete, immutable copy of the directory.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    records: Vec<DirectoryRecord>,
    /// ip -> index of its first record.
    by_ip: HashMap<String, usize>,
    fetched_at: Option<DateTime<Utc>>,
}

impl DirectorySnapshot {
    /// The snapshot in place before the first successful refresh.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(records: Vec<DirectoryRecord>, fetched_at: DateTime<Utc>) -> Self {
        let mut by_ip = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            by_ip.entry(record.ip().to_string()).or_insert(i);
        }
        Self {
            records,
            by_ip,
            fetched_at: Some(fetched_at),
        }
    }

    /// Build a snapshot from a raw payload, stamped with the current time.
    pub fn from_payload(payload: &[u8]) -> DirectoryResult<Self> {
        Ok(Self::new(parse_payload(payload)?, Utc::now()))
    }

    /// Find the record whose host part is exactly `ip`.
    pub fn lookup(&self, ip: &str) -> Option<&DirectoryRecord> {
        self.by_ip.get(ip).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the payload was fetched; `None` for the startup snapshot.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Where directory payloads come from.
pub trait DirectorySource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = DirectoryResult<Bytes>> + Send;
}

/// Fetches the directory over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDirectorySource {
    client: reqwest::Client,
    url: String,
}

impl HttpDirectorySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> DirectoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl DirectorySource for HttpDirectorySource {
    fn fetch(&self) -> impl Future<Output = DirectoryResult<Bytes>> + Send {
        async move {
            debug!("Fetching server directory from {}", self.url);
            let response = self.client.get(&self.url).send().await.map_err(map_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                return Err(DirectoryError::Status(status.as_u16()));
            }

            response.bytes().await.map_err(map_reqwest)
        }
    }
}

fn map_reqwest(e: reqwest::Error) -> DirectoryError {
    if e.is_timeout() {
        DirectoryError::Timeout
    } else {
        DirectoryError::Http(e)
    }
}

/// Shared handle to the active directory snapshot.
///
/// Cloning the handle shares the same snapshot slot.
#[derive(Debug, Clone)]
pub struct ServerDirectory {
    active: Arc<watch::Sender<Arc<DirectorySnapshot>>>,
}

impl Default for ServerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerDirectory {
    /// Create a directory holding an empty snapshot.
    pub fn new() -> Self {
        let (active, _) = watch::channel(Arc::new(DirectorySnapshot::empty()));
        Self {
            active: Arc::new(active),
        }
    }

    /// The snapshot active right now.
    ///
    /// The returned snapshot stays valid and unchanged for as long as the
    /// caller holds it, even if a refresh replaces it meanwhile.
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.active.borrow().clone()
    }

    /// Look up a record in the active snapshot.
    pub fn lookup(&self, ip: &str) -> Option<DirectoryRecord> {
        self.snapshot().lookup(ip).cloned()
    }

    /// Install a new snapshot, returning the one it replaced.
    pub fn replace(&self, snapshot: DirectorySnapshot) -> Arc<DirectorySnapshot> {
        self.active.send_replace(Arc::new(snapshot))
    }

    /// Fetch and install a fresh snapshot.
    ///
    /// On any failure the active snapshot is left in place. Returns the
    /// number of records installed.
    pub async fn refresh<S: DirectorySource>(
        &self,
        source: &S,
        timeout: Duration,
    ) -> DirectoryResult<usize> {
        let payload = match tokio::time::timeout(timeout, source.fetch()).await {
            Ok(result) => result?,
            Err(_) => return Err(DirectoryError::Timeout),
        };

        let snapshot = DirectorySnapshot::from_payload(&payload)?;
        let count = snapshot.len();
        self.replace(snapshot);
        Ok(count)
    }
}

/// Timing for the background refresh task.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    /// Delay between successful refreshes.
    pub interval: Duration,
    /// Upper bound on a single fetch.
    pub timeout: Duration,
}

/// Backoff for retrying a failed refresh, capped at the regular interval.
fn retry_backoff(interval: Duration) -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5).min(interval))
        .with_max_delay(interval)
        .with_factor(2.0)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Keep the directory fresh until shutdown.
///
/// Refreshes immediately, then every `interval`. Failures retry sooner
/// with exponential backoff. A shutdown signal cancels an in-flight fetch.
pub async fn run_refresh_loop<S: DirectorySource>(
    directory: ServerDirectory,
    source: S,
    settings: RefreshSettings,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = retry_backoff(settings.interval);

    loop {
        let outcome = tokio::select! {
            result = directory.refresh(&source, settings.timeout) => Some(result),
            _ = wait_for_shutdown(&mut shutdown_rx) => None,
        };

        let delay = match outcome {
            None => {
                info!("Shutdown signal received, cancelling directory refresh");
                break;
            }
            Some(Ok(count)) => {
                info!("Server directory refreshed: {} servers", count);
                backoff = retry_backoff(settings.interval);
                settings.interval
            }
            Some(Err(e)) => {
                let delay = backoff.next().unwrap_or(settings.interval);
                warn!(
                    "Directory refresh failed ({}), keeping {} cached servers. Retrying in {:.1}s",
                    e,
                    directory.snapshot().len(),
                    delay.as_secs_f64()
                );
                delay
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_for_shutdown(&mut shutdown_rx) => {
                info!("Shutdown signal received, stopping directory refresh");
                break;
            }
        }
    }
}
