//! Record mutation service.
//!
//! # Responsibility
//! - Validate add/delete input before any store call.
//! - Run read-modify-write over the whole tree, then read back and
//!   re-aggregate.
//!
//! # Invariants
//! - The caller's `TrackerState` is never mutated; a new state is returned
//!   on success, so a failed mutation leaves the caller on its old state.
//! - Mutations are not atomic with respect to other writers (last write
//!   wins).
//! - A committed write followed by a failed read-back is reported as
//!   `ReadBackFailed`, distinct from a failed write.

use crate::aggregate::{compute, Aggregates};
use crate::model::record::{NewRecord, RecordPath, RecordValidationError};
use crate::model::tree::RecordTree;
use crate::store::retry::RetryPolicy;
use crate::store::{DocumentStore, RecordStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Loaded tree plus the aggregates computed from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    pub tree: RecordTree,
    pub aggregates: Aggregates,
}

impl TrackerState {
    /// Builds state by aggregating `tree`.
    pub fn from_tree(tree: RecordTree) -> Self {
        let aggregates = compute(Some(&tree));
        Self { tree, aggregates }
    }
}

/// Raw add-form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddRecordRequest {
    pub year: String,
    pub month: String,
    pub day: String,
    /// `x` (Natural) or `1` (Self).
    pub value: String,
}

impl AddRecordRequest {
    pub fn new(
        year: impl Into<String>,
        month: impl Into<String>,
        day: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
            day: day.into(),
            value: value.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any store call.
    Validation(RecordValidationError),
    /// Delete target does not exist in the current tree.
    RecordNotFound(RecordPath),
    /// Store failure before the write was acknowledged.
    Store(StoreError),
    /// The write succeeded but reading the tree back failed.
    ReadBackFailed {
        /// State computed from the tree that was written.
        committed: Box<TrackerState>,
        source: StoreError,
    },
}

impl ServiceError {
    /// Whether the persisted document was changed by the failed call.
    pub fn write_committed(&self) -> bool {
        matches!(self, Self::ReadBackFailed { .. })
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::RecordNotFound(path) => write!(f, "record not found: {path}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::ReadBackFailed { source, .. } => {
                write!(f, "record saved but reload failed: {source}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::RecordNotFound(_) => None,
            Self::Store(err) => Some(err),
            Self::ReadBackFailed { source, .. } => Some(source),
        }
    }
}

impl From<RecordValidationError> for ServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Use-case service over one record document.
pub struct RecordService<D: DocumentStore> {
    store: RecordStore<D>,
    retry: RetryPolicy,
}

impl<D: DocumentStore> RecordService<D> {
    pub fn new(store: RecordStore<D>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Retries transient store failures under `retry`.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &RecordStore<D> {
        &self.store
    }

    /// Reads the tree and aggregates it. No document loads as empty.
    pub fn load(&self) -> ServiceResult<TrackerState> {
        let tree = self.read_tree()?;
        Ok(TrackerState::from_tree(tree))
    }

    /// Sets `year/month/day` to the requested tag, writes, reloads.
    ///
    /// # Errors
    /// - `Validation` for blank fields, unknown month or unsupported value.
    /// - `Store` when the write fails; nothing was changed.
    /// - `ReadBackFailed` when the write succeeded but the reload failed.
    pub fn add(
        &self,
        state: &TrackerState,
        request: &AddRecordRequest,
    ) -> ServiceResult<TrackerState> {
        let record = NewRecord::parse(
            &request.year,
            &request.month,
            &request.day,
            &request.value,
        )
        .map_err(|err| {
            warn!("event=record_add module=service status=rejected reason={err}");
            err
        })?;
        self.add_record(state, &record)
    }

    /// Writes an already validated record.
    pub fn add_record(
        &self,
        state: &TrackerState,
        record: &NewRecord,
    ) -> ServiceResult<TrackerState> {
        let mut tree = state.tree.clone();
        let replaced = tree.insert(&record.path, record.value()).is_some();
        info!(
            "event=record_add module=service status=start path={} replaced={replaced}",
            record.path
        );
        self.commit("record_add", tree)
    }

    /// Removes `year/month/day`, pruning emptied nodes, writes, reloads.
    ///
    /// # Errors
    /// - `Validation` for blank fields.
    /// - `RecordNotFound` when the leaf is absent; nothing is written.
    ///
    /// Segments are matched trimmed first, then exactly as given, so stored
    /// keys with surrounding whitespace stay deletable.
    /// - `Store` / `ReadBackFailed` as for `add`.
    pub fn delete(
        &self,
        state: &TrackerState,
        year: &str,
        month: &str,
        day: &str,
    ) -> ServiceResult<TrackerState> {
        let path = RecordPath::new(year, month, day)?;
        let path = if state.tree.contains(&path) {
            path
        } else {
            let verbatim = RecordPath::verbatim(year, month, day);
            if !state.tree.contains(&verbatim) {
                warn!("event=record_delete module=service status=rejected reason=not_found path={path}");
                return Err(ServiceError::RecordNotFound(path));
            }
            verbatim
        };

        let mut tree = state.tree.clone();
        tree.remove(&path);
        info!("event=record_delete module=service status=start path={path}");
        self.commit("record_delete", tree)
    }

    fn commit(&self, event: &'static str, tree: RecordTree) -> ServiceResult<TrackerState> {
        let started_at = Instant::now();

        if let Err(err) = self.retry.run("write", || self.store.write(&tree)) {
            error!(
                "event={event} module=service status=error stage=write duration_ms={} error_kind={}",
                started_at.elapsed().as_millis(),
                err.kind.as_str()
            );
            return Err(ServiceError::Store(err));
        }

        match self.read_tree() {
            Ok(reloaded) => {
                let state = TrackerState::from_tree(reloaded);
                info!(
                    "event={event} module=service status=ok duration_ms={} leaves={} total={}",
                    started_at.elapsed().as_millis(),
                    state.tree.leaf_count(),
                    state.aggregates.totals.total()
                );
                Ok(state)
            }
            Err(source) => {
                error!(
                    "event={event} module=service status=error stage=read_back duration_ms={} error_kind={}",
                    started_at.elapsed().as_millis(),
                    source.kind.as_str()
                );
                Err(ServiceError::ReadBackFailed {
                    committed: Box::new(TrackerState::from_tree(tree)),
                    source,
                })
            }
        }
    }

    fn read_tree(&self) -> Result<RecordTree, StoreError> {
        self.retry
            .run("read", || self.store.read())
            .map(Option::unwrap_or_default)
    }
}
