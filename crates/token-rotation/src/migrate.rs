//! Batch re-encryption of stored tokens under the current key.
//!
//! One batch fetches `batch_size + 1` records in stable id order; the extra
//! row only answers "is there more?" and is dropped before processing. Each
//! record's two token fields are evaluated independently, and only the
//! non-current ones are decrypted, re-encrypted, and written back — in a
//! single field-subset update per record.
//!
//! Repeated runs converge: once a record is current, every later pass counts
//! it as skipped without touching the cipher. Concurrent invocations are
//! redundant but harmless as long as the backend's per-record update is
//! atomic.

use serde::Serialize;
use tracing::{debug, info, warn};

use token_crypto::versioned::{is_current_version, re_encrypt_with_current_version};
use token_crypto::KeyRing;

use crate::error::MigrationError;
use crate::store::{ConnectionRecord, ConnectionStore, TokenUpdate};

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Tuning knobs for one migration invocation.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Records processed per batch.
    pub batch_size: usize,

    /// When `true` (the default), a failed record is logged and counted and
    /// the batch moves on; when `false`, the first failure aborts the batch.
    pub continue_on_error: bool,

    /// Report what would change without writing anything.
    pub dry_run: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_error: true,
            dry_run: false,
        }
    }
}

/// One failed record, as captured in a [`BatchReport`].
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub record_id: String,
    pub message: String,
    /// `invalid_format` | `invalid_key` | `decryption_failed` |
    /// `key_version_not_found` | `store`
    pub code: &'static str,
}

/// Per-invocation counters, aggregable across batches.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<RecordFailure>,
    /// More records exist beyond this batch's window.
    pub has_more: bool,
}

impl BatchReport {
    /// Fold another batch's counters into this report. `has_more` takes the
    /// later batch's value, so an aggregate ends up with the final page's
    /// answer.
    pub fn absorb(&mut self, other: BatchReport) {
        self.processed += other.processed;
        self.migrated += other.migrated;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.errors.extend(other.errors);
        self.has_more = other.has_more;
    }
}

/// Migrate one batch of records starting at `offset`.
///
/// Scheduled callers pass `offset = 0` and rely on convergence; the offset
/// parameter exists so [`run_full_key_rotation`] can walk the whole table in
/// one invocation without re-scanning what it already covered.
///
/// # Errors
///
/// Returns the store error if the page fetch fails, or — only when
/// `continue_on_error` is `false` — the first per-record error.
pub async fn migrate_batch<S>(
    store: &S,
    ring: &KeyRing,
    offset: usize,
    opts: &MigrationOptions,
) -> Result<BatchReport, MigrationError>
where
    S: ConnectionStore + ?Sized,
{
    // A zero batch size would make the lookahead row the whole page and the
    // driver loop spin without progress.
    let batch_size = opts.batch_size.max(1);
    let mut page = store.fetch_page(offset, batch_size + 1).await?;
    let has_more = page.len() > batch_size;
    if has_more {
        // The extra row is only a lookahead probe.
        page.truncate(batch_size);
    }

    let mut report = BatchReport {
        has_more,
        ..BatchReport::default()
    };

    for record in &page {
        report.processed += 1;

        let access_current = is_current_version(&record.access_token, ring);
        let refresh_current = is_current_version(&record.refresh_token, ring);

        if access_current && refresh_current {
            report.skipped += 1;
            continue;
        }

        if opts.dry_run {
            debug!(record_id = %record.id, "dry run: record would be migrated");
            report.migrated += 1;
            continue;
        }

        match migrate_record(store, ring, record, access_current, refresh_current).await {
            Ok(()) => report.migrated += 1,
            Err(e) => {
                warn!(
                    record_id = %record.id,
                    code = e.code_label(),
                    error = %e,
                    "record migration failed"
                );
                report.failed += 1;
                report.errors.push(RecordFailure {
                    record_id: record.id.clone(),
                    message: e.to_string(),
                    code: e.code_label(),
                });
                if !opts.continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    Ok(report)
}

/// Re-encrypt a record's outdated fields and persist them in one update.
async fn migrate_record<S>(
    store: &S,
    ring: &KeyRing,
    record: &ConnectionRecord,
    access_current: bool,
    refresh_current: bool,
) -> Result<(), MigrationError>
where
    S: ConnectionStore + ?Sized,
{
    let mut update = TokenUpdate::default();
    if !access_current {
        update.access_token = Some(re_encrypt_with_current_version(&record.access_token, ring)?);
    }
    if !refresh_current {
        update.refresh_token = Some(re_encrypt_with_current_version(
            &record.refresh_token,
            ring,
        )?);
    }
    store.update_tokens(&record.id, update).await?;
    Ok(())
}

/// Drive [`migrate_batch`] over the whole store, summing counters, until no
/// more records remain. Pure composition; no state survives the loop.
///
/// # Errors
///
/// Propagates the same errors as [`migrate_batch`].
pub async fn run_full_key_rotation<S>(
    store: &S,
    ring: &KeyRing,
    opts: &MigrationOptions,
) -> Result<BatchReport, MigrationError>
where
    S: ConnectionStore + ?Sized,
{
    let mut total = BatchReport::default();
    let mut offset = 0;
    loop {
        let batch = migrate_batch(store, ring, offset, opts).await?;
        info!(
            offset,
            processed = batch.processed,
            migrated = batch.migrated,
            skipped = batch.skipped,
            failed = batch.failed,
            has_more = batch.has_more,
            "key rotation batch complete"
        );
        let processed = batch.processed;
        let has_more = batch.has_more;
        total.absorb(batch);
        if !has_more {
            break;
        }
        offset += processed;
    }

    info!(
        processed = total.processed,
        migrated = total.migrated,
        skipped = total.skipped,
        failed = total.failed,
        "key rotation run complete"
    );
    Ok(total)
}
