//! Read-only verification that a rotation actually finished.
//!
//! Operators run this as the gate before retiring the previous key: only a
//! report with zero outdated and zero unparseable records makes dropping
//! `ENCRYPTION_KEY_PREVIOUS` safe. The scan parses envelopes but never
//! decrypts and never writes.

use serde::Serialize;
use tracing::info;

use token_crypto::format::Envelope;
use token_crypto::KeyRing;

use crate::error::MigrationError;
use crate::store::{ConnectionRecord, ConnectionStore};

/// Where one record stands relative to the ring's current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Both token fields are stamped with the current version.
    Current,
    /// At least one field parses but carries an older version or no version.
    Outdated,
    /// At least one field does not parse as either envelope shape.
    /// Stronger signal than outdated: it must block key retirement.
    Unparseable,
}

/// Full-scan classification counts, with the offending ids.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub total: usize,
    pub current: usize,
    pub outdated: usize,
    pub unparseable: usize,
    pub outdated_ids: Vec<String>,
    pub unparseable_ids: Vec<String>,
}

impl VerificationReport {
    /// True when retiring the previous key cannot strand any record.
    pub fn is_fully_rotated(&self) -> bool {
        self.outdated == 0 && self.unparseable == 0
    }
}

/// Classify one record without decrypting anything.
pub fn classify_record(record: &ConnectionRecord, ring: &KeyRing) -> RecordStatus {
    let mut outdated = false;
    for field in [&record.access_token, &record.refresh_token] {
        match Envelope::parse(field) {
            Err(_) => return RecordStatus::Unparseable,
            Ok(envelope) => {
                if envelope.version != Some(ring.current().version()) {
                    outdated = true;
                }
            }
        }
    }
    if outdated {
        RecordStatus::Outdated
    } else {
        RecordStatus::Current
    }
}

/// Walk every record in pages of `page_size`, classifying each one.
///
/// # Errors
///
/// Returns the store error if any page fetch fails.
pub async fn verify_key_rotation<S>(
    store: &S,
    ring: &KeyRing,
    page_size: usize,
) -> Result<VerificationReport, MigrationError>
where
    S: ConnectionStore + ?Sized,
{
    let mut report = VerificationReport::default();
    let mut offset = 0;
    loop {
        let page = store.fetch_page(offset, page_size).await?;
        if page.is_empty() {
            break;
        }
        let fetched = page.len();
        for record in page {
            report.total += 1;
            match classify_record(&record, ring) {
                RecordStatus::Current => report.current += 1,
                RecordStatus::Outdated => {
                    report.outdated += 1;
                    report.outdated_ids.push(record.id);
                }
                RecordStatus::Unparseable => {
                    report.unparseable += 1;
                    report.unparseable_ids.push(record.id);
                }
            }
        }
        if fetched < page_size {
            break;
        }
        offset += fetched;
    }

    info!(
        total = report.total,
        current = report.current,
        outdated = report.outdated,
        unparseable = report.unparseable,
        "key rotation verification complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use token_crypto::cipher;
    use token_crypto::versioned::encrypt_with_version;
    use token_crypto::KeyMaterial;

    use crate::memory::InMemoryConnectionStore;
    use crate::migrate::{run_full_key_rotation, MigrationOptions};

    const KEY_V1: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY_V2: &str = "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";

    fn ring_v1() -> KeyRing {
        KeyRing::new(KeyMaterial::from_hex(1, KEY_V1).unwrap(), None).unwrap()
    }

    fn ring_v2() -> KeyRing {
        KeyRing::new(
            KeyMaterial::from_hex(2, KEY_V2).unwrap(),
            Some(KeyMaterial::from_hex(1, KEY_V1).unwrap()),
        )
        .unwrap()
    }

    fn record(id: &str, access: String, refresh: String) -> ConnectionRecord {
        ConnectionRecord {
            id: id.into(),
            access_token: access,
            refresh_token: refresh,
        }
    }

    #[test]
    fn classification_covers_all_shapes() {
        let ring = ring_v2();
        let current = encrypt_with_version("x", &ring).unwrap();
        let old = encrypt_with_version("x", &ring_v1()).unwrap();
        let legacy = cipher::encrypt("x", ring.current().key()).unwrap();

        assert_eq!(
            classify_record(&record("a", current.clone(), current.clone()), &ring),
            RecordStatus::Current
        );
        assert_eq!(
            classify_record(&record("b", current.clone(), old.clone()), &ring),
            RecordStatus::Outdated
        );
        assert_eq!(
            classify_record(&record("c", legacy.clone(), current.clone()), &ring),
            RecordStatus::Outdated
        );
        // Unparseable wins over outdated.
        assert_eq!(
            classify_record(&record("d", old, "garbage".into()), &ring),
            RecordStatus::Unparseable
        );
    }

    #[tokio::test]
    async fn scan_counts_and_collects_ids() {
        let ring = ring_v2();
        let store = InMemoryConnectionStore::new();
        let current = encrypt_with_version("x", &ring).unwrap();
        let old = encrypt_with_version("x", &ring_v1()).unwrap();

        store.insert(record("a", current.clone(), current.clone())).await;
        store.insert(record("b", old.clone(), current.clone())).await;
        store.insert(record("c", "junk".into(), current.clone())).await;

        let report = verify_key_rotation(&store, &ring, 2).await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.current, 1);
        assert_eq!(report.outdated, 1);
        assert_eq!(report.unparseable, 1);
        assert_eq!(report.outdated_ids, vec!["b"]);
        assert_eq!(report.unparseable_ids, vec!["c"]);
        assert!(!report.is_fully_rotated());
    }

    #[tokio::test]
    async fn scan_never_mutates_the_store() {
        let ring = ring_v2();
        let store = InMemoryConnectionStore::new();
        let old = encrypt_with_version("x", &ring_v1()).unwrap();
        store.insert(record("a", old.clone(), old)).await;

        let before = store.all().await;
        verify_key_rotation(&store, &ring, 10).await.unwrap();
        assert_eq!(store.all().await, before);
    }

    #[tokio::test]
    async fn full_rotation_then_verify_reports_clean() {
        let ring = ring_v2();
        let store = InMemoryConnectionStore::new();
        let old_ring = ring_v1();
        for i in 0..7 {
            store
                .insert(record(
                    &format!("conn-{i}"),
                    encrypt_with_version(&format!("a-{i}"), &old_ring).unwrap(),
                    cipher::encrypt(&format!("r-{i}"), old_ring.current().key()).unwrap(),
                ))
                .await;
        }

        let rotation = run_full_key_rotation(
            &store,
            &ring,
            &MigrationOptions {
                batch_size: 3,
                ..MigrationOptions::default()
            },
        )
        .await
        .unwrap();
        assert!(!rotation.has_more);

        let report = verify_key_rotation(&store, &ring, 3).await.unwrap();
        assert_eq!(report.total, 7);
        assert_eq!(report.outdated, 0);
        assert_eq!(report.unparseable, 0);
        assert!(report.is_fully_rotated());
    }

    #[tokio::test]
    async fn empty_store_is_trivially_rotated() {
        let store = InMemoryConnectionStore::new();
        let report = verify_key_rotation(&store, &ring_v2(), 10).await.unwrap();
        assert_eq!(report.total, 0);
        assert!(report.is_fully_rotated());
    }
}
