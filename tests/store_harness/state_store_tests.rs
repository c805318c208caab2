//! Macro-generated test suite for `StateStore` contract validation.
//!
//! # Generated Tests
//!
//! ## Point access
//! - `test_get_missing`: missing key is `None`, not an error
//! - `test_put_then_get`: bytes come back unchanged, version starts at 1
//! - `test_put_bumps_version`: every put increments the key's version
//! - `test_empty_value`: empty byte payloads are stored as-is
//! - `test_get_unstorable_key`: empty and over-long keys read as missing
//!
//! ## Compare-and-swap
//! - `test_insert_if_absent`: `expected = None` only succeeds on a free key
//! - `test_cas_matching_version`: write at the read version succeeds
//! - `test_cas_stale_version`: stale version conflicts and leaves the entry
//! - `test_cas_on_missing_key`: expecting a version of a missing key conflicts
//! - `test_concurrent_cas_single_winner`: racing writers at one version
//!
//! ## Scans
//! - `test_scan_empty_store`
//! - `test_scan_whole_store`: an empty start bound covers every key
//! - `test_scan_key_order`: lexicographic order, not insertion order
//! - `test_scan_half_open`: start inclusive, end exclusive
//! - `test_scan_prefix_excludes_neighbours`: a key space excludes adjacent prefixes
//! - `test_scan_unbounded_end`
//! - `test_scan_inverted_range`: end before start yields nothing
//! - `test_scan_oversized_bounds`: bounds longer than any key still order correctly
//! - `test_scan_restartable`: a second scan re-reads current state

/// Generate a full `StateStore` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty store implementing
/// `StateStore + Clone + 'static`. It is re-evaluated for each test.
#[macro_export]
macro_rules! state_store_tests {
    ($factory:expr) => {
        mod state_store_contract_tests {
            use super::*;
            use invoice_ledger::core::error::StoreError;
            use invoice_ledger::core::keyspace::{KeyRange, KeySpace};
            use invoice_ledger::core::store::{StateStore, MAX_KEY_LEN};

            // ==================================================================
            // Point access
            // ==================================================================

            #[tokio::test]
            async fn test_get_missing() {
                let store = $factory;
                assert!(store.get("INVOICE1").await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_put_then_get() {
                let store = $factory;
                let bytes = invoice_bytes("INVOICE1");
                assert_eq!(store.put("INVOICE1", bytes.clone()).await.unwrap(), 1);

                let entry = store.get("INVOICE1").await.unwrap().unwrap();
                assert_eq!(entry.key, "INVOICE1");
                assert_eq!(entry.value, bytes);
                assert_eq!(entry.version, 1);
            }

            #[tokio::test]
            async fn test_put_bumps_version() {
                let store = $factory;
                for expected in 1..=3u64 {
                    let version = store.put("INVOICE1", vec![expected as u8]).await.unwrap();
                    assert_eq!(version, expected);
                }
                let entry = store.get("INVOICE1").await.unwrap().unwrap();
                assert_eq!(entry.value, vec![3]);
                assert_eq!(entry.version, 3);
            }

            #[tokio::test]
            async fn test_empty_value() {
                let store = $factory;
                store.put("INVOICE1", Vec::new()).await.unwrap();
                let entry = store.get("INVOICE1").await.unwrap().unwrap();
                assert!(entry.value.is_empty());
            }

            #[tokio::test]
            async fn test_get_unstorable_key() {
                let store = $factory;
                assert!(store.get("").await.unwrap().is_none());
                let long = "K".repeat(MAX_KEY_LEN + 1);
                assert!(store.get(&long).await.unwrap().is_none());
            }

            // ==================================================================
            // Compare-and-swap
            // ==================================================================

            #[tokio::test]
            async fn test_insert_if_absent() {
                let store = $factory;
                let version = store
                    .put_if_version("INVOICE1", None, b"first".to_vec())
                    .await
                    .unwrap();
                assert_eq!(version, 1);

                let err = store
                    .put_if_version("INVOICE1", None, b"second".to_vec())
                    .await
                    .unwrap_err();
                match err {
                    StoreError::VersionConflict {
                        key,
                        expected,
                        actual,
                    } => {
                        assert_eq!(key, "INVOICE1");
                        assert_eq!(expected, None);
                        assert_eq!(actual, Some(1));
                    }
                    other => panic!("Expected VersionConflict, got {:?}", other),
                }

                let entry = store.get("INVOICE1").await.unwrap().unwrap();
                assert_eq!(entry.value, b"first".to_vec());
            }

            #[tokio::test]
            async fn test_cas_matching_version() {
                let store = $factory;
                store.put("INVOICE1", b"v1".to_vec()).await.unwrap();
                let version = store
                    .put_if_version("INVOICE1", Some(1), b"v2".to_vec())
                    .await
                    .unwrap();
                assert_eq!(version, 2);
                assert_eq!(
                    store.get("INVOICE1").await.unwrap().unwrap().value,
                    b"v2".to_vec()
                );
            }

            #[tokio::test]
            async fn test_cas_stale_version() {
                let store = $factory;
                store.put("INVOICE1", b"v1".to_vec()).await.unwrap();
                store.put("INVOICE1", b"v2".to_vec()).await.unwrap();

                let err = store
                    .put_if_version("INVOICE1", Some(1), b"lost".to_vec())
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::VersionConflict {
                        expected: Some(1),
                        actual: Some(2),
                        ..
                    }
                ));

                let entry = store.get("INVOICE1").await.unwrap().unwrap();
                assert_eq!(entry.value, b"v2".to_vec());
                assert_eq!(entry.version, 2);
            }

            #[tokio::test]
            async fn test_cas_on_missing_key() {
                let store = $factory;
                let err = store
                    .put_if_version("INVOICE1", Some(1), b"v".to_vec())
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::VersionConflict { actual: None, .. }
                ));
                assert!(store.get("INVOICE1").await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_concurrent_cas_single_winner() {
                let store = $factory;
                store.put("INVOICE1", b"v1".to_vec()).await.unwrap();

                let mut handles = Vec::new();
                for i in 0..8u8 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        store.put_if_version("INVOICE1", Some(1), vec![i]).await
                    }));
                }

                let mut winners = 0;
                for handle in handles {
                    match handle.await.unwrap() {
                        Ok(version) => {
                            assert_eq!(version, 2);
                            winners += 1;
                        }
                        Err(StoreError::VersionConflict { .. }) => {}
                        Err(other) => panic!("unexpected store error: {:?}", other),
                    }
                }
                assert_eq!(winners, 1);
                assert_eq!(store.get("INVOICE1").await.unwrap().unwrap().version, 2);
            }

            // ==================================================================
            // Scans
            // ==================================================================

            #[tokio::test]
            async fn test_scan_empty_store() {
                let store = $factory;
                let entries = scan_all(&store, &KeyRange::all()).await;
                assert_count(&entries, 0);
            }

            #[tokio::test]
            async fn test_scan_whole_store() {
                let store = $factory;
                for key in ["B", "A", "INVOICE1"] {
                    store.put(key, key.as_bytes().to_vec()).await.unwrap();
                }
                let entries = scan_all(&store, &KeyRange::all()).await;
                assert_eq!(keys(&entries), vec!["A", "B", "INVOICE1"]);

                let entries = scan_all(&store, &KeySpace::new("").range()).await;
                assert_count(&entries, 3);

                let entries = scan_all(&store, &KeyRange::new("", "B")).await;
                assert_eq!(keys(&entries), vec!["A"]);
            }

            #[tokio::test]
            async fn test_scan_key_order() {
                let store = $factory;
                for key in ["INVOICE2", "INVOICE10", "INVOICE0", "INVOICE1"] {
                    store.put(key, invoice_bytes(key)).await.unwrap();
                }
                let entries = scan_all(&store, &KeySpace::new("INVOICE").range()).await;
                assert_eq!(
                    keys(&entries),
                    vec!["INVOICE0", "INVOICE1", "INVOICE10", "INVOICE2"]
                );
                for entry in &entries {
                    assert_eq!(entry.value, invoice_bytes(&entry.key));
                    assert_eq!(entry.version, 1);
                }
            }

            #[tokio::test]
            async fn test_scan_half_open() {
                let store = $factory;
                for key in ["A", "B", "C", "D"] {
                    store.put(key, key.as_bytes().to_vec()).await.unwrap();
                }
                let entries = scan_all(&store, &KeyRange::new("B", "D")).await;
                assert_eq!(keys(&entries), vec!["B", "C"]);
            }

            #[tokio::test]
            async fn test_scan_prefix_excludes_neighbours() {
                let store = $factory;
                for key in ["INVOICD9", "INVOICE", "INVOICE7", "INVOICF", "PAYMENT1"] {
                    store.put(key, key.as_bytes().to_vec()).await.unwrap();
                }
                let entries = scan_all(&store, &KeySpace::new("INVOICE").range()).await;
                assert_eq!(keys(&entries), vec!["INVOICE", "INVOICE7"]);
            }

            #[tokio::test]
            async fn test_scan_unbounded_end() {
                let store = $factory;
                for key in ["A", "B", "C"] {
                    store.put(key, key.as_bytes().to_vec()).await.unwrap();
                }
                let entries = scan_all(&store, &KeyRange::starting_at("B")).await;
                assert_eq!(keys(&entries), vec!["B", "C"]);
            }

            #[tokio::test]
            async fn test_scan_inverted_range() {
                let store = $factory;
                for key in ["A", "B", "C"] {
                    store.put(key, key.as_bytes().to_vec()).await.unwrap();
                }
                assert_count(&scan_all(&store, &KeyRange::new("C", "A")).await, 0);
                assert_count(&scan_all(&store, &KeyRange::new("B", "B")).await, 0);
            }

            #[tokio::test]
            async fn test_scan_oversized_bounds() {
                let store = $factory;
                for key in ["A", "B", "C"] {
                    store.put(key, key.as_bytes().to_vec()).await.unwrap();
                }
                let past_b = format!("B{}", "x".repeat(MAX_KEY_LEN));

                let entries = scan_all(&store, &KeyRange::starting_at(past_b.clone())).await;
                assert_eq!(keys(&entries), vec!["C"]);

                let entries = scan_all(&store, &KeyRange::new("A", past_b)).await;
                assert_eq!(keys(&entries), vec!["A", "B"]);
            }

            #[tokio::test]
            async fn test_scan_restartable() {
                let store = $factory;
                store.put("INVOICE1", b"one".to_vec()).await.unwrap();
                let range = KeySpace::new("INVOICE").range();

                let first = scan_all(&store, &range).await;
                let again = scan_all(&store, &range).await;
                assert_eq!(first, again);

                store.put("INVOICE2", b"two".to_vec()).await.unwrap();
                store.put("INVOICE1", b"uno".to_vec()).await.unwrap();
                let after = scan_all(&store, &range).await;
                assert_eq!(keys(&after), vec!["INVOICE1", "INVOICE2"]);
                assert_eq!(after[0].value, b"uno".to_vec());
                assert_eq!(after[0].version, 2);
            }
        }
    };
}
