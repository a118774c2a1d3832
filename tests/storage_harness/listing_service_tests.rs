//! Macro-generated test suite for `ListingService<Plot>` contract validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use estate::storage::InMemoryListingService;
//!
//! listing_service_tests!(InMemoryListingService::<Plot>::default());
//! ```
//!
//! # Generated Tests
//!
//! - `test_list_empty`: a fresh store lists nothing
//! - `test_insert_assigns_identity`: id and creation time come from the store
//! - `test_list_newest_first`: list order is creation time descending
//! - `test_delete_existing`: the row disappears
//! - `test_delete_nonexistent`: deleting an unknown id succeeds
//! - `test_insert_rejects_invalid_draft`: malformed drafts are a rejection
//! - `test_insert_publishes_change`: one event per successful insert
//! - `test_delete_publishes_change`: one event per successful delete
//! - `test_concurrent_inserts`: parallel inserts from spawned tasks

/// Generate a full `ListingService<Plot>` conformance test suite.
///
/// `$factory` is re-evaluated for each test. For the concurrent test the
/// returned service must also be `Clone + 'static`.
#[macro_export]
macro_rules! listing_service_tests {
    ($factory:expr) => {
        mod listing_service_contract_tests {
            use super::*;
            use estate::core::error::StoreError;
            use estate::core::events::ChangeAction;
            use estate::core::listing::{Collection, ListingId, Plot, PlotType};
            use estate::core::service::ListingService;

            #[tokio::test]
            async fn test_list_empty() {
                let service = $factory;
                let rows: Vec<Plot> = service.list().await.unwrap();
                assert!(rows.is_empty());
            }

            #[tokio::test]
            async fn test_insert_assigns_identity() {
                let service = $factory;
                let draft = plot_draft(
                    "Commercial Plot Near Highway",
                    285_000.0,
                    "Highway Junction, Block A",
                    5000.0,
                    PlotType::Commercial,
                );

                let created = service.insert(draft.clone()).await.unwrap();
                assert!(!created.id.as_str().is_empty());
                assert_eq!(created.title, draft.title);
                assert_eq!(created.plot_type, PlotType::Commercial);
                assert!((created.price - 285_000.0).abs() < f64::EPSILON);
                assert!(created.created_at <= chrono::Utc::now());
            }

            #[tokio::test]
            async fn test_list_newest_first() {
                let service = $factory;
                for title in ["first", "second", "third"] {
                    service.insert(simple_plot(title)).await.unwrap();
                }

                let titles: Vec<String> = service
                    .list()
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|p| p.title)
                    .collect();
                assert_eq!(titles, vec!["third", "second", "first"]);
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let service = $factory;
                let keep = service.insert(simple_plot("keep")).await.unwrap();
                let gone = service.insert(simple_plot("gone")).await.unwrap();

                service.delete(&gone.id).await.unwrap();

                let rows = service.list().await.unwrap();
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].id, keep.id);
            }

            #[tokio::test]
            async fn test_delete_nonexistent() {
                let service = $factory;
                service.insert(simple_plot("keep")).await.unwrap();

                service.delete(&ListingId::new("does-not-exist")).await.unwrap();
                assert_eq!(service.list().await.unwrap().len(), 1);
            }

            #[tokio::test]
            async fn test_insert_rejects_invalid_draft() {
                let service = $factory;
                let mut draft = simple_plot("");
                draft.size = 0.0;

                let err = service.insert(draft).await.unwrap_err();
                assert!(matches!(err, StoreError::Rejected(_)));
                assert!(service.list().await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_insert_publishes_change() {
                let service = $factory;
                let mut feed = service.subscribe();

                let created = service.insert(simple_plot("announced")).await.unwrap();

                let envelope = feed.recv().await.unwrap();
                assert_eq!(envelope.event.collection, Collection::Plots);
                assert_eq!(envelope.event.action, ChangeAction::Inserted);
                assert_eq!(envelope.event.listing_id, Some(created.id));
            }

            #[tokio::test]
            async fn test_delete_publishes_change() {
                let service = $factory;
                let created = service.insert(simple_plot("short-lived")).await.unwrap();
                let mut feed = service.subscribe();

                service.delete(&created.id).await.unwrap();

                let envelope = feed.recv().await.unwrap();
                assert_eq!(envelope.event.action, ChangeAction::Deleted);
                assert_eq!(envelope.event.listing_id, Some(created.id));
            }

            #[tokio::test]
            async fn test_concurrent_inserts() {
                let service = $factory;
                let mut handles = Vec::new();
                for i in 0..10 {
                    let service = service.clone();
                    handles.push(tokio::spawn(async move {
                        service.insert(simple_plot(&format!("plot {}", i))).await
                    }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }

                let rows = service.list().await.unwrap();
                assert_eq!(rows.len(), 10);
                let mut ids: Vec<_> = rows.iter().map(|p| p.id.clone()).collect();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), 10);
            }
        }
    };
}
