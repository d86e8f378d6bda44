//! End-to-end replay scenarios: stream in, timeline out.

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use nameline_core::delta::{DeltaComputer, NoopResolver, StaticResolver};
use nameline_core::event::{
    EventPayload, PriceSource, PurchaseData, RawEvent, SetRecordData, UndernameLimitData,
};
use nameline_core::session::{
    EventStream, EventSupplier, HistorySession, LoadStatus, StreamError, replay,
};
use nameline_core::{APEX_LABEL, Category};

fn event(tx_id: &str, ts: i64, payload: EventPayload) -> RawEvent {
    RawEvent {
        tx_id: tx_id.to_string(),
        ts,
        initiator: "0xabc".to_string(),
        payload,
    }
}

fn purchase(tx_id: &str, ts: i64, buyer: &str, price: u64) -> RawEvent {
    event(
        tx_id,
        ts,
        EventPayload::Purchase(PurchaseData {
            buyer: buyer.to_string(),
            price: PriceSource::Inline(price),
            start_ts: ts,
            expiry_ts: Some(ts + 31_536_000),
            undername_limit: Some(10),
        }),
    )
}

fn set_record(tx_id: &str, ts: i64, label: &str, content_id: &str) -> RawEvent {
    event(
        tx_id,
        ts,
        EventPayload::SetRecord(SetRecordData {
            label: label.to_string(),
            content_id: content_id.to_string(),
            ttl_secs: 900,
        }),
    )
}

fn finite(events: Vec<RawEvent>) -> EventStream {
    Box::pin(stream::iter(events.into_iter().map(Ok)))
}

#[tokio::test]
async fn purchase_limit_record_scenario() {
    let events = vec![
        purchase("tx-1", 1_000, "0xbuyer", 5_000),
        event(
            "tx-2",
            2_000,
            EventPayload::IncreaseUndernameLimit(UndernameLimitData {
                limit: 25,
                label: Some("shop".to_string()),
            }),
        ),
        set_record("tx-3", 3_000, "shop", "tx-content-shop"),
    ];
    let computer = DeltaComputer::new(NoopResolver);
    let (timeline, err) = replay(finite(events), &computer).await;
    assert!(err.is_none());
    assert_eq!(timeline.len(), 3);

    // After the purchase: owner, price, lease.
    let first = &timeline.snapshots()[0];
    assert_eq!(first.owner.as_deref(), Some("0xbuyer"));
    assert_eq!(first.purchase_price, Some(5_000));
    assert_eq!(first.undername_limit, Some(10));
    assert!(first.undernames.is_empty());

    // After the limit bump: the label is registered before any record
    // points at it, alongside the raised allowance.
    let second = &timeline.snapshots()[1];
    assert_eq!(second.undername_limit, Some(25));
    assert_eq!(second.undernames, vec!["shop"]);
    assert!(second.content_hashes.is_empty());
    assert_eq!(second.owner.as_deref(), Some("0xbuyer"));

    // After the record: the undername gains its content hash.
    let third = &timeline.snapshots()[2];
    assert_eq!(third.undernames, vec!["shop"]);
    assert_eq!(
        third.content_hashes.get("shop").map(String::as_str),
        Some("tx-content-shop")
    );
    assert_eq!(third.sub_domain.as_deref(), Some("shop"));
    assert_eq!(third.ttl_secs, Some(900));
}

#[tokio::test]
async fn apex_record_targets_the_root() {
    let events = vec![set_record("tx-1", 1_000, APEX_LABEL, "tx-root")];
    let computer = DeltaComputer::new(NoopResolver);
    let (timeline, _) = replay(finite(events), &computer).await;
    let snap = timeline.latest().unwrap();
    assert_eq!(snap.target_id.as_deref(), Some("tx-root"));
    assert!(snap.undernames.is_empty());
    assert_eq!(
        snap.content_hashes.get(APEX_LABEL).map(String::as_str),
        Some("tx-root")
    );
}

#[tokio::test]
async fn price_quote_resolves_through_lookup() {
    let resolver = StaticResolver {
        prices: [("quote-77".to_string(), 9_900)].into_iter().collect(),
        ..StaticResolver::default()
    };
    let events = vec![event(
        "tx-1",
        1_000,
        EventPayload::Purchase(PurchaseData {
            buyer: "0xbuyer".to_string(),
            price: PriceSource::Quote {
                quote: "quote-77".to_string(),
            },
            start_ts: 1_000,
            expiry_ts: None,
            undername_limit: None,
        }),
    )];
    let (timeline, _) = replay(finite(events), &DeltaComputer::new(resolver)).await;
    assert_eq!(timeline.latest().unwrap().purchase_price, Some(9_900));
}

#[tokio::test]
async fn presentation_dedups_and_sorts_without_refolding() {
    // Arrival order: tx-2 first, then tx-1, then tx-2 duplicated.
    let events = vec![
        purchase("tx-2", 2_000, "0xlate", 1),
        purchase("tx-1", 1_000, "0xearly", 1),
        purchase("tx-2", 2_000, "0xlate", 1),
    ];
    let (timeline, _) = replay(finite(events), &DeltaComputer::new(NoopResolver)).await;

    // Fold consumed all three arrivals, duplicate included.
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.latest().unwrap().owner.as_deref(), Some("0xlate"));

    // Presentation shows two, chronologically.
    let presented = timeline.presented();
    assert_eq!(presented.len(), 2);
    assert_eq!(presented[0].0.tx_id, "tx-1");
    assert_eq!(presented[1].0.tx_id, "tx-2");
    assert_eq!(presented[0].0.category, Category::Ownership);
}

#[tokio::test]
async fn failure_after_two_of_five_keeps_two() {
    struct PartialSupplier;

    #[async_trait::async_trait]
    impl EventSupplier for PartialSupplier {
        async fn subscribe(&self, _name: &str) -> Result<EventStream, StreamError> {
            let items: Vec<Result<RawEvent, StreamError>> = vec![
                Ok(purchase("tx-1", 1_000, "0xa", 1)),
                Ok(purchase("tx-2", 2_000, "0xb", 1)),
                Err(StreamError::Interrupted("gateway reset".to_string())),
                Ok(purchase("tx-3", 3_000, "0xc", 1)),
                Ok(purchase("tx-4", 4_000, "0xd", 1)),
            ];
            Ok(Box::pin(stream::iter(items)))
        }
    }

    let session = HistorySession::start(
        Arc::new(PartialSupplier),
        DeltaComputer::new(NoopResolver),
        "example",
    );
    while !session.is_finished() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let state = session.state();
    assert_eq!(state.timeline.len(), 2);
    assert_eq!(
        state.timeline.latest().and_then(|s| s.owner.as_deref()),
        Some("0xb")
    );
    assert!(matches!(state.status, LoadStatus::Failed(_)));
}

#[tokio::test]
async fn session_grows_while_loading() {
    struct SlowSupplier;

    #[async_trait::async_trait]
    impl EventSupplier for SlowSupplier {
        async fn subscribe(&self, _name: &str) -> Result<EventStream, StreamError> {
            let events = vec![
                purchase("tx-1", 1_000, "0xa", 1),
                purchase("tx-2", 2_000, "0xb", 1),
            ];
            Ok(Box::pin(stream::unfold(
                events.into_iter(),
                |mut iter| async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    iter.next().map(|e| (Ok(e), iter))
                },
            )))
        }
    }

    let session = HistorySession::start(
        Arc::new(SlowSupplier),
        DeltaComputer::new(NoopResolver),
        "example",
    );

    // Observable mid-load: length only ever grows.
    let mut last = 0;
    while !session.is_finished() {
        let len = session.state().timeline.len();
        assert!(len >= last);
        last = len;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let state = session.state();
    assert_eq!(state.status, LoadStatus::Complete);
    assert_eq!(state.timeline.len(), 2);
}
