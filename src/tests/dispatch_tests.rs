use crate::db::connection::Database;
use crate::db::ListingStore;
use crate::domain::{Listing, StoredListing};
use crate::errors::{AppError, EnrichmentError, Result};
use crate::geos::MapFraming;
use crate::notifier::{DeliveryOutcome, Dispatcher};
use crate::tests::utils::{
    init_test_db, listing, FakeChat, FakeGeocoder, FakeRenderer, Sent, WESTERKERK,
};
use std::collections::HashSet;

fn store_with(n: usize) -> Database {
    let mut db = init_test_db();
    let batch: Vec<Listing> = (1..=n).map(listing).collect();
    db.append_new(&batch).unwrap();
    db
}

fn pending_ids(db: &mut Database) -> Vec<String> {
    db.pending().unwrap().into_iter().map(|p| p.listing.id).collect()
}

#[test]
fn announces_with_map_and_marks_sent() {
    let mut db = store_with(1);
    let (geo, maps, chat) = (FakeGeocoder::default(), FakeRenderer::default(), FakeChat::default());
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert_eq!(report.with_map(), 1);
    assert_eq!(chat.photos(), 1);
    assert_eq!(chat.texts(), 0);
    assert!(pending_ids(&mut db).is_empty());

    let rendered = maps.rendered.borrow();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].marker, WESTERKERK);
    assert_eq!(rendered[0].center, MapFraming::default().center);
    assert!(rendered[0].zoom <= 11.5);

    let sent = chat.sent.borrow();
    match &sent[0] {
        Sent::Photo(caption) => assert!(caption.contains("Prinsengracht 1")),
        other => panic!("expected a photo, got {other:?}"),
    }
}

#[test]
fn batch_is_capped_oldest_first() {
    let mut db = store_with(7);
    let (geo, maps, chat) = (FakeGeocoder::default(), FakeRenderer::default(), FakeChat::default());
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert_eq!(report.selected, 5);
    assert_eq!(report.deferred, 2);
    let processed: Vec<String> = report.outcomes.iter().map(|(id, _)| id.clone()).collect();
    let expected: Vec<String> = (1..=5).map(|n| listing(n).id).collect();
    assert_eq!(processed, expected);

    assert_eq!(pending_ids(&mut db), vec![listing(6).id, listing(7).id]);
    assert_eq!(chat.sent.borrow().len(), 5);
}

#[test]
fn geocode_miss_sends_plain_text_once() {
    let mut db = store_with(1);
    let geo = FakeGeocoder {
        miss: true,
        ..Default::default()
    };
    let (maps, chat) = (FakeRenderer::default(), FakeChat::default());
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert_eq!(chat.texts(), 1);
    assert_eq!(chat.photos(), 0);
    assert_eq!(chat.attempts.get(), 1, "no photo call may be attempted");
    assert!(maps.rendered.borrow().is_empty());
    assert!(matches!(
        report.outcomes[0].1,
        DeliveryOutcome::TextOnly(EnrichmentError::NoCoordinates)
    ));
    assert!(pending_ids(&mut db).is_empty());
}

#[test]
fn geocoder_outage_falls_back_to_text() {
    let mut db = store_with(2);
    let geo = FakeGeocoder {
        fail: true,
        ..Default::default()
    };
    let (maps, chat) = (FakeRenderer::default(), FakeChat::default());
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert_eq!(report.text_only(), 2);
    assert!(matches!(
        report.outcomes[0].1,
        DeliveryOutcome::TextOnly(EnrichmentError::Geocode(_))
    ));
    assert_eq!(geo.calls.get(), 2);
    assert!(pending_ids(&mut db).is_empty());
}

#[test]
fn render_failure_falls_back_to_text() {
    let mut db = store_with(1);
    let geo = FakeGeocoder::default();
    let maps = FakeRenderer {
        fail: true,
        ..Default::default()
    };
    let chat = FakeChat::default();
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert!(matches!(
        report.outcomes[0].1,
        DeliveryOutcome::TextOnly(EnrichmentError::Render(_))
    ));
    assert_eq!(chat.photos(), 0);
    assert_eq!(chat.texts(), 1);
}

#[test]
fn photo_rejection_falls_back_to_text() {
    let mut db = store_with(1);
    let (geo, maps) = (FakeGeocoder::default(), FakeRenderer::default());
    let chat = FakeChat {
        photos_fail: true,
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert!(matches!(
        report.outcomes[0].1,
        DeliveryOutcome::TextOnly(EnrichmentError::Photo(_))
    ));
    assert_eq!(chat.attempts.get(), 2);
    assert_eq!(chat.texts(), 1);
    assert!(pending_ids(&mut db).is_empty());
}

#[test]
fn undeliverable_listing_stays_pending_while_others_go_out() {
    let mut db = store_with(3);
    let (geo, maps) = (FakeGeocoder::default(), FakeRenderer::default());
    let chat = FakeChat {
        reject_containing: Some(listing(2).id),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert_eq!(report.with_map(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.outcomes[1].1, DeliveryOutcome::Failed(_)));
    assert_eq!(pending_ids(&mut db), vec![listing(2).id]);

    // Next run retries it.
    let chat = FakeChat::default();
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());
    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();
    assert_eq!(report.selected, 1);
    assert!(pending_ids(&mut db).is_empty());
}

#[test]
fn empty_outbox_makes_no_calls() {
    let mut db = init_test_db();
    let (geo, maps, chat) = (FakeGeocoder::default(), FakeRenderer::default(), FakeChat::default());
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let report = dispatcher.dispatch_pending(&mut db, 5).unwrap();

    assert_eq!(report.selected, 0);
    assert_eq!(report.deferred, 0);
    assert_eq!(geo.calls.get(), 0);
    assert_eq!(chat.attempts.get(), 0);
    assert!(maps.rendered.borrow().is_empty());
}

/// Wraps a real store and notes how many messages had gone out whenever a
/// listing is marked sent.
struct RecordingStore<'a> {
    inner: Database,
    chat: &'a FakeChat,
    marks: Vec<(String, usize)>,
    fail_marking: HashSet<String>,
}

impl ListingStore for RecordingStore<'_> {
    fn load_known_ids(&mut self) -> Result<HashSet<String>> {
        self.inner.load_known_ids()
    }

    fn append_new(&mut self, listings: &[Listing]) -> Result<usize> {
        self.inner.append_new(listings)
    }

    fn pending(&mut self) -> Result<Vec<StoredListing>> {
        self.inner.pending()
    }

    fn mark_sent(&mut self, id: &str) -> Result<()> {
        if self.fail_marking.contains(id) {
            return Err(AppError::config("disk I/O error"));
        }
        let delivered = self.chat.sent.borrow().len();
        self.marks.push((id.to_string(), delivered));
        self.inner.mark_sent(id)
    }
}

#[test]
fn each_listing_is_committed_right_after_its_own_send() {
    let (geo, maps, chat) = (FakeGeocoder::default(), FakeRenderer::default(), FakeChat::default());
    let mut store = RecordingStore {
        inner: store_with(3),
        chat: &chat,
        marks: Vec::new(),
        fail_marking: HashSet::new(),
    };
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    dispatcher.dispatch_pending(&mut store, 5).unwrap();

    assert_eq!(
        store.marks,
        vec![(listing(1).id, 1), (listing(2).id, 2), (listing(3).id, 3)]
    );
}

#[test]
fn store_failure_aborts_and_leaves_listing_pending() {
    let (geo, maps, chat) = (FakeGeocoder::default(), FakeRenderer::default(), FakeChat::default());
    let mut store = RecordingStore {
        inner: store_with(3),
        chat: &chat,
        marks: Vec::new(),
        fail_marking: [listing(2).id].into_iter().collect(),
    };
    let dispatcher = Dispatcher::new(&geo, &maps, &chat, MapFraming::default());

    let result = dispatcher.dispatch_pending(&mut store, 5);
    assert!(result.is_err());

    // Listing 2 went out but was not recorded; listing 3 was never reached.
    assert_eq!(chat.sent.borrow().len(), 2);
    assert_eq!(
        pending_ids(&mut store.inner),
        vec![listing(2).id, listing(3).id]
    );
}
