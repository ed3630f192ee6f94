//! End-to-end scheduling scenarios against `InMemoryStore`.
//!
//! Each test builds a store, loads a `Scheduler` over March-April 2024 and
//! feeds it the same event stream a browser grid would send.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use campgrid::config::{ResizeCommit, SchedulerConfig};
use campgrid::dates;
use campgrid::engine::{Scheduler, SchedulingError, ValidationError};
use campgrid::model::*;
use campgrid::notify::OutcomeHub;
use campgrid::store::{BookingStore, InMemoryStore, Seed};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn site(id: SiteId) -> Site {
    Site {
        id,
        name: format!("Site {id}"),
        kind: Some(SiteKind::Rv),
        price_per_night: Some(6_000),
    }
}

fn booking(id: BookingId, site_id: SiteId, start: &str, end: &str) -> Booking {
    Booking {
        id,
        site_id,
        customer_id: None,
        start_date: d(start),
        end_date: d(end),
        created_at: Utc::now(),
        check_in_status: CheckInStatus::Pending,
        check_in_date: None,
        check_out_date: None,
        amount: None,
    }
}

fn reservation(id: ReservationId, site_id: SiteId, start: &str, end: &str) -> Reservation {
    Reservation {
        id,
        site_id,
        customer_id: None,
        start_date: d(start),
        end_date: d(end),
        created_at: Utc::now(),
        status: ReservationStatus::Pending,
        amount_owed: 12_000,
        amount_paid: 0,
    }
}

async fn start(seed: Seed, resize_commit: ResizeCommit) -> (Arc<InMemoryStore>, Scheduler) {
    let store = Arc::new(InMemoryStore::from_seed(seed));
    let config = SchedulerConfig {
        resize_commit,
        ..SchedulerConfig::default()
    };
    let mut scheduler = Scheduler::new(store.clone(), Arc::new(OutcomeHub::new()), &config);
    scheduler
        .load(StayRange::new(d("2024-03-01"), d("2024-05-01")))
        .await
        .unwrap();
    (store, scheduler)
}

/// Site 5 holds booking 1 [03-01, 03-03). Reservation 4 (two nights) sits
/// on site 6.
fn site_five() -> Seed {
    Seed {
        sites: vec![site(2), site(5), site(6)],
        bookings: vec![booking(1, 5, "2024-03-01", "2024-03-03")],
        reservations: vec![reservation(4, 6, "2024-03-20", "2024-03-22")],
        ..Seed::default()
    }
}

fn rejection(outcome: Option<Outcome>) -> String {
    match outcome {
        Some(Outcome::MutationRejected { reason }) => reason,
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn conflicting_move_is_rejected() {
    let (store, mut s) = start(site_five(), ResizeCommit::OnRelease).await;
    s.handle(UiEvent::DragStart {
        key: IntervalKey::reservation(4),
    })
    .await;
    let out = s
        .handle(UiEvent::Drop {
            date: d("2024-03-02"),
            site_id: 5,
        })
        .await;
    assert_eq!(rejection(out), "Cannot move: This time slot is already booked");

    let unchanged = store.reservation(4).unwrap();
    assert_eq!(
        (unchanged.site_id, unchanged.start_date, unchanged.end_date),
        (6, d("2024-03-20"), d("2024-03-22"))
    );
}

#[tokio::test]
async fn adjacent_move_is_accepted() {
    let (store, mut s) = start(site_five(), ResizeCommit::OnRelease).await;
    s.handle(UiEvent::DragStart {
        key: IntervalKey::reservation(4),
    })
    .await;
    let out = s
        .handle(UiEvent::Drop {
            date: d("2024-03-03"),
            site_id: 5,
        })
        .await;
    match out {
        Some(Outcome::MutationCommitted { interval }) => {
            assert_eq!(interval.key(), IntervalKey::reservation(4));
            assert_eq!(interval.site_id(), 5);
            assert_eq!((interval.start_date(), interval.end_date()), (d("2024-03-03"), d("2024-03-05")));
        }
        other => panic!("expected commit, got {other:?}"),
    }
    let moved = store.reservation(4).unwrap();
    assert_eq!((moved.site_id, moved.start_date), (5, d("2024-03-03")));
}

#[tokio::test]
async fn create_drag_emits_request() {
    let (_, mut s) = start(site_five(), ResizeCommit::OnRelease).await;
    s.handle(UiEvent::PointerDown {
        date: d("2024-04-10"),
        site_id: 2,
        client_x: 1_000.0,
        primary: true,
    })
    .await;
    s.handle(UiEvent::PointerMove {
        date: d("2024-04-12"),
        site_id: 2,
        primary_held: true,
        client_x: 1_250.0,
    })
    .await;
    let out = s.handle(UiEvent::PointerUp).await;
    assert_eq!(
        out,
        Some(Outcome::NewReservationRequested {
            request: NewReservationRequest {
                site_id: 2,
                start_date: d("2024-04-10"),
                end_date: d("2024-04-13"),
            },
        })
    );
}

#[tokio::test]
async fn checked_out_booking_is_locked() {
    let mut seed = site_five();
    seed.bookings[0].check_in_status = CheckInStatus::CheckedOut;
    let (store, mut s) = start(seed, ResizeCommit::OnRelease).await;
    let before = store.booking(1).unwrap();

    let out = s.handle(UiEvent::CheckInRequest { booking_id: 1 }).await;
    assert_eq!(rejection(out), "Cannot check in a checked-out booking");

    let out = s
        .handle(UiEvent::DragStart {
            key: IntervalKey::booking(1),
        })
        .await;
    assert_eq!(rejection(out), "Cannot modify a checked out booking");

    let out = s
        .handle(UiEvent::ResizeHandleDown {
            key: IntervalKey::booking(1),
            edge: ResizeEdge::End,
            client_x: 0.0,
        })
        .await;
    assert_eq!(rejection(out), "Cannot modify a checked out booking");

    assert_eq!(store.booking(1).unwrap(), before);
}

#[tokio::test]
async fn moves_preserve_duration() {
    let (store, mut s) = start(site_five(), ResizeCommit::OnRelease).await;
    let mut target = d("2024-04-01");
    for _ in 0..6 {
        s.handle(UiEvent::DragStart {
            key: IntervalKey::reservation(4),
        })
        .await;
        s.handle(UiEvent::Drop {
            date: target,
            site_id: 6,
        })
        .await;
        let r = store.reservation(4).unwrap();
        assert_eq!(r.start_date, target);
        assert_eq!(dates::days_between(r.start_date, r.end_date), 2);
        target = dates::add_days(target, 3);
    }
}

#[tokio::test]
async fn resize_ticks_never_invert() {
    for commit in [ResizeCommit::OnRelease, ResizeCommit::PerTick] {
        let (store, mut s) = start(site_five(), commit).await;
        for edge in [ResizeEdge::Start, ResizeEdge::End] {
            s.handle(UiEvent::ResizeHandleDown {
                key: IntervalKey::reservation(4),
                edge,
                client_x: 0.0,
            })
            .await;
            for x in [-700.0, -130.0, 0.0, 130.0, 250.0, 610.0, 2_000.0, -2_000.0] {
                s.handle(UiEvent::PointerMove {
                    date: d("2024-03-21"),
                    site_id: 6,
                    primary_held: true,
                    client_x: x,
                })
                .await;
                if let Some((_, preview)) = s.resize_preview() {
                    assert!(preview.start < preview.end);
                }
                let stored = store.reservation(4).unwrap();
                assert!(stored.start_date < stored.end_date);
            }
            s.handle(UiEvent::PointerUp).await;
            let stored = store.reservation(4).unwrap();
            assert!(stored.start_date < stored.end_date, "{commit:?} {edge:?}");
        }
    }
}

#[tokio::test]
async fn full_front_desk_day() {
    let (store, mut s) = start(site_five(), ResizeCommit::OnRelease).await;

    let (customer, created) = s
        .submit_reservation(
            NewCustomer {
                first_name: "Jo".into(),
                last_name: "March".into(),
                email: None,
                phone: Some("555-0100".into()),
            },
            2,
            d("2024-04-10"),
            d("2024-04-13"),
        )
        .await
        .unwrap();
    assert_eq!(created.amount_owed, 18_000);
    assert_eq!(store.customer(customer.id).unwrap().first_name, "Jo");

    let out = s
        .handle(UiEvent::MarkPaidRequest {
            reservation_id: created.id,
        })
        .await;
    assert!(matches!(out, Some(Outcome::StatusChanged { .. })));
    assert_eq!(store.reservation(created.id).unwrap().amount_paid, 18_000);

    // the new stay now blocks its site
    let err = s
        .submit_reservation(
            NewCustomer {
                first_name: "Amy".into(),
                last_name: "March".into(),
                email: None,
                phone: None,
            },
            2,
            d("2024-04-12"),
            d("2024-04-14"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Conflict { .. }));

    let free: Vec<SiteId> = s
        .available_sites(StayRange::new(d("2024-04-11"), d("2024-04-12")))
        .await
        .unwrap()
        .into_iter()
        .map(|site| site.id)
        .collect();
    assert_eq!(free, vec![5, 6]);

    s.handle(UiEvent::CheckInRequest { booking_id: 1 }).await;
    assert_eq!(s.current_campers().len(), 1);
    s.handle(UiEvent::CheckOutRequest { booking_id: 1 }).await;
    assert!(s.current_campers().is_empty());
    let b = store.booking(1).unwrap();
    assert!(b.check_in_date.is_some() && b.check_out_date.is_some());
}

#[tokio::test]
async fn unknown_site_is_a_validation_error() {
    let (_, s) = start(site_five(), ResizeCommit::OnRelease).await;
    let err = s
        .quote(99, &StayRange::new(d("2024-04-01"), d("2024-04-02")))
        .unwrap_err();
    assert_eq!(err, ValidationError::UnknownSite(99));
}

#[tokio::test]
async fn store_is_usable_as_trait_object() {
    let store: Arc<dyn BookingStore> = Arc::new(InMemoryStore::from_seed(site_five()));
    let sites = store.list_sites().await.unwrap();
    assert_eq!(sites.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 5, 6]);
}
