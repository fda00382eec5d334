// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for reconciliation.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Handler accumulate on a single group
//! - Reconciliation throughput by history size
//! - Parallel recording across instruments

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use payment_ledger_rs::{
    EventId, EventKind, InstrumentId, Ledger, Money, PaymentEvent, PaymentGroupState,
    PaymentHistory, PaymentStatus, handler,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn make_event(
    instrument: u16,
    id: u32,
    parent: Option<u32>,
    kind: EventKind,
    amount: i64,
) -> PaymentEvent {
    PaymentEvent {
        id: EventId(id),
        parent: parent.map(EventId),
        instrument: InstrumentId(instrument),
        kind,
        status: PaymentStatus::Approved,
        amount: Money::new(Decimal::new(amount, 4), "CAD".parse().unwrap()),
        date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(id.into()),
    }
}

/// `groups` reservations, each charged and credited twice.
fn make_history(instrument: u16, first_id: u32, groups: u32) -> Vec<PaymentEvent> {
    let mut events = Vec::with_capacity(groups as usize * 4);
    for group in 0..groups {
        let reserve = first_id + group * 4;
        events.push(make_event(instrument, reserve, None, EventKind::Reserve, 1_000_000));
        events.push(make_event(instrument, reserve + 1, Some(reserve), EventKind::Charge, 800_000));
        events.push(make_event(instrument, reserve + 2, Some(reserve + 1), EventKind::Credit, 100_000));
        events.push(make_event(instrument, reserve + 3, Some(reserve + 1), EventKind::Credit, 50_000));
    }
    events
}

// =============================================================================
// Handler Benchmarks
// =============================================================================

fn bench_group_lifecycle(c: &mut Criterion) {
    let events: Vec<Arc<PaymentEvent>> = [
        make_event(1, 1, None, EventKind::Reserve, 1_000_000),
        make_event(1, 2, Some(1), EventKind::ModifyReserve, 1_200_000),
        make_event(1, 3, Some(2), EventKind::Charge, 1_200_000),
        make_event(1, 4, Some(3), EventKind::Credit, 200_000),
        make_event(1, 5, Some(4), EventKind::ReverseCharge, 1_200_000),
    ]
    .into_iter()
    .map(Arc::new)
    .collect();

    c.bench_function("group_lifecycle", |b| {
        b.iter(|| {
            let mut state = PaymentGroupState::new();
            for event in &events {
                handler::accumulate(&mut state, black_box(event)).unwrap();
            }
            black_box(&state);
        })
    });
}

// =============================================================================
// Reconciliation Benchmarks
// =============================================================================

fn bench_reconcile_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_throughput");
    let history = PaymentHistory::new();

    for groups in [10u32, 100, 1_000].iter() {
        let events: Vec<Arc<PaymentEvent>> =
            make_history(1, 1, *groups).into_iter().map(Arc::new).collect();
        let currency = events[0].amount.currency();

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(groups), &events, |b, events| {
            b.iter(|| {
                let totals = history.reconcile(currency, black_box(events)).unwrap();
                black_box(totals);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Ledger Benchmarks
// =============================================================================

fn bench_parallel_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_recording");

    for instruments in [1u16, 16, 64].iter() {
        group.throughput(Throughput::Elements(u64::from(*instruments) * 400));
        group.bench_with_input(
            BenchmarkId::from_parameter(instruments),
            instruments,
            |b, &instruments| {
                b.iter(|| {
                    let ledger = Ledger::new();
                    (0..instruments).into_par_iter().for_each(|instrument| {
                        let first_id = u32::from(instrument) * 400 + 1;
                        for event in make_history(instrument, first_id, 100) {
                            ledger.record(event).unwrap();
                        }
                    });
                    black_box(&ledger);
                })
            },
        );
    }
    group.finish();
}

fn bench_summaries(c: &mut Criterion) {
    let ledger = Ledger::new();
    for instrument in 0..64u16 {
        for event in make_history(instrument, u32::from(instrument) * 400 + 1, 100) {
            ledger.record(event).unwrap();
        }
    }

    c.bench_function("summaries_64_instruments", |b| {
        b.iter(|| {
            let summaries: Vec<_> = ledger
                .instruments()
                .into_par_iter()
                .filter_map(|id| ledger.summary(id))
                .collect();
            black_box(summaries);
        })
    });
}

criterion_group!(
    benches,
    bench_group_lifecycle,
    bench_reconcile_throughput,
    bench_parallel_recording,
    bench_summaries,
);

criterion_main!(benches);
