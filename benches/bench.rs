// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::num::NonZeroUsize;

use chrono::NaiveTime;
use criterion::*;
use ndarray::prelude::*;

use rfi_monitor::{aggregate_max, summarise, AggregationFactors, DayMatrix};

/// A day of one sweep per minute over 4096 frequencies, with a little
/// structure so the statistics aren't trivial.
fn day_matrix() -> DayMatrix {
    let num_freqs = 4096;
    let num_times = 1440;
    let freqs = (0..num_freqs).map(|i| 0.05 + i as f64 * 1e-4).collect();
    let times = (0..num_times)
        .map(|i| NaiveTime::from_hms_opt(i / 60, i % 60, 0).unwrap())
        .collect();
    let data = Array2::from_shape_fn((num_freqs, num_times as usize), |(i, j)| {
        -90.0 + ((i * 7 + j * 13) % 31) as f64 * 0.5
    });
    DayMatrix::new(freqs, times, data).unwrap()
}

fn aggregation(c: &mut Criterion) {
    let matrix = day_matrix();
    let factors = AggregationFactors::default();
    c.bench_function("aggregate_max 4096x1440", |b| {
        b.iter(|| aggregate_max(black_box(&matrix), factors))
    });
}

fn summaries(c: &mut Criterion) {
    let matrix = day_matrix();
    let mut group = c.benchmark_group("summarise 4096x1440");
    for chunk_size in [100, 1000] {
        let chunk_size = NonZeroUsize::new(chunk_size).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| b.iter(|| summarise(black_box(&matrix), chunk_size)),
        );
    }
    group.finish();
}

criterion_group!(benches, aggregation, summaries);
criterion_main!(benches);
