//! Criterion benchmarks for the layout hot paths.
//!
//! Placement and moves are driven by pointer events in an interactive host,
//! so they run once per drag step against a rack of up to 42 devices.
//!
//! Run with:
//! ```bash
//! cargo bench --package rack-core --bench layout_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rack_core::{
    intervals_overlap, Catalog, Category, ConnectionStore, HardwareModel, LayoutStore, PortRef,
    U_MAX,
};

// ── Layout fixture builders ───────────────────────────────────────────────────

fn one_unit_model() -> HardwareModel {
    HardwareModel::new("Bench 1U", 1, 24, "bg-slate-800", Category::Net)
}

/// Creates a layout holding `n` stacked 1U devices at units `1..=n`.
fn build_layout_with_n_devices(n: u32) -> LayoutStore {
    let model = one_unit_model();
    let mut layout = LayoutStore::new();
    for _ in 0..n {
        layout
            .place_device("BENCH_1U", &model)
            .expect("rack has room for the fixture");
    }
    layout
}

// ── Benchmarks: geometry ──────────────────────────────────────────────────────

fn bench_intervals_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("intervals_overlap");

    group.bench_function("disjoint", |b| {
        b.iter(|| intervals_overlap(black_box(1), black_box(2), black_box(3), black_box(2)))
    });
    group.bench_function("overlapping", |b| {
        b.iter(|| intervals_overlap(black_box(1), black_box(4), black_box(3), black_box(2)))
    });

    group.finish();
}

// ── Benchmarks: place_device ──────────────────────────────────────────────────

/// Worst case for the bottom-up scan: only the top unit is free.
fn bench_place_device_scaling(c: &mut Criterion) {
    let model = one_unit_model();
    let mut group = c.benchmark_group("place_device_scaling");

    for &count in &[0u32, 10, 20, U_MAX - 1] {
        let layout = build_layout_with_n_devices(count);
        group.bench_with_input(BenchmarkId::new("devices", count), &layout, |b, layout| {
            b.iter(|| {
                let mut layout = layout.clone();
                layout.place_device(black_box("BENCH_1U"), black_box(&model))
            })
        });
    }

    group.finish();
}

// ── Benchmarks: move_device ───────────────────────────────────────────────────

/// A drag step onto the free upper half of a half-full rack.
fn bench_move_device_into_free_space(c: &mut Criterion) {
    let mut layout = build_layout_with_n_devices(U_MAX / 2);
    let id = layout.list_devices()[0].id;
    let mut group = c.benchmark_group("move_device");

    let mut target = i64::from(U_MAX / 2 + 1);
    group.bench_function("free_target", |b| {
        b.iter(|| {
            target = if target == i64::from(U_MAX) {
                i64::from(U_MAX / 2 + 1)
            } else {
                target + 1
            };
            layout.move_device(black_box(id), black_box(target))
        })
    });

    group.finish();
}

/// A drag step onto an occupied slot in a full rack; always rejected.
fn bench_move_device_rejected(c: &mut Criterion) {
    let mut layout = build_layout_with_n_devices(U_MAX);
    let id = layout.list_devices()[0].id;
    let mut group = c.benchmark_group("move_device");

    group.bench_function("occupied_target", |b| {
        b.iter(|| layout.move_device(black_box(id), black_box(i64::from(U_MAX))))
    });

    group.finish();
}

// ── Benchmarks: connections ───────────────────────────────────────────────────

/// Cascading a device removal through a densely cabled rack.
fn bench_cascade_remove(c: &mut Criterion) {
    let catalog = Catalog::builtin();
    let panel_model = catalog.get("PATCH_PANEL").cloned().expect("built-in model");
    let switch_model = catalog.get("SWITCH_24").cloned().expect("built-in model");

    let mut layout = LayoutStore::new();
    let panel = layout.place_device("PATCH_PANEL", &panel_model).expect("room");
    let switch = layout.place_device("SWITCH_24", &switch_model).expect("room");
    let mut connections = ConnectionStore::new();
    for i in 1..=24 {
        connections.select_port(PortRef::new(panel.id, i));
        connections.select_port(PortRef::new(switch.id, i));
    }

    c.bench_function("cascade_remove_24_ports", |b| {
        b.iter(|| {
            let mut connections = connections.clone();
            for port in panel.port_refs() {
                black_box(connections.cascade_remove_port(port));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_intervals_overlap,
    bench_place_device_scaling,
    bench_move_device_into_free_space,
    bench_move_device_rejected,
    bench_cascade_remove,
);
criterion_main!(benches);
