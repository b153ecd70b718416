//! Benchmarks for the wire codec hot paths
//!
//! The receive loop decodes every inbound datagram on arrival, so decode
//! throughput bounds the sustainable telemetry rate. Encode paths run at
//! operator cadence and matter less, but are kept here to catch
//! regressions.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use shorelink::{
    ContactBatch, PlatformStatus, RouteCommand, SpeedHeadingCommand, SurfaceContact, TargetClass,
    UnitCode, UnitHeader, VesselTable, Waypoint,
    protocol::{DATA_SOURCE_VESSEL, SECONDARY_CONTACTS, SECONDARY_MOTION, UNIT_TYPE_TELEMETRY},
};

fn vessel_header(secondary: u16) -> UnitHeader {
    UnitHeader {
        seq: 1,
        unit_type: UNIT_TYPE_TELEMETRY,
        length: 0,
        timestamp: 432_000_000,
        sender: UnitCode(0x5001),
        secondary,
        receiver: UnitCode::SHORE_STATION,
        data_source: DATA_SOURCE_VESSEL,
        param: 0,
    }
}

fn status_packet() -> [u8; PlatformStatus::LEN] {
    PlatformStatus {
        header: vessel_header(SECONDARY_MOTION),
        longitude_deg: 122.32,
        latitude_deg: 29.97,
        altitude_m: 0,
        speed_knots: 12.5,
        heading_deg: 45.0,
        course_deg: 47.5,
        course_rate: -2,
        operating_mode: 1,
        simulated: false,
        gimbal_deg: 10.0,
        ammunition: 4,
        energy_pct: 80,
        body_angle_deg: 1.0,
        reserved: 0,
    }
    .encode()
}

fn contact_packet(targets: usize) -> Vec<u8> {
    let contact = SurfaceContact {
        target_id: 7,
        longitude_deg: 122.4,
        latitude_deg: 30.0,
        bearing_deg: 123.0,
        range_m: 1852,
        speed_knots: 18.5,
        heading_deg: 200.0,
        class: TargetClass::Ship,
        features: 0xA5,
    };
    ContactBatch { header: vessel_header(SECONDARY_CONTACTS), contacts: vec![contact; targets] }
        .encode()
        .expect("batch encode")
}

fn bench_decode_status(c: &mut Criterion) {
    let packet = status_packet();

    let mut group = c.benchmark_group("decode_status");
    group.throughput(Throughput::Bytes(packet.len() as u64));
    group.bench_function("fixed_44_bytes", |b| {
        b.iter(|| PlatformStatus::decode(black_box(&packet)).expect("decode"))
    });
    group.finish();
}

fn bench_decode_contacts(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_contacts");
    for targets in [0usize, 8, 64, 255] {
        let packet = contact_packet(targets);
        group.throughput(Throughput::Bytes(packet.len() as u64));
        group.bench_function(format!("{targets}_targets"), |b| {
            b.iter(|| ContactBatch::decode(black_box(&packet)).expect("decode"))
        });
    }
    group.finish();
}

fn bench_encode_commands(c: &mut Criterion) {
    let table = VesselTable::default();
    let speed = SpeedHeadingCommand { vessel: 3, speed_knots: 10.5, heading_deg: 45.0 };
    let route = RouteCommand {
        vessel: 3,
        waypoints: vec![
            Waypoint { longitude_deg: 122.0, latitude_deg: 30.0, speed_knots: 12.0 };
            16
        ],
    };

    c.bench_function("encode_speed_heading", |b| {
        b.iter(|| speed.encode(black_box(5), black_box(&table), black_box(123_456)))
    });
    c.bench_function("encode_route_16_waypoints", |b| {
        b.iter(|| route.encode(black_box(5), black_box(&table), black_box(123_456)).expect("encode"))
    });
}

criterion_group!(benches, bench_decode_status, bench_decode_contacts, bench_encode_commands);
criterion_main!(benches);
