//! Criterion benchmarks for the serial → text path.
//!
//! At 9600 baud a full 2047-byte read takes over two seconds to arrive, so
//! the conversion must be negligible next to the line rate.  These benches
//! keep an eye on that for ASCII, multi-byte and garbage input.
//!
//! Run with:
//! ```bash
//! cargo bench --package uart-bridge-core --bench text_bench
//! ```

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uart_bridge_core::mock::MockSerialPort;
use uart_bridge_core::{
    BridgePump, ClientSink, ConnectionId, ConnectionRegistry, NulPolicy, SendError, Utf8Assembler,
};

const READ_SIZE: usize = 2047;

/// Accepts and discards every frame.
struct DiscardSink;

impl ClientSink for DiscardSink {
    fn try_send_text(&self, _id: ConnectionId, text: String) -> Result<(), SendError> {
        black_box(text);
        Ok(())
    }
}

fn ascii_chunk() -> Vec<u8> {
    b"temp=21.5C hum=40% rssi=-71\n"
        .iter()
        .copied()
        .cycle()
        .take(READ_SIZE)
        .collect()
}

fn multibyte_chunk() -> Vec<u8> {
    "Grüße €𝄞 ".bytes().cycle().take(READ_SIZE).collect()
}

fn garbage_chunk() -> Vec<u8> {
    (0..READ_SIZE).map(|i| (i * 131 % 251) as u8 | 0x80).collect()
}

fn bench_assembler(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8_assembler_push");
    for (name, chunk) in [
        ("ascii", ascii_chunk()),
        ("multibyte", multibyte_chunk()),
        ("garbage", garbage_chunk()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &chunk, |b, chunk| {
            let mut assembler = Utf8Assembler::new();
            b.iter(|| {
                let text = assembler.push(black_box(chunk));
                assembler.flush();
                text
            })
        });
    }
    group.finish();
}

fn bench_nul_policy(c: &mut Criterion) {
    let chunk = ascii_chunk();
    c.bench_function("nul_policy_truncate_scan", |b| {
        b.iter(|| NulPolicy::Truncate.apply(black_box(&chunk)).len())
    });
}

fn bench_pump_step(c: &mut Criterion) {
    let chunk = ascii_chunk();
    let port = MockSerialPort::new();
    let registry = Arc::new(ConnectionRegistry::new());
    registry.set(ConnectionId(1));
    let mut pump = BridgePump::new(port.reader(), registry, DiscardSink)
        .with_read_timeout(Duration::from_millis(1));

    c.bench_function("pump_step_full_read", |b| {
        b.iter(|| {
            port.push_read(&chunk);
            pump.step()
        })
    });
}

criterion_group!(benches, bench_assembler, bench_nul_policy, bench_pump_step);
criterion_main!(benches);
