use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use smartpark_core::normalize;
use smartpark_protocol::{ControllerCodec, GateCommand};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    group.bench_function("clean", |b| b.iter(|| normalize(black_box("AB123CD"))));
    group.bench_function("noisy_ocr", |b| {
        b.iter(|| normalize(black_box(" xy-999 zz.\u{00e9}")))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller_codec");

    group.bench_function("decode_state_line", |b| {
        let mut codec = ControllerCodec::new();
        b.iter(|| {
            let mut buf = BytesMut::from(&b"ESTADO:0,1,2,0\r\n"[..]);
            black_box(codec.decode(&mut buf).unwrap())
        })
    });

    group.bench_function("decode_burst", |b| {
        let mut codec = ControllerCodec::new();
        let burst = b"ESTADO:0,1,2,0\nDETECTADO\nESTADO:1,1,1,1\n".repeat(32);
        b.iter(|| {
            let mut buf = BytesMut::from(&burst[..]);
            let mut count = 0;
            while let Some(msg) = codec.decode(&mut buf).unwrap() {
                black_box(msg);
                count += 1;
            }
            count
        })
    });

    group.bench_function("encode_reservations", |b| {
        let mut codec = ControllerCodec::new();
        let cmd: GateCommand = "RESERVA:0,0,2,0".parse().unwrap();
        b.iter(|| {
            let mut buf = BytesMut::with_capacity(32);
            codec.encode(black_box(cmd.clone()), &mut buf).unwrap();
            buf
        })
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_decode);
criterion_main!(benches);
