//! SOCKS5 and line handling benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

use torchat::chat::line::decode_chunk;
use torchat::proxy::socks5::{self, reply_message, ConnectRequest};

fn bench_request_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect_request_encode");

    for len in [16usize, 255] {
        let request = ConnectRequest::new("a".repeat(len), 1234).unwrap();
        group.throughput(Throughput::Bytes(request.encoded_len() as u64));
        group.bench_function(format!("{}_byte_domain", len), |b| {
            b.iter(|| black_box(request.encode()))
        });
    }

    group.finish();
}

fn bench_reply_message(c: &mut Criterion) {
    c.bench_function("reply_message", |b| {
        b.iter(|| {
            for status in 0u8..=0x0a {
                black_box(reply_message(black_box(status)));
            }
        })
    });
}

fn bench_decode_chunk(c: &mut Criterion) {
    let chunk = format!("{}\r\n", "x".repeat(4094));

    let mut group = c.benchmark_group("decode_chunk");
    group.throughput(Throughput::Bytes(chunk.len() as u64));
    group.bench_function("4096_bytes", |b| {
        b.iter(|| black_box(decode_chunk(chunk.as_bytes())))
    });
    group.finish();
}

fn bench_handshake(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("socks5_handshake_duplex", |b| {
        b.to_async(&rt).iter(|| async {
            let (client, mut proxy) = duplex(1024);

            let server = tokio::spawn(async move {
                let mut greeting = [0u8; 3];
                proxy.read_exact(&mut greeting).await.unwrap();
                proxy.write_all(&[0x05, 0x00]).await.unwrap();

                let mut head = [0u8; 5];
                proxy.read_exact(&mut head).await.unwrap();
                let mut rest = vec![0u8; head[4] as usize + 2];
                proxy.read_exact(&mut rest).await.unwrap();

                proxy
                    .write_all(&[0x05, 0x00, 0x00, 0x01, 127, 0, 0, 1, 0x04, 0xd2])
                    .await
                    .unwrap();
                proxy
            });

            let stream = socks5::connect_domain(client, "example.onion", 1234)
                .await
                .unwrap();
            let _proxy = server.await.unwrap();
            black_box(stream)
        })
    });
}

criterion_group!(
    benches,
    bench_request_encode,
    bench_reply_message,
    bench_decode_chunk,
    bench_handshake,
);
criterion_main!(benches);
