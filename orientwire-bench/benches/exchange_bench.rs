//! Request/response exchange benchmarks against an in-process scripted server.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use orientwire_client::{Client, ConnectionConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::runtime::Runtime;

/// Answers every DB_SIZE request on the stream with a fixed size.
async fn serve_db_size(mut stream: DuplexStream) {
    if stream.write_all(&15i16.to_be_bytes()).await.is_err() {
        return;
    }

    let mut response = vec![0];
    response.extend((-1i32).to_be_bytes());
    response.extend(4096i64.to_be_bytes());

    let mut request = [0u8; 5];
    while stream.read_exact(&mut request).await.is_ok() {
        if stream.write_all(&response).await.is_err() {
            return;
        }
    }
}

fn setup(rt: &Runtime) -> Client<DuplexStream> {
    let (near, far) = tokio::io::duplex(64 * 1024);
    rt.spawn(serve_db_size(far));

    let client = Client::from_stream(ConnectionConfig::default(), near);
    rt.block_on(async {
        client.handshake().await.unwrap();
    });
    client
}

fn bench_db_size(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let client = setup(&rt);

    let mut group = c.benchmark_group("exchange");
    group.throughput(Throughput::Elements(1));

    group.bench_function("db_size", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(client.database_size().await.unwrap()) });
    });

    group.finish();
}

fn bench_db_size_contended(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let client = setup(&rt);

    let mut group = c.benchmark_group("exchange_contended");
    group.throughput(Throughput::Elements(4));

    group.bench_function("db_size_x4", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(tokio::join!(
                client.database_size(),
                client.database_size(),
                client.database_size(),
                client.database_size(),
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_db_size, bench_db_size_contended);

criterion_main!(benches);
