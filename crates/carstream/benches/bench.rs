use carstream::{
    Car, ChannelWriter, Event, Producer, ScriptedSource, TokioYield, collect_async, write_chunked,
};
use core::{hint::black_box, ops::ControlFlow, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Builder;

// Number of records emitted per benchmark iteration.
const TOTAL_RECORDS: u64 = 4096;
const TIMEOUT: Duration = Duration::from_secs(60);

fn script() -> Vec<Car> {
    (1..=TOTAL_RECORDS)
        .map(|id| Car::new(id, "Model 3", "Tesla"))
        .collect()
}

fn bench_bridge(c: &mut Criterion) {
    let runtime = Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");
    let cars = script();
    let producer = {
        let cars = cars.clone();
        Producer::new(
            move || ScriptedSource::<TokioYield>::new(cars.clone()),
            runtime.handle().clone(),
        )
    };

    let mut group = c.benchmark_group("bridge");
    group.throughput(Throughput::Elements(TOTAL_RECORDS));

    group.bench_function(format!("subscribe/{TOTAL_RECORDS}"), |b| {
        b.to_async(&runtime).iter(|| async {
            let subscription = producer
                .subscribe(TIMEOUT, |event: Event| {
                    black_box(event);
                    ControlFlow::Continue(())
                })
                .expect("subscribe failed");
            black_box(subscription.join().await.expect("subscription dropped"));
        });
    });

    group.bench_function(format!("collect/{TOTAL_RECORDS}"), |b| {
        b.to_async(&runtime).iter(|| async {
            let batch = collect_async(&producer, TIMEOUT).await.expect("collect failed");
            black_box(batch);
        });
    });

    group.bench_function(format!("chunked/{TOTAL_RECORDS}"), |b| {
        b.iter(|| {
            let (sink, mut rx) = ChannelWriter::channel();
            let outcome = write_chunked(&producer, TIMEOUT, sink);
            while let Ok(chunk) = rx.try_recv() {
                black_box(chunk);
            }
            black_box(outcome);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_bridge);
criterion_main!(benches);
