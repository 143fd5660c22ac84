use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use lendr_core::{DeviceId, UserId};
use lendr_events::{EventEnvelope, InMemoryEventBus};
use lendr_infra::{InMemoryDocumentStore, LendingService, LendingSettings, RetryPolicy};
use lendr_lending::{AddDevice, BorrowerInfo, LendingEvent, LineItemInput, ManualLend, MarkReturned};
use std::sync::Arc;

type Service = LendingService<Arc<InMemoryDocumentStore>, Arc<InMemoryEventBus<EventEnvelope<LendingEvent>>>>;

fn service() -> Service {
    service_with(LendingSettings::default())
}

fn service_with(settings: LendingSettings) -> Service {
    LendingService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(InMemoryEventBus::new()),
        settings,
    )
}

fn add_devices(service: &Service, count: usize) -> Vec<DeviceId> {
    (0..count)
        .map(|i| {
            service
                .add_device(&AddDevice {
                    name: format!("Sensor {i}"),
                    model: String::new(),
                    category: "Sensor".to_string(),
                    description: String::new(),
                    image_url: None,
                    total_stock: 1_000_000,
                    occurred_at: Utc::now(),
                })
                .unwrap()
        })
        .collect()
}

fn lend(service: &Service, admin: &UserId, devices: &[DeviceId]) -> lendr_core::BorrowLogId {
    service
        .manual_lend(&ManualLend {
            admin_id: admin.clone(),
            borrower: BorrowerInfo::new("Bench", "bench@example.com"),
            items: devices.iter().map(|d| LineItemInput::new(*d, "Sensor", 1)).collect(),
            expected_return_date: None,
            occurred_at: Utc::now(),
        })
        .unwrap()
}

/// Lend-then-return round trip over loans touching N devices.
fn bench_lend_and_return(c: &mut Criterion) {
    let mut group = c.benchmark_group("lend_and_return");

    for fan_out in [1usize, 4, 16] {
        group.throughput(Throughput::Elements(fan_out as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fan_out), &fan_out, |b, &fan_out| {
            let service = service();
            let devices = add_devices(&service, fan_out);
            let admin = UserId::new("admin-bench").unwrap();

            b.iter(|| {
                let log_id = lend(&service, &admin, &devices);
                let outcome = service
                    .mark_returned(&MarkReturned {
                        log_id,
                        returned_items: devices
                            .iter()
                            .map(|d| LineItemInput::new(*d, "Sensor", 1))
                            .collect(),
                        returned_by: admin.clone(),
                        fine_amount: 0,
                        occurred_at: Utc::now(),
                    })
                    .unwrap();
                black_box(outcome)
            });
        });
    }

    group.finish();
}

/// Contended checkouts: several threads lending from one device.
fn bench_contended_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_checkout");
    group.sample_size(20);

    for threads in [2usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let service = Arc::new(service_with(LendingSettings {
                retry: RetryPolicy::new(1_000),
                ..LendingSettings::default()
            }));
            let devices = add_devices(&service, 1);

            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let service = service.clone();
                        let devices = devices.clone();
                        std::thread::spawn(move || {
                            let admin = UserId::new("admin-bench").unwrap();
                            for _ in 0..10 {
                                black_box(lend(&service, &admin, &devices));
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lend_and_return, bench_contended_checkout);
criterion_main!(benches);
