//! 健康检查聚合基准测试
//!
//! 测试检查评估与报告序列化的开销

use app_health::health::{AppHealth, Check, CheckStatus, HealthReport};
use app_health::error::HealthCheckError;
use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

struct StaticCheck {
    name: String,
    passed: bool,
}

#[async_trait]
impl Check for StaticCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        Ok(if self.passed {
            CheckStatus::ok()
        } else {
            CheckStatus::problem("disk almost full")
        })
    }
}

fn app_health(count: usize) -> AppHealth {
    let checks: Vec<Arc<dyn Check>> = (0..count)
        .map(|i| {
            Arc::new(StaticCheck {
                name: format!("check-{i}"),
                passed: i % 5 != 0,
            }) as Arc<dyn Check>
        })
        .collect();
    AppHealth::new(checks)
}

/// 评估基准测试
fn evaluate_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    for count in [1usize, 10, 50] {
        let health = app_health(count);
        c.bench_function(&format!("evaluate_{count}_checks"), |b| {
            b.iter(|| black_box(runtime.block_on(health.evaluate())));
        });
    }
}

/// 报告序列化基准测试
fn report_serialization_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let report: HealthReport = runtime.block_on(app_health(20).evaluate());

    c.bench_function("health_report_serialization", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&report)).unwrap()));
    });
}

criterion_group!(benches, evaluate_benchmark, report_serialization_benchmark);
criterion_main!(benches);
