use alloy_primitives::Address;
use chrono::{Duration, Utc};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use validator::Validate;

use web3_payroll_api::domain::ens::namehash;
use web3_payroll_api::domain::{
    CreateEmployeeRequest, PaymentFrequency, PayrollLedger, TokenAmount, is_payment_due,
};

fn bench_validation(c: &mut Criterion) {
    let request: CreateEmployeeRequest = serde_json::from_value(serde_json::json!({
        "first_name": "Alice",
        "last_name": "Nakamoto",
        "email": "alice@acme.xyz",
        "department": "Engineering",
        "position": "Protocol Engineer",
        "start_date": "2026-01-15",
        "wallet_address": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "salary": "4200.50"
    }))
    .unwrap();

    c.bench_function("validate_employee_request", |b| {
        b.iter(|| {
            let _ = black_box(&request).validate();
        })
    });
}

fn bench_amounts(c: &mut Criterion) {
    c.bench_function("parse_token_amount", |b| {
        b.iter(|| black_box("123456.123456789012345678").parse::<TokenAmount>())
    });
}

fn bench_namehash(c: &mut Criterion) {
    c.bench_function("namehash_subdomain", |b| {
        b.iter(|| namehash(black_box("alice.acme.eth")))
    });
}

fn bench_schedule(c: &mut Criterion) {
    let now = Utc::now();
    let last = Some(now - Duration::days(20));
    c.bench_function("is_payment_due", |b| {
        b.iter(|| is_payment_due(black_box(last), PaymentFrequency::BiWeekly, now))
    });
}

fn bench_ledger_payment(c: &mut Criterion) {
    let wallet = Address::repeat_byte(0x42);
    let now = Utc::now();

    c.bench_function("ledger_process_payment", |b| {
        b.iter_batched(
            || {
                let mut ledger = PayrollLedger::new(["USDC"]);
                ledger
                    .deposit("USDC", TokenAmount::from_whole(1_000_000))
                    .unwrap();
                ledger
                    .add_employee(
                        wallet,
                        TokenAmount::from_whole(4_200),
                        PaymentFrequency::Monthly,
                        "USDC",
                    )
                    .unwrap();
                ledger
            },
            |mut ledger| ledger.process_payment(black_box(wallet), now),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_validation,
    bench_amounts,
    bench_namehash,
    bench_schedule,
    bench_ledger_payment
);
criterion_main!(benches);
