//! Benchmarks for derivation, assembly and the message codec
//!
//! Benchmarks:
//! - Canonical bump search for typical seed sets
//! - Assembly and signing of batches of increasing size
//! - Wire encoding and decoding of a signed transaction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_pipeline::address::{self, well_known};
use ledger_pipeline::tx_builder::{
    assemble, AccountMeta, Instruction, InstructionBatch, InstructionBatcher, SignedTransaction,
};
use ledger_pipeline::types::{AccountLocator, Blockhash, FreshnessToken};
use ledger_pipeline::wallet::Keypair;

/// Helper: batch of `count` instructions signed by `owner`
fn build_batch(owner: &Keypair, count: usize) -> InstructionBatch {
    let mut batcher = InstructionBatcher::new();
    for i in 0..count {
        let target = AccountLocator([i as u8; 32]);
        batcher
            .append(Instruction::new(
                well_known::DEFAULT_TODO_PROGRAM_ID,
                vec![
                    AccountMeta::new(owner.locator(), true),
                    AccountMeta::new(target, false),
                    AccountMeta::new_readonly(well_known::SYSTEM_PROGRAM_ID, false),
                ],
                vec![i as u8; 40],
            ))
            .unwrap();
    }
    batcher.finalize()
}

fn bench_derive(c: &mut Criterion) {
    let owner = AccountLocator([3u8; 32]);
    let mint = AccountLocator([4u8; 32]);

    c.bench_function("derive_todo_profile", |b| {
        b.iter(|| {
            well_known::todo_profile_address(
                black_box(&well_known::DEFAULT_TODO_PROGRAM_ID),
                black_box(&owner),
            )
            .unwrap()
        })
    });

    c.bench_function("derive_associated_token", |b| {
        b.iter(|| {
            well_known::associated_token_address(
                black_box(&owner),
                black_box(&mint),
                &well_known::TOKEN_PROGRAM_ID,
            )
            .unwrap()
        })
    });

    c.bench_function("is_on_curve", |b| {
        b.iter(|| address::is_on_curve(black_box(owner.as_bytes())))
    });
}

fn bench_assemble(c: &mut Criterion) {
    let owner = Keypair::from_seed(&[9u8; 32]);
    let token = FreshnessToken::new(Blockhash([1u8; 32]), 100);

    let mut group = c.benchmark_group("assemble_batch_size");
    for size in [1usize, 8, 32, 64] {
        let batch = build_batch(&owner, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| assemble(owner.locator(), token, batch.clone(), &[&owner]).unwrap())
        });
    }
    group.finish();
}

fn bench_wire_codec(c: &mut Criterion) {
    let owner = Keypair::from_seed(&[9u8; 32]);
    let token = FreshnessToken::new(Blockhash([1u8; 32]), 100);
    let tx = assemble(owner.locator(), token, build_batch(&owner, 16), &[&owner]).unwrap();
    let wire = tx.to_wire_bytes().unwrap();

    let mut group = c.benchmark_group("wire_codec");
    group.bench_function("encode", |b| b.iter(|| black_box(&tx).to_wire_bytes().unwrap()));
    group.bench_function("decode", |b| {
        b.iter(|| SignedTransaction::from_wire_bytes(black_box(&wire)).unwrap())
    });
    group.bench_function("verify", |b| b.iter(|| black_box(&tx).verify()));
    group.finish();
}

criterion_group!(benches, bench_derive, bench_assemble, bench_wire_codec);
criterion_main!(benches);
