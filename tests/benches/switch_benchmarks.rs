//! # Gossip Switch Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Merkle root | leaf count 16 to 4096, per hash algorithm |
//! | Block verification | full filter run, 1 to 32 transactions |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_05_gossip_switch::adapters::{EcdsaSenderRecoverer, KvExecutor, MemoryChain};
use qc_05_gossip_switch::{
    compute_merkle_root, BlockFilter, SwitchFilter, SwitchMessage, WorkerOptions,
    REMOTE_IN_PORT_ID,
};
use qc_tests::fixtures::{random_writes, signed_kv_tx, TestChain};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_bus::InMemoryEventBus;
use shared_crypto::{HashAlgorithm, Hasher, Secp256k1KeyPair};
use shared_types::Hash;
use std::sync::Arc;
use std::time::Duration;

fn bench_merkle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-05-merkle-root");
    let mut rng = StdRng::seed_from_u64(1);

    for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Keccak256, HashAlgorithm::Blake3] {
        let hasher = Hasher::new(algorithm);
        for size in [16usize, 256, 4096] {
            let leaves: Vec<Hash> = (0..size).map(|_| rng.gen()).collect();
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), size),
                &leaves,
                |b, leaves| b.iter(|| black_box(compute_merkle_root(&hasher, leaves))),
            );
        }
    }
    group.finish();
}

fn bench_block_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-05-block-verify");
    group.measurement_time(Duration::from_secs(10));

    let key = Secp256k1KeyPair::generate();
    let mut rng = StdRng::seed_from_u64(2);

    for tx_count in [1usize, 8, 32] {
        let source = TestChain::new(Hasher::default());
        let txs = (0..tx_count as u64)
            .map(|nonce| signed_kv_tx(&key, nonce, &random_writes(&mut rng, 1)))
            .collect();
        let block = match source.seal(&source.genesis, txs) {
            Ok(block) => block,
            Err(e) => panic!("seal benchmark block: {e}"),
        };

        group.throughput(Throughput::Elements(tx_count as u64));
        group.bench_with_input(BenchmarkId::new("verify", tx_count), &block, |b, block| {
            b.iter_batched(
                || {
                    // Fresh chain per run so the block is never already known.
                    let chain = Arc::new(MemoryChain::new(source.genesis.clone(), source.hasher));
                    let filter = BlockFilter::new(
                        Arc::new(InMemoryEventBus::new()),
                        chain,
                        Arc::new(KvExecutor::new()),
                        Arc::new(EcdsaSenderRecoverer),
                        WorkerOptions::default(),
                    );
                    (filter, SwitchMessage::Block(block.clone()))
                },
                |(filter, mut msg)| black_box(filter.verify(REMOTE_IN_PORT_ID, &mut msg).is_ok()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merkle_root, bench_block_verification);
criterion_main!(benches);
