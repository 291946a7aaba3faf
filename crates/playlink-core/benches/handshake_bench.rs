//! Criterion benchmarks for the legacy handshake derivation.
//!
//! Run with:
//! ```bash
//! cargo bench --package playlink-core --bench handshake_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use playlink_core::crypto::preface::{build_preface, echo_nonce, recover_nonce};
use playlink_core::crypto::seed::derive_seed;
use playlink_core::{
    CryptoError, CryptoStrategy, IvGenerator, LegacyCryptoStrategy, RemotePlayVersion,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct ZeroIv;

impl IvGenerator for ZeroIv {
    fn generate_iv(
        &self,
        _version: RemotePlayVersion,
        _nonce: &[u8],
        _counter: u64,
    ) -> Result<Vec<u8>, CryptoError> {
        Ok(vec![0; 16])
    }
}

const NONCE: [u8; 16] = *b"bench-nonce-0001";

fn bench_transforms(c: &mut Criterion) {
    c.bench_function("derive_seed", |b| b.iter(|| derive_seed(black_box(123_456))));
    c.bench_function("echo_nonce", |b| b.iter(|| echo_nonce(black_box(&NONCE))));
    c.bench_function("recover_nonce", |b| {
        let echoed = echo_nonce(&NONCE);
        b.iter(|| recover_nonce(black_box(&echoed)))
    });
    c.bench_function("build_preface_std_rng", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| build_preface(&mut rng, black_box(&NONCE)))
    });
}

fn bench_strategy(c: &mut Criterion) {
    let strategy = LegacyCryptoStrategy::new(RemotePlayVersion::Ps4V10, "12345678", ZeroIv);
    c.bench_function("legacy_create_codec_os_rng", |b| {
        b.iter(|| strategy.create_codec(black_box(&NONCE)))
    });
}

criterion_group!(benches, bench_transforms, bench_strategy);
criterion_main!(benches);
