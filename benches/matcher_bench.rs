use criterion::{black_box, criterion_group, criterion_main, Criterion};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solkit::search::PatternMatcher;

fn bench_matcher(c: &mut Criterion) {
    let addresses: Vec<String> = (0..1024)
        .map(|_| Keypair::new().pubkey().to_string())
        .collect();

    let exact = PatternMatcher::new(Some("ab".into()), None, false).unwrap();
    c.bench_function("match_exact_prefix_1024", |b| {
        b.iter(|| {
            addresses
                .iter()
                .filter(|a| exact.matches(black_box(a)))
                .count()
        })
    });

    let folded = PatternMatcher::new(Some("ab".into()), Some("z".into()), true).unwrap();
    c.bench_function("match_folded_both_ends_1024", |b| {
        b.iter(|| {
            addresses
                .iter()
                .filter(|a| folded.matches(black_box(a)))
                .count()
        })
    });
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
