//! 验签性能基准测试
//!
//! 测试场景:
//! 1. Stacks secp256k1 验签（含 legacy 前缀回退）
//! 2. Ethereum 签名者地址恢复
//! 3. Solana ed25519 验签
//! 4. 授权消息构造

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ed25519_dalek::Signer;
use ironlink::{
    domain::{AuthorizationMessage, BindingOperation, Chain, VerificationMethod},
    security::signature::{ethereum, stacks, SignatureVerifier},
};

const BTC_ADDRESS: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";

fn rsv(key: &k256::ecdsa::SigningKey, digest: &[u8; 32], v_offset: u8) -> Vec<u8> {
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest).unwrap();
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + v_offset);
    bytes
}

fn bench_stacks(c: &mut Criterion) {
    let key = k256::ecdsa::SigningKey::from_slice(&[0x11u8; 32]).unwrap();
    let public_key = hex::encode(key.verifying_key().to_encoded_point(true).as_bytes());
    let message =
        AuthorizationMessage::build(Chain::Btc, BindingOperation::Add, BTC_ADDRESS, "example.btc")
            .unwrap();

    let current = hex::encode(rsv(
        &key,
        &stacks::hash_message(message.as_str(), stacks::STACKS_MESSAGE_PREFIX),
        0,
    ));
    let legacy = hex::encode(rsv(
        &key,
        &stacks::hash_message(message.as_str(), stacks::LEGACY_STACKS_MESSAGE_PREFIX),
        0,
    ));

    let mut group = c.benchmark_group("stacks");
    group.bench_function("verify_current_prefix", |b| {
        b.iter(|| {
            SignatureVerifier::Stacks.verify(
                black_box(message.as_str()),
                black_box(&current),
                black_box(&public_key),
            )
        })
    });
    group.bench_function("verify_legacy_prefix", |b| {
        b.iter(|| {
            SignatureVerifier::Stacks.verify(
                black_box(message.as_str()),
                black_box(&legacy),
                black_box(&public_key),
            )
        })
    });
    group.finish();
}

fn bench_ethereum(c: &mut Criterion) {
    let key = k256::ecdsa::SigningKey::from_slice(&[0x33u8; 32]).unwrap();
    let address = ethereum::public_key_to_address(key.verifying_key());
    let message =
        AuthorizationMessage::build(Chain::Eth, BindingOperation::Add, &address, "example.btc")
            .unwrap();
    let signature = format!(
        "0x{}",
        hex::encode(rsv(&key, &ethereum::hash_message(message.as_bytes()), 27))
    );

    c.bench_function("ethereum_recover_and_compare", |b| {
        b.iter(|| {
            SignatureVerifier::Ethereum.verify(
                black_box(message.as_str()),
                black_box(&signature),
                black_box(&address),
            )
        })
    });
}

fn bench_solana(c: &mut Criterion) {
    let key = ed25519_dalek::SigningKey::from_bytes(&[0x44u8; 32]);
    let address = bs58::encode(key.verifying_key().to_bytes()).into_string();
    let message =
        AuthorizationMessage::build(Chain::Sol, BindingOperation::Add, &address, "example.btc")
            .unwrap();
    let signature = bs58::encode(key.sign(message.as_bytes()).to_bytes()).into_string();

    c.bench_function("solana_verify_strict", |b| {
        b.iter(|| {
            SignatureVerifier::Solana.verify(
                black_box(message.as_str()),
                black_box(&signature),
                black_box(&address),
            )
        })
    });
}

fn bench_message_build(c: &mut Criterion) {
    c.bench_function("authorization_message_build", |b| {
        b.iter(|| {
            AuthorizationMessage::build_for(
                black_box(VerificationMethod::Native),
                black_box(Chain::Eth),
                BindingOperation::Remove,
                black_box("0x71c7656ec7ab88b098defb751b7401b5f6d8976f"),
                black_box("example.btc"),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_stacks,
    bench_ethereum,
    bench_solana,
    bench_message_build
);
criterion_main!(benches);
