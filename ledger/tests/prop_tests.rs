use dualnet_crypto::{LocalSigner, Signer};
use dualnet_ledger::{assemble, Mempool};
use dualnet_transactions::{Transaction, TransactionBuilder};
use dualnet_types::{Amount, PublicKey, SignatureAlgorithm};
use proptest::prelude::*;

fn tx(signer: &LocalSigner, nonce: u64, gas_price: u64, script_len: usize) -> Transaction {
    let mut builder = TransactionBuilder::new(
        signer.public_key(),
        PublicKey::new(SignatureAlgorithm::Ed25519, [9; 32]),
        Amount::new(1),
    )
    .nonce(nonce)
    .gas(gas_price, 1);
    if script_len > 0 {
        builder = builder.contract("N".repeat(script_len));
    }
    builder.sign(signer).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mempool_never_exceeds_capacity(capacity in 0usize..20, count in 0usize..40) {
        let signer = LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[3; 32]);
        let mut pool = Mempool::new(capacity);
        let mut accepted = 0;
        for i in 0..count {
            if pool.insert(tx(&signer, i as u64, 1, 0)) {
                accepted += 1;
            }
            prop_assert!(pool.len() <= capacity);
        }
        prop_assert_eq!(accepted, count.min(capacity));
    }

    #[test]
    fn assembly_respects_size_limit(
        sizes in prop::collection::vec(0usize..400, 0..30),
        max in 0usize..4_000,
    ) {
        let signer = LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[4; 32]);
        let txs: Vec<Transaction> = sizes
            .iter()
            .enumerate()
            .map(|(i, s)| tx(&signer, i as u64, 1, *s))
            .collect();
        let picked = assemble(&txs, max);
        let total: usize = picked.iter().map(Transaction::encoded_len).sum();
        prop_assert!(total <= max);
    }

    #[test]
    fn priority_order_is_non_increasing(prices in prop::collection::vec(1u64..1_000, 1..30)) {
        let signer = LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[5; 32]);
        let mut pool = Mempool::new(100);
        for (i, p) in prices.iter().enumerate() {
            pool.insert(tx(&signer, i as u64, *p, 0));
        }
        let order: Vec<u128> = pool.iter_by_priority().map(Transaction::priority).collect();
        prop_assert!(order.windows(2).all(|w| w[0] >= w[1]));
    }
}
