//! # Gossip Switch Flows
//!
//! End-to-end runs of the transaction and block switches with the shared
//! event bus, secp256k1 recovery and the in-memory chain.
//!
//! ## Flows Tested
//!
//! 1. **Tx switch**: forged sender dropped and reported, valid tx fanned out
//! 2. **Block switch**: chain grows through the switch, duplicates reported
//! 3. **Concurrency**: parallel verification ends in the serial chain state

#[cfg(test)]
mod tests {
    use crate::fixtures::{init_tracing, random_writes, signed_kv_tx, signed_kv_tx_with, TestChain, TEST_CHAIN_ID};
    use qc_05_gossip_switch::adapters::{EcdsaSenderRecoverer, KvExecutor, MemoryChain};
    use qc_05_gossip_switch::{
        BlockFilter, Collaborators, FilterError, GossipSwitch, OutPort, SignerScheme, SwitchConfig,
        SwitchFilter, SwitchMessage, SwitchType, WorkerOptions, LOCAL_IN_PORT_ID,
        LOCAL_OUT_PORT_ID, REMOTE_IN_PORT_ID, REMOTE_OUT_PORT_ID,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_bus::{EventFilter, EventKind, EventTopic, InMemoryEventBus, Subscription, SwitchEvent};
    use shared_crypto::{Hasher, Secp256k1KeyPair};
    use shared_types::Block;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);
    const QUIET: Duration = Duration::from_millis(100);

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn tap(port: &OutPort) -> mpsc::UnboundedReceiver<SwitchMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        port.bind(move |msg| {
            tx.send(msg.clone())?;
            Ok(())
        })
        .unwrap();
        rx
    }

    async fn next_event(sub: &mut Subscription) -> SwitchEvent {
        timeout(WAIT, sub.recv()).await.unwrap().unwrap()
    }

    fn block_switch(test_chain: &TestChain, bus: Arc<InMemoryEventBus>) -> GossipSwitch {
        let config = SwitchConfig {
            switch_type: SwitchType::Block,
            chain_id: TEST_CHAIN_ID,
            hash_algorithm: test_chain.hasher.algorithm(),
            ..SwitchConfig::default()
        };
        let collaborators = Collaborators::new(bus)
            .with_chain(test_chain.chain.clone())
            .with_executor(Arc::new(KvExecutor::new()));
        GossipSwitch::by_type(&config, collaborators).unwrap()
    }

    // =============================================================================
    // TRANSACTION SWITCH
    // =============================================================================

    #[tokio::test]
    async fn test_forged_sender_dropped_and_reported() {
        init_tracing();
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::topics(vec![EventTopic::Transaction]));
        let config = SwitchConfig {
            chain_id: TEST_CHAIN_ID,
            ..SwitchConfig::transaction()
        };
        let switch = GossipSwitch::by_type(&config, Collaborators::new(bus.clone())).unwrap();
        let mut remote = tap(&switch.out_port(REMOTE_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        let key = Secp256k1KeyPair::generate();
        let mut tx = signed_kv_tx_with(&key, 0, &[], SignerScheme::ChainBound(TEST_CHAIN_ID));
        tx.data.from = Some(Secp256k1KeyPair::generate().address());
        switch.in_port(REMOTE_IN_PORT_ID).unwrap().write(tx).unwrap();

        match next_event(&mut events).await {
            SwitchEvent::TxVerifyFailed { reason, .. } => {
                assert!(reason.contains("signature verify failed"), "reason: {reason}");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(timeout(QUIET, remote.recv()).await.is_err());

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_chain_bound_tx_fanned_out() {
        init_tracing();
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::kinds(vec![EventKind::TxVerifySucceeded]));
        let config = SwitchConfig {
            chain_id: TEST_CHAIN_ID,
            ..SwitchConfig::transaction()
        };
        let switch = GossipSwitch::by_type(&config, Collaborators::new(bus.clone())).unwrap();
        let mut local = tap(&switch.out_port(LOCAL_OUT_PORT_ID).unwrap());
        let mut remote = tap(&switch.out_port(REMOTE_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        let key = Secp256k1KeyPair::generate();
        let tx = signed_kv_tx_with(&key, 3, &[], SignerScheme::ChainBound(TEST_CHAIN_ID));
        switch.in_port(LOCAL_IN_PORT_ID).unwrap().write(tx.clone()).unwrap();

        assert!(matches!(next_event(&mut events).await, SwitchEvent::TxVerifySucceeded { .. }));
        let expected = SwitchMessage::Transaction(tx);
        assert_eq!(timeout(WAIT, local.recv()).await.unwrap(), Some(expected.clone()));
        assert_eq!(timeout(WAIT, remote.recv()).await.unwrap(), Some(expected));

        switch.stop().unwrap();
        switch.join().await;
    }

    // =============================================================================
    // BLOCK SWITCH
    // =============================================================================

    #[tokio::test]
    async fn test_chain_grows_through_block_switch() {
        init_tracing();
        let test_chain = TestChain::new(Hasher::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let switch = block_switch(&test_chain, bus);
        let mut remote = tap(&switch.out_port(REMOTE_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        let key = Secp256k1KeyPair::generate();
        let mut rng = StdRng::seed_from_u64(5);
        let mut parent = test_chain.genesis.clone();
        let writes: Vec<_> = (0..3).map(|_| random_writes(&mut rng, 2)).collect();

        for (height, pair) in (1..=3u64).zip(&writes) {
            let txs = vec![
                signed_kv_tx(&key, height * 2, &pair[..1]),
                signed_kv_tx(&key, height * 2 + 1, &pair[1..]),
            ];
            let block = test_chain.seal(&parent, txs).unwrap();
            switch.in_port(REMOTE_IN_PORT_ID).unwrap().write(block.clone()).unwrap();

            let relayed = timeout(WAIT, remote.recv()).await.unwrap().unwrap();
            assert_eq!(relayed.as_block().map(Block::height), Some(height));
            parent = block;
        }

        let chain = &test_chain.chain;
        assert_eq!(chain.height(), 3);
        assert_eq!(chain.head().unwrap().header_hash, parent.header_hash);
        let (key0, value0) = writes[2][0];
        assert_eq!(chain.state_value(&parent.header_hash, &key0), Some(value0));
        assert_eq!(chain.receipts(&parent.header_hash).map(|r| r.len()), Some(2));

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_replayed_block_reported_as_existing() {
        init_tracing();
        let test_chain = TestChain::new(Hasher::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::topics(vec![EventTopic::Block]));
        let switch = block_switch(&test_chain, bus.clone());
        let mut local = tap(&switch.out_port(LOCAL_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        let block = test_chain.seal(&test_chain.genesis, vec![]).unwrap();
        let input = switch.in_port(LOCAL_IN_PORT_ID).unwrap();
        input.write(block.clone()).unwrap();
        input.write(block.clone()).unwrap();

        assert!(timeout(WAIT, local.recv()).await.unwrap().is_some());
        assert_eq!(
            next_event(&mut events).await,
            SwitchEvent::BlockExisted {
                block_hash: block.header_hash,
                height: 1,
                current_height: 1,
            }
        );
        assert!(timeout(QUIET, local.recv()).await.is_err());

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_tampered_block_reported_as_failed() {
        init_tracing();
        let test_chain = TestChain::new(Hasher::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::all());
        let switch = block_switch(&test_chain, bus.clone());
        switch.start().unwrap();

        let mut block = test_chain.seal(&test_chain.genesis, vec![]).unwrap();
        block.header.height = 9;
        switch.in_port(REMOTE_IN_PORT_ID).unwrap().write(block).unwrap();

        match next_event(&mut events).await {
            SwitchEvent::BlockVerifyFailed { height, reason, .. } => {
                assert_eq!(height, 9);
                assert!(reason.contains("header hash"), "reason: {reason}");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(test_chain.chain.height(), 0);

        switch.stop().unwrap();
        switch.join().await;
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    fn filter_for(chain: Arc<MemoryChain>) -> BlockFilter {
        BlockFilter::new(
            Arc::new(InMemoryEventBus::new()),
            chain,
            Arc::new(KvExecutor::new()),
            Arc::new(EcdsaSenderRecoverer),
            WorkerOptions::default(),
        )
    }

    #[test]
    fn test_concurrent_verification_matches_serial() {
        init_tracing();
        let hasher = Hasher::default();
        let source = TestChain::new(hasher);
        let key = Secp256k1KeyPair::generate();
        let mut rng = StdRng::seed_from_u64(11);

        // Seal a five-block chain on the source.
        let source_filter = filter_for(source.chain.clone());
        let mut blocks = Vec::new();
        let mut parent = source.genesis.clone();
        for nonce in 0..5u64 {
            let writes = random_writes(&mut rng, 3);
            let block = source.seal(&parent, vec![signed_kv_tx(&key, nonce, &writes)]).unwrap();
            source_filter
                .verify(LOCAL_IN_PORT_ID, &mut SwitchMessage::Block(block.clone()))
                .unwrap();
            parent = block.clone();
            blocks.push(block);
        }

        // Serial replay on a fresh chain.
        let serial = TestChain::new(hasher);
        let serial_filter = filter_for(serial.chain.clone());
        for block in &blocks {
            serial_filter
                .verify(REMOTE_IN_PORT_ID, &mut SwitchMessage::Block(block.clone()))
                .unwrap();
        }

        // Eight threads submit the same sequence at once.
        let concurrent = TestChain::new(hasher);
        let concurrent_filter = Arc::new(filter_for(concurrent.chain.clone()));
        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let filter = concurrent_filter.clone();
                    let blocks = &blocks;
                    scope.spawn(move || {
                        let mut accepted = 0;
                        for block in blocks {
                            match filter.verify(REMOTE_IN_PORT_ID, &mut SwitchMessage::Block(block.clone())) {
                                Ok(()) => accepted += 1,
                                Err(FilterError::BlockExists { .. }) => {}
                                Err(e) => panic!("unexpected rejection: {e}"),
                            }
                        }
                        accepted
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(accepted, blocks.len());
        let tip = &blocks[blocks.len() - 1];
        for chain in [&serial.chain, &concurrent.chain] {
            assert_eq!(chain.head().unwrap().header_hash, tip.header_hash);
            assert_eq!(chain.block_count(), serial.chain.block_count());
        }
        assert_eq!(
            serial.chain.head().unwrap().header.state_root,
            concurrent.chain.head().unwrap().header.state_root
        );
    }
}
