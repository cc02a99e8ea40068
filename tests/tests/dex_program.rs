use serum_codec::{
    programs::dex::{
        self, cancel_order, cancel_order_by_client_id, cancel_order_by_client_id_v2,
        cancel_order_v2, initialize_market, new_order, settle_funds, CancelOrderParams,
        InitializeMarketParams, NewOrderParams, OrderType, SettleFundsParams, Side,
        TOKEN_PROGRAM_ID,
    },
    programs::system::RENT_SYSVAR,
    CodecError, DecoderRegistry, ProgramDecoder,
};
use serum_codec_tests::{key, market_accounts};
use solana_instruction::AccountMeta;

fn new_order_params(fee_discount: Option<solana_pubkey::Pubkey>) -> NewOrderParams {
    NewOrderParams {
        market: key(1),
        open_orders: key(8),
        request_queue: key(2),
        payer: key(9),
        owner: key(10),
        base_vault: key(6),
        quote_vault: key(7),
        side: Side::Buy,
        limit_price: 12_345,
        max_quantity: 10,
        order_type: OrderType::ImmediateOrCancel,
        client_id: 0xdead_beef,
        fee_discount,
    }
}

#[test]
fn test_new_order_wire_form() {
    let ix = new_order(dex::ID, &new_order_params(None)).unwrap();

    let mut expected = vec![0u8, 1, 0, 0, 0];
    expected.extend_from_slice(&0u32.to_le_bytes());
    expected.extend_from_slice(&12_345u64.to_le_bytes());
    expected.extend_from_slice(&10u64.to_le_bytes());
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&0xdead_beefu64.to_le_bytes());
    assert_eq!(ix.data, expected);

    assert_eq!(ix.accounts.len(), 9);
    assert_eq!(ix.accounts[4], AccountMeta::new_readonly(key(10), true));
    assert_eq!(ix.accounts[7], AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false));
    assert_eq!(ix.accounts[8], AccountMeta::new_readonly(RENT_SYSVAR, false));
}

#[test]
fn test_new_order_fee_discount_trails() {
    let ix = new_order(dex::ID, &new_order_params(Some(key(40)))).unwrap();
    let decoded = dex::registry().unwrap().decode_instruction(&dex::ID, &ix).unwrap();
    assert_eq!(decoded.accounts.len(), 9);
    assert_eq!(
        decoded.remaining_accounts,
        vec![AccountMeta::new_readonly(key(40), false)]
    );
    assert_eq!(
        Side::try_from(decoded.fields.u32("side").unwrap()).unwrap(),
        Side::Buy
    );
    assert_eq!(
        OrderType::try_from(decoded.fields.u32("order_type").unwrap()).unwrap(),
        OrderType::ImmediateOrCancel
    );
}

#[test]
fn test_initialize_market_decodes() {
    let ix = initialize_market(
        dex::ID,
        &InitializeMarketParams {
            accounts: market_accounts(),
            base_mint: key(20),
            quote_mint: key(21),
            base_lot_size: 100,
            quote_lot_size: 10,
            fee_rate_bps: 22,
            vault_signer_nonce: 3,
            quote_dust_threshold: 5,
        },
    )
    .unwrap();
    assert_eq!(ix.data.len(), 1 + 4 + 8 + 8 + 2 + 8 + 8);

    let decoded = dex::registry().unwrap().decode_instruction(&dex::ID, &ix).unwrap();
    assert_eq!(decoded.name, "InitializeMarket");
    assert_eq!(decoded.fields.u16("fee_rate_bps").unwrap(), 22);
    assert_eq!(decoded.account("base_mint"), Some(key(20)));
    assert_eq!(decoded.account("rent"), Some(RENT_SYSVAR));
}

#[test]
fn test_cancel_order_carries_open_orders_in_data() {
    let ix = cancel_order(
        dex::ID,
        &CancelOrderParams {
            market: key(1),
            open_orders: key(8),
            request_queue: key(2),
            owner: key(10),
            side: Side::Sell,
            order_id: u128::MAX - 1,
            open_orders_slot: 4,
        },
    )
    .unwrap();
    // version + tag + side + order id + open orders + slot
    assert_eq!(ix.data.len(), 1 + 4 + 4 + 16 + 32 + 1);
    assert_eq!(&ix.data[25..57], key(8).as_ref());
    assert_eq!(ix.accounts[0], AccountMeta::new_readonly(key(1), false));
}

#[test]
fn test_cancel_v2_variants_share_roles() {
    let market = market_accounts();
    let by_id = cancel_order_v2(dex::ID, &market, key(8), key(10), Side::Buy, 99).unwrap();
    let by_client =
        cancel_order_by_client_id_v2(dex::ID, &market, key(8), key(10), 1234).unwrap();
    assert_eq!(by_id.accounts, by_client.accounts);
    assert_eq!(by_id.accounts[5], AccountMeta::new(market.event_queue, false));
    assert_eq!(&by_client.data[..5], &[0, 12, 0, 0, 0]);
}

#[test]
fn test_cancel_by_client_id_round_trip() {
    let ix = cancel_order_by_client_id(dex::ID, key(1), key(8), key(2), key(10), 55).unwrap();
    let decoded = dex::registry().unwrap().decode_instruction(&dex::ID, &ix).unwrap();
    assert_eq!(decoded.name, "CancelOrderByClientId");
    assert_eq!(decoded.fields.u64("client_id").unwrap(), 55);
    assert_eq!(decoded.account("owner"), Some(key(10)));
}

#[test]
fn test_settle_funds_referrer_is_optional() {
    let params = SettleFundsParams {
        market: key(1),
        open_orders: key(8),
        owner: key(10),
        base_vault: key(6),
        quote_vault: key(7),
        base_wallet: key(30),
        quote_wallet: key(31),
        vault_signer: key(32),
        referrer_quote_wallet: None,
    };
    let plain = settle_funds(dex::ID, &params).unwrap();
    assert_eq!(plain.data, [0, 5, 0, 0, 0]);
    assert_eq!(plain.accounts.len(), 9);

    let referred = settle_funds(
        dex::ID,
        &SettleFundsParams {
            referrer_quote_wallet: Some(key(33)),
            ..params
        },
    )
    .unwrap();
    assert_eq!(referred.accounts.len(), 10);
    assert_eq!(referred.accounts[9], AccountMeta::new(key(33), false));
}

#[test]
fn test_unversioned_data_is_rejected() {
    let mut ix = new_order(dex::ID, &new_order_params(None)).unwrap();
    ix.data[0] = 1;
    assert_eq!(
        dex::registry().unwrap().decode_instruction(&dex::ID, &ix).unwrap_err(),
        CodecError::UnsupportedVersion {
            expected: 0,
            found: 1
        }
    );
}

#[test]
fn test_decoder_registry_accepts_other_deployments() {
    let deployment = key(77);
    let mut decoders = DecoderRegistry::new();
    decoders.register(Box::new(ProgramDecoder::dex(deployment).unwrap()));

    let ix = new_order(deployment, &new_order_params(None)).unwrap();
    let decoded = decoders.decode(&ix).unwrap().unwrap();
    assert_eq!(decoded.name, "NewOrder");
    assert_eq!(decoders.program_name(&deployment), dex::PROGRAM_NAME);
    assert!(!decoders.has_decoder(&dex::ID));
}
