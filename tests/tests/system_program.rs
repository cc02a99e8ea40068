use serum_codec::{
    programs::system::{
        self, allocate, assign, create_account, create_nonce_account, nonce_advance,
        nonce_authorize, nonce_initialize, nonce_withdraw, transfer, Allocate, Assign,
        CreateAccountParams, CreateNonceAccountParams, SeedDerivation, Transfer,
    },
    CodecError, DecoderRegistry,
};
use serum_codec_tests::key;
use solana_instruction::{AccountMeta, Instruction};
use solana_system_interface::instruction as system_instruction;

// ---------------------------------------------------------------------------
// Cross-checks against the canonical System program builders
// ---------------------------------------------------------------------------

#[test]
fn test_transfer_matches_canonical_builder() {
    let ix = transfer(&Transfer::new(key(1), key(2), 1_000_000_000, None)).unwrap();
    assert_eq!(ix, system_instruction::transfer(&key(1), &key(2), 1_000_000_000));
}

#[test]
fn test_create_account_matches_canonical_builder() {
    let ix = create_account(&CreateAccountParams {
        from: key(1),
        new_account: key(3),
        lamports: 1_000_000_000,
        space: 100,
        program_id: key(4),
    })
    .unwrap();
    assert_eq!(
        ix,
        system_instruction::create_account(&key(1), &key(3), 1_000_000_000, 100, &key(4))
    );
}

#[test]
fn test_allocate_and_assign_match_canonical_builders() {
    let allocate_ix = allocate(&Allocate::new(key(5), 200, None)).unwrap();
    assert_eq!(allocate_ix, system_instruction::allocate(&key(5), 200));

    let assign_ix = assign(&Assign::new(key(5), key(6), None)).unwrap();
    assert_eq!(assign_ix, system_instruction::assign(&key(5), &key(6)));
}

#[test]
fn test_nonce_instructions_match_canonical_builders() {
    assert_eq!(
        nonce_advance(key(1), key(2)).unwrap(),
        system_instruction::advance_nonce_account(&key(1), &key(2))
    );
    assert_eq!(
        nonce_withdraw(key(1), key(2), key(3), 42).unwrap(),
        system_instruction::withdraw_nonce_account(&key(1), &key(2), &key(3), 42)
    );
    assert_eq!(
        nonce_authorize(key(1), key(2), key(3)).unwrap(),
        system_instruction::authorize_nonce_account(&key(1), &key(2), &key(3))
    );
}

#[test]
fn test_create_nonce_account_matches_canonical_builder() {
    let ixs = create_nonce_account(&CreateNonceAccountParams {
        from: key(1),
        nonce: key(2),
        authorized: key(3),
        lamports: 1_500_000,
        base_and_seed: None,
    })
    .unwrap();
    assert_eq!(
        ixs,
        system_instruction::create_nonce_account(&key(1), &key(2), &key(3), 1_500_000)
    );
    assert_eq!(ixs[1], nonce_initialize(key(2), key(3)).unwrap());
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn test_decode_canonical_transfer() {
    let ix = system_instruction::transfer(&key(1), &key(2), 5_000);
    let decoded = system::registry()
        .unwrap()
        .decode_instruction(&system::ID, &ix)
        .unwrap();
    assert_eq!(decoded.name, "Transfer");
    assert_eq!(decoded.fields.u64("lamports").unwrap(), 5_000);
    assert_eq!(decoded.account("from"), Some(key(1)));
    assert_eq!(decoded.account("to"), Some(key(2)));

    assert_eq!(
        Transfer::decode(&ix).unwrap(),
        Transfer::Base {
            from: key(1),
            to: key(2),
            lamports: 5_000
        }
    );
}

#[test]
fn test_decode_allocate_and_assign_through_decoder_registry() {
    let decoders = DecoderRegistry::with_defaults().unwrap();
    let ixs = [
        system_instruction::allocate(&key(5), 200),
        system_instruction::assign(&key(5), &key(6)),
    ];
    let names: Vec<&str> = ixs
        .iter()
        .map(|ix| decoders.decode(ix).unwrap().unwrap().name)
        .collect();
    assert_eq!(names, ["Allocate", "Assign"]);
    assert_eq!(decoders.program_name(&system::ID), "System Program");
}

#[test]
fn test_transfer_with_seed_round_trip() {
    let transfer = Transfer::new(
        key(10),
        key(11),
        77,
        Some(SeedDerivation {
            base: key(12),
            seed: "escrow-1".to_string(),
            program_id: key(13),
        }),
    );
    let ix = transfer.instruction().unwrap();
    assert_eq!(&ix.data[..4], &11u32.to_le_bytes());
    assert_eq!(
        ix.accounts,
        vec![
            AccountMeta::new(key(10), false),
            AccountMeta::new_readonly(key(12), true),
            AccountMeta::new(key(11), false),
        ]
    );
    assert_eq!(Transfer::decode(&ix).unwrap(), transfer);
}

#[test]
fn test_transfer_decode_checks_program() {
    let mut ix = system_instruction::transfer(&key(1), &key(2), 5);
    ix.program_id = key(9);
    assert!(matches!(
        Transfer::decode(&ix),
        Err(CodecError::WrongProgram { .. })
    ));
}

#[test]
fn test_truncated_transfer_is_malformed() {
    let ix = Instruction {
        program_id: system::ID,
        accounts: vec![AccountMeta::new(key(1), true), AccountMeta::new(key(2), false)],
        data: vec![2, 0, 0, 0, 1, 2, 3],
    };
    assert!(matches!(
        Transfer::decode(&ix),
        Err(CodecError::MalformedBuffer {
            offset: 4,
            needed: 8,
            available: 3
        })
    ));
}
