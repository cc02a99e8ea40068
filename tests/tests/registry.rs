use serum_codec::{
    decode_discriminant, CodecError, FieldSpec, FieldValues, FlagSet, InstructionRegistry,
    KeyRole, LayoutSchema, VariantDef,
};
use serum_codec_tests::key;
use solana_instruction::{AccountMeta, Instruction};

const FLAG_NAMES: &[&str] = &["frozen", "closed"];

const VAULT: &[VariantDef] = &[
    VariantDef {
        name: "Deposit",
        discriminant: 7,
        fields: &[
            FieldSpec::u64("amount"),
            FieldSpec::padding(2),
            FieldSpec::flags("state", 1, FLAG_NAMES),
            FieldSpec::blob("memo", 6),
        ],
        key_roles: &[KeyRole::signer("owner"), KeyRole::writable("vault")],
    },
    VariantDef {
        name: "Rename",
        discriminant: 8,
        fields: &[FieldSpec::string("label"), FieldSpec::u8("version")],
        key_roles: &[KeyRole::writable("vault")],
    },
];

fn vault_registry() -> InstructionRegistry {
    InstructionRegistry::builder("Vault")
        .register_all(VAULT)
        .unwrap()
        .build()
}

fn deposit_values() -> FieldValues {
    FieldValues::new()
        .with("amount", 9_000u64)
        .with(
            "state",
            [("frozen", true), ("closed", false)].into_iter().collect::<FlagSet>(),
        )
        .with("memo", b"hello!".to_vec())
}

#[test]
fn test_custom_registry_round_trip() {
    let registry = vault_registry();
    let program = key(50);
    let ix = registry
        .build(program, "Deposit", &deposit_values(), &[("owner", key(1)), ("vault", key(2))], vec![])
        .unwrap();

    assert_eq!(decode_discriminant(&ix.data).unwrap(), 7);
    assert_eq!(ix.data.len(), 4 + 8 + 2 + 1 + 6);
    assert_eq!(ix.data[14], 0b01);

    let decoded = registry.decode_instruction(&program, &ix).unwrap();
    assert_eq!(decoded.fields, deposit_values());
    assert_eq!(decoded.account("owner"), Some(key(1)));
}

#[test]
fn test_partial_flags_decode_with_every_declared_name() {
    let registry = vault_registry();
    let closed_only: FlagSet = [("closed", true)].into_iter().collect();
    let values = deposit_values().with("state", closed_only);
    let data = registry.encode_by_name("Deposit", &values).unwrap();
    assert_eq!(data[14], 0b10);

    let (variant, decoded) = registry.decode_data(&data).unwrap();
    assert_eq!(decoded, variant.schema().normalize(&values));
    assert!(!decoded.flag("state", "frozen").unwrap());
    assert_eq!(
        decoded.flags("state").unwrap().keys().copied().collect::<Vec<_>>(),
        ["closed", "frozen"]
    );
}

#[test]
fn test_variable_schema_round_trip() {
    let registry = vault_registry();
    let values = FieldValues::new().with("label", "cold storage").with("version", 3u8);
    let data = registry.encode_by_name("Rename", &values).unwrap();
    assert_eq!(data.len(), 4 + 4 + 12 + 1);

    let (variant, decoded) = registry.decode_data(&data).unwrap();
    assert_eq!(variant.name(), "Rename");
    assert_eq!(decoded, values);
}

#[test]
fn test_invalid_utf8_is_reported() {
    let registry = vault_registry();
    let data = [8, 0, 0, 0, 2, 0, 0, 0, 0xff, 0xfe, 1];
    assert_eq!(
        registry.decode_data(&data).unwrap_err(),
        CodecError::InvalidUtf8("label")
    );
}

#[test]
fn test_wrong_program_wins_over_bad_data() {
    let registry = vault_registry();
    let ix = Instruction {
        program_id: key(51),
        accounts: vec![],
        data: vec![0xff, 0xff, 0xff, 0xff],
    };
    assert_eq!(
        registry.decode_instruction(&key(50), &ix).unwrap_err(),
        CodecError::WrongProgram {
            expected: key(50),
            actual: key(51)
        }
    );
}

#[test]
fn test_unknown_discriminant() {
    let registry = vault_registry();
    let ix = Instruction {
        program_id: key(50),
        accounts: vec![],
        data: 99u32.to_le_bytes().to_vec(),
    };
    assert_eq!(
        registry.decode_instruction(&key(50), &ix).unwrap_err(),
        CodecError::UnknownDiscriminant(99)
    );
}

#[test]
fn test_insufficient_keys_before_field_decoding() {
    let registry = vault_registry();
    let ix = Instruction {
        program_id: key(50),
        accounts: vec![AccountMeta::new_readonly(key(1), true)],
        data: 7u32.to_le_bytes().to_vec(),
    };
    assert_eq!(
        registry.decode_instruction(&key(50), &ix).unwrap_err(),
        CodecError::InsufficientKeys {
            name: "Deposit",
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn test_failed_registration_yields_no_registry() {
    let schema = LayoutSchema::compose([FieldSpec::u8("x")]).unwrap();
    let result = InstructionRegistry::builder("Broken")
        .register("A", 1, schema.clone(), &[])
        .and_then(|builder| builder.register("B", 1, schema, &[]))
        .map(|builder| builder.build());
    assert_eq!(result.unwrap_err(), CodecError::DuplicateDiscriminant(1));
}

#[test]
fn test_encode_rejects_wrong_kinds_and_ranges() {
    let registry = vault_registry();
    let wrong_kind = deposit_values().with("amount", "lots");
    assert!(matches!(
        registry.encode_by_name("Deposit", &wrong_kind),
        Err(CodecError::KindMismatch { field: "amount", .. })
    ));

    let too_big = FieldValues::new().with("label", "x").with("version", 300u16);
    assert!(matches!(
        registry.encode_by_name("Rename", &too_big),
        Err(CodecError::OutOfRange { field: "version", value: 300, .. })
    ));

    let short_memo = deposit_values().with("memo", vec![1u8, 2]);
    assert!(matches!(
        registry.encode_by_name("Deposit", &short_memo),
        Err(CodecError::SizeMismatch { field: "memo", expected: 6, actual: 2 })
    ));
}
