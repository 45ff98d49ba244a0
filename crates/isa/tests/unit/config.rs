//! Assembler Configuration Tests.

use pretty_assertions::assert_eq;
use vpuasm_core::AsmConfig;
use vpuasm_core::isa::profile::EncodingProfile;

#[test]
fn defaults_match_the_engine_geometry() {
    let config = AsmConfig::default();
    assert_eq!(config.profile, EncodingProfile::Gen1);
    assert_eq!(config.command_memory_words, 1024);
    assert_eq!(config.commands_per_transfer, 8);
    assert_eq!(config.step_budget, 1 << 20);
}

#[test]
fn empty_json_yields_the_defaults() {
    let config = AsmConfig::from_json("{}").unwrap();
    assert_eq!(config.profile, EncodingProfile::Gen1);
    assert_eq!(config.command_memory_words, 1024);
}

#[test]
fn partial_json_overrides_selected_fields() {
    let config = AsmConfig::from_json(r#"{"profile": "gen2"}"#).unwrap();
    assert_eq!(config.profile, EncodingProfile::Gen2);
    assert_eq!(config.commands_per_transfer, 8);
}

#[test]
fn full_json_roundtrips_every_field() {
    let text = r#"{
        "profile": "gen2",
        "command_memory_words": 2048,
        "commands_per_transfer": 16,
        "step_budget": 500000
    }"#;
    let config = AsmConfig::from_json(text).unwrap();
    assert_eq!(config.profile, EncodingProfile::Gen2);
    assert_eq!(config.command_memory_words, 2048);
    assert_eq!(config.commands_per_transfer, 16);
    assert_eq!(config.step_budget, 500_000);
}

#[test]
fn unknown_profile_name_is_rejected() {
    assert!(AsmConfig::from_json(r#"{"profile": "gen3"}"#).is_err());
}

#[test]
fn invalid_json_is_rejected() {
    assert!(AsmConfig::from_json("not json").is_err());
}
