use std::sync::Arc;

use chrono::NaiveDateTime;
use sql_conduit::prelude::*;
use sql_conduit::test_utils::MemoryFactory;

fn factory() -> ObjectFactory {
    ObjectFactory::new(Arc::new(MemoryFactory::new())).with_type_mapper(Arc::new(DefaultTypeMapper))
}

#[test]
fn type_mapper_infers_tag_when_none_given() {
    let factory = factory();
    let p = factory.create_parameter("id", 5, None, ParamDirection::Input);
    assert_eq!(p.data_type(), Some(SqlDataType::Int));

    let p = factory.create_parameter("name", "alice", None, ParamDirection::Input);
    assert_eq!(p.data_type(), Some(SqlDataType::Text));

    // Explicit tag beats inference.
    let p = factory.create_parameter("flag", 1, Some(SqlDataType::Bool), ParamDirection::Input);
    assert_eq!(p.data_type(), Some(SqlDataType::Bool));
}

#[test]
fn sentinel_timestamps_are_replaced_with_null() {
    let factory = factory();
    let p = factory.create_parameter(
        "stamp",
        SqlValue::Timestamp(NaiveDateTime::MIN),
        None,
        ParamDirection::Input,
    );
    assert!(p.value().is_null());

    let p = factory.create_parameter(
        "stamp",
        SqlValue::Timestamp(NaiveDateTime::MAX),
        None,
        ParamDirection::Input,
    );
    assert!(p.value().is_null());

    let ts = NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    let p = factory.create_parameter("stamp", ts, None, ParamDirection::Input);
    assert_eq!(p.value(), &SqlValue::Timestamp(ts));
}

#[test]
fn variable_size_infers_from_string_length() -> Result<(), SqlConduitError> {
    let factory = factory();
    let p = factory.create_variable_size_parameter(
        "name",
        "bob",
        Some(SqlDataType::Text),
        ParamDirection::Input,
        None,
    )?;
    assert_eq!(p.size(), Some(3));
    Ok(())
}

#[test]
fn variable_size_infers_from_blob_length() -> Result<(), SqlConduitError> {
    let factory = factory();
    let p = factory.create_variable_size_parameter(
        "payload",
        vec![1u8, 2, 3, 4],
        Some(SqlDataType::Blob),
        ParamDirection::Input,
        None,
    )?;
    assert_eq!(p.size(), Some(4));
    Ok(())
}

#[test]
fn output_parameter_without_size_is_rejected() {
    let factory = factory();
    let missing: Option<i64> = None;
    let err = factory
        .create_variable_size_parameter(
            "out1",
            missing,
            Some(SqlDataType::Int),
            ParamDirection::Output,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::InvalidArgument(_)));

    // An explicit size makes the same parameter valid.
    let missing: Option<i64> = None;
    let p = factory
        .create_variable_size_parameter(
            "out1",
            missing,
            Some(SqlDataType::Int),
            ParamDirection::Output,
            Some(8),
        )
        .unwrap();
    assert_eq!(p.size(), Some(8));
    assert!(p.is_output());
}

#[test]
fn command_carries_store_order_timeout_and_transaction_flag() -> Result<(), SqlConduitError> {
    let factory = factory();
    let mut store = ParamCollection::new("@");
    store.add("b", 2)?;
    store.add("a", 1)?;

    let cmd = factory.create_command(
        CommandKind::StoredProcedure,
        "sp_do_things",
        &store,
        Some(std::time::Duration::from_secs(30)),
        true,
    );
    assert_eq!(cmd.kind(), CommandKind::StoredProcedure);
    assert_eq!(cmd.text(), "sp_do_things");
    assert_eq!(cmd.timeout(), Some(std::time::Duration::from_secs(30)));
    assert!(cmd.transactional());
    let names: Vec<&str> = cmd.params.iter().map(SqlParameter::name).collect();
    assert_eq!(names, vec!["@b", "@a"]);
    Ok(())
}

#[test]
fn provider_registry_resolves_case_insensitively() {
    let mem = Arc::new(MemoryFactory::new());
    register_provider("Memory02", mem.clone());

    let resolved = resolve_provider("memory02").expect("provider should resolve");
    assert_eq!(resolved.provider_name(), "memory");

    assert!(matches!(
        resolve_provider("no-such-provider"),
        Err(SqlConduitError::Config(_))
    ));
}

#[test]
fn memory_provider_enumerates_data_sources() {
    let mem = MemoryFactory::new();
    mem.set_data_sources(vec!["mem://a", "mem://b"]);
    assert!(mem.supports_data_source_enumeration());
    assert_eq!(
        mem.enumerate_data_sources().unwrap(),
        vec!["mem://a".to_string(), "mem://b".to_string()]
    );
}
