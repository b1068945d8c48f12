use sql_conduit::prelude::*;

#[test]
fn add_then_get_returns_binder_qualified_parameter() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("id", 5)?;

    let fetched = params.get("id")?.expect("parameter should exist");
    assert_eq!(fetched.name(), "@id");
    assert_eq!(fetched.value(), &SqlValue::Int(5));

    // Already-prefixed lookups and inserts resolve to the same entry.
    assert!(params.contains("@id")?);
    assert!(params.contains("ID")?);
    Ok(())
}

#[test]
fn alternate_binders_qualify_names() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new(":");
    params.add("user_name", "bob")?;
    assert_eq!(params.get_at(0)?.name(), ":user_name");
    Ok(())
}

#[test]
fn none_value_becomes_database_null() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    let missing: Option<i64> = None;
    params.add("maybe", missing)?;
    assert!(params.get("maybe")?.unwrap().value().is_null());
    Ok(())
}

#[test]
fn duplicate_name_fails_and_count_is_unchanged() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("id", 1)?;

    let err = params.add("@ID", 2).unwrap_err();
    assert!(matches!(err, SqlConduitError::DuplicateParameter(_)));
    assert_eq!(params.len(), 1);
    assert_eq!(params.get("id")?.unwrap().value(), &SqlValue::Int(1));
    Ok(())
}

#[test]
fn add_range_is_all_or_nothing() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("existing", 1)?;

    // Collision with the store.
    let err = params
        .add_range(vec![
            SqlParameter::new("fresh", 2),
            SqlParameter::new("existing", 3),
        ])
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::DuplicateParameter(name) if name == "@existing"));
    assert_eq!(params.len(), 1);
    assert!(!params.contains("fresh")?);

    // Collision between siblings in the incoming batch.
    let err = params
        .add_range(vec![
            SqlParameter::new("a", 1),
            SqlParameter::new("b", 2),
            SqlParameter::new("A", 3),
        ])
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::DuplicateParameter(_)));
    assert_eq!(params.len(), 1);
    Ok(())
}

#[test]
fn add_values_accepts_name_value_pairs() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add_values(vec![
        ("id".to_string(), SqlValue::Int(1)),
        ("name".to_string(), SqlValue::Text("alice".into())),
    ])?;
    assert_eq!(params.len(), 2);
    assert_eq!(params.get_at(1)?.name(), "@name");
    Ok(())
}

#[test]
fn remove_by_name_is_noop_when_absent() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("id", 1)?;
    assert!(!params.remove("other")?);
    assert!(params.remove("id")?);
    assert!(params.is_empty());
    Ok(())
}

#[test]
fn index_accessors_fail_out_of_range() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("id", 1)?;

    assert!(matches!(
        params.get_at(5),
        Err(SqlConduitError::IndexOutOfRange(_))
    ));
    assert!(matches!(
        params.remove_at(1),
        Err(SqlConduitError::IndexOutOfRange(_))
    ));
    assert!(matches!(
        params.set_value_at(3, 9),
        Err(SqlConduitError::IndexOutOfRange(_))
    ));
    Ok(())
}

#[test]
fn empty_name_is_invalid_argument() {
    let params = ParamCollection::new("@");
    assert!(matches!(
        params.get(""),
        Err(SqlConduitError::InvalidArgument(_))
    ));
    assert!(matches!(
        params.get("   "),
        Err(SqlConduitError::InvalidArgument(_))
    ));
    assert!(matches!(
        params.contains(""),
        Err(SqlConduitError::InvalidArgument(_))
    ));
}

#[test]
fn replace_missing_name_fails_fast() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("id", 1)?;

    let err = params
        .replace("ghost", SqlParameter::new("ghost", 2))
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::IndexOutOfRange(_)));

    params.replace("id", SqlParameter::new("id", 42))?;
    assert_eq!(params.get("id")?.unwrap().value(), &SqlValue::Int(42));

    // A replacement may not collide with a different existing entry.
    params.add("other", 9)?;
    let err = params
        .replace("id", SqlParameter::new("other", 1))
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::DuplicateParameter(_)));
    Ok(())
}

#[test]
fn set_value_updates_in_place() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("id", 1)?;
    params.set_value("id", 2)?;
    assert_eq!(params.get("id")?.unwrap().value(), &SqlValue::Int(2));

    params.set_value_at(0, "three")?;
    assert_eq!(
        params.get_at(0)?.value(),
        &SqlValue::Text("three".to_string())
    );

    let err = params.set_value("ghost", 4).unwrap_err();
    assert!(matches!(err, SqlConduitError::IndexOutOfRange(_)));
    Ok(())
}

#[test]
fn clear_is_idempotent() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("a", 1)?;
    params.add("b", 2)?;
    params.clear();
    assert!(params.is_empty());
    params.clear();
    assert!(params.is_empty());
    Ok(())
}

#[test]
fn insertion_order_is_preserved() -> Result<(), SqlConduitError> {
    let mut params = ParamCollection::new("@");
    params.add("z", 1)?;
    params.add("a", 2)?;
    params.add("m", 3)?;
    let names: Vec<&str> = params.iter().map(SqlParameter::name).collect();
    assert_eq!(names, vec!["@z", "@a", "@m"]);
    Ok(())
}
