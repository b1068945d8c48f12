use std::str::FromStr;
use std::sync::Arc;

use sql_conduit::prelude::*;

#[derive(Debug, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
    email: Option<String>,
    score: f64,
    active: bool,
}

impl FromRow for User {
    fn row_mapping() -> RowMapping<Self> {
        RowMapping::new()
            .bind("user_id", |u: &mut User, v: i64| u.id = v)
            .bind("name", |u: &mut User, v: String| u.name = v)
            .bind("email", |u: &mut User, v: Option<String>| u.email = v)
            .bind_or("score", 1.5, |u: &mut User, v: f64| u.score = v)
            .bind("active", |u: &mut User, v: bool| u.active = v)
    }
}

#[derive(Debug, PartialEq, Default)]
enum Color {
    #[default]
    Red,
    Green,
}

impl FromStr for Color {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Tagged {
    color: Color,
}

impl FromRow for Tagged {
    fn row_mapping() -> RowMapping<Self> {
        RowMapping::new().bind_enum("color", |t: &mut Tagged, v: Color| t.color = v)
    }
}

fn row(columns: Vec<&str>, values: Vec<SqlValue>) -> DynamicRow {
    DynamicRow::new(
        Arc::new(columns.into_iter().map(str::to_owned).collect()),
        values,
    )
}

#[test]
fn project_maps_bound_columns() -> Result<(), SqlConduitError> {
    let row = row(
        vec!["user_id", "name", "email", "score", "active"],
        vec![
            SqlValue::Int(7),
            SqlValue::Text("alice".into()),
            SqlValue::Text("a@example.com".into()),
            SqlValue::Float(9.5),
            SqlValue::Int(1),
        ],
    );
    let user: User = project(&row)?;
    assert_eq!(
        user,
        User {
            id: 7,
            name: "alice".into(),
            email: Some("a@example.com".into()),
            score: 9.5,
            active: true,
        }
    );
    Ok(())
}

#[test]
fn column_lookup_is_case_insensitive() -> Result<(), SqlConduitError> {
    let row = row(
        vec!["USER_ID", "Name"],
        vec![SqlValue::Int(3), SqlValue::Text("bea".into())],
    );
    let user: User = project(&row)?;
    assert_eq!(user.id, 3);
    assert_eq!(user.name, "bea");
    Ok(())
}

#[test]
fn null_without_default_keeps_zero_value() -> Result<(), SqlConduitError> {
    let row = row(
        vec!["user_id", "name", "email"],
        vec![SqlValue::Int(1), SqlValue::Null, SqlValue::Null],
    );
    let user: User = project(&row)?;
    assert_eq!(user.name, ""); // zero-value, untouched
    assert_eq!(user.email, None); // nullable target gets an explicit None
    Ok(())
}

#[test]
fn null_with_default_substitutes_before_coercion() -> Result<(), SqlConduitError> {
    let r = row(vec!["user_id", "score"], vec![SqlValue::Int(1), SqlValue::Null]);
    let user: User = project(&r)?;
    assert_eq!(user.score, 1.5);

    // A present value wins over the default.
    let r = row(
        vec!["user_id", "score"],
        vec![SqlValue::Int(1), SqlValue::Float(3.25)],
    );
    let user: User = project(&r)?;
    assert_eq!(user.score, 3.25);
    Ok(())
}

#[test]
fn absent_columns_leave_targets_untouched() -> Result<(), SqlConduitError> {
    let row = row(vec!["unrelated"], vec![SqlValue::Int(99)]);
    let user: User = project(&row)?;
    assert_eq!(user, User::default());
    Ok(())
}

#[test]
fn override_name_reads_only_the_overridden_column() -> Result<(), SqlConduitError> {
    // Both the natural field name and the overridden source name are
    // present; the binding must read the override.
    #[derive(Debug, Default)]
    struct Renamed {
        name: String,
    }
    impl FromRow for Renamed {
        fn row_mapping() -> RowMapping<Self> {
            RowMapping::new().bind("display_name", |r: &mut Renamed, v: String| r.name = v)
        }
    }

    let row = row(
        vec!["name", "display_name"],
        vec![
            SqlValue::Text("wrong".into()),
            SqlValue::Text("right".into()),
        ],
    );
    let mapped: Renamed = project(&row)?;
    assert_eq!(mapped.name, "right");
    Ok(())
}

#[test]
fn ignored_bindings_never_assign() -> Result<(), SqlConduitError> {
    let mapping = RowMapping::new()
        .bind("user_id", |u: &mut User, v: i64| u.id = v)
        .bind("name", |u: &mut User, v: String| u.name = v)
        .ignore("name");
    let row = row(
        vec!["user_id", "name"],
        vec![SqlValue::Int(1), SqlValue::Text("skipped".into())],
    );
    let user: User = project_with(&row, &mapping)?;
    assert_eq!(user.id, 1);
    assert_eq!(user.name, "");
    Ok(())
}

#[test]
fn enums_parse_from_textual_form() -> Result<(), SqlConduitError> {
    let r = row(vec!["color"], vec![SqlValue::Text("green".into())]);
    let tagged: Tagged = project(&r)?;
    assert_eq!(tagged.color, Color::Green);

    let r = row(vec!["color"], vec![SqlValue::Text("purple".into())]);
    let err = project::<Tagged>(&r).unwrap_err();
    assert!(matches!(err, SqlConduitError::TypeConversion(_)));
    Ok(())
}

#[test]
fn impossible_coercion_is_a_type_conversion_error() {
    let row = row(vec!["user_id"], vec![SqlValue::Text("not-a-number".into())]);
    let err = project::<User>(&row).unwrap_err();
    match err {
        SqlConduitError::TypeConversion(msg) => assert!(msg.contains("user_id")),
        other => panic!("expected TypeConversion, got {other:?}"),
    }
}

#[test]
fn numeric_widening_and_text_parsing_are_best_effort() -> Result<(), SqlConduitError> {
    let row = row(
        vec!["user_id", "score"],
        vec![SqlValue::Text("12".into()), SqlValue::Int(4)],
    );
    let user: User = project(&row)?;
    assert_eq!(user.id, 12);
    assert_eq!(user.score, 4.0);
    Ok(())
}

#[test]
fn project_list_preserves_order_and_empty_is_empty() -> Result<(), SqlConduitError> {
    let mut set = ResultSet::default();
    set.set_column_names(Arc::new(vec!["user_id".into(), "name".into()]));
    set.add_row_values(vec![SqlValue::Int(1), SqlValue::Text("a".into())]);
    set.add_row_values(vec![SqlValue::Int(2), SqlValue::Text("b".into())]);

    let users: Vec<User> = project_list(&set)?;
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, 1);
    assert_eq!(users[1].id, 2);

    let empty = ResultSet::default();
    let users: Vec<User> = project_list(&empty)?;
    assert!(users.is_empty());
    Ok(())
}

#[test]
fn project_single_returns_zero_value_for_no_rows() -> Result<(), SqlConduitError> {
    let empty = ResultSet::default();
    let user: User = project_single(&empty)?;
    assert_eq!(user, User::default());

    let mut set = ResultSet::default();
    set.set_column_names(Arc::new(vec!["user_id".into()]));
    set.add_row_values(vec![SqlValue::Int(5)]);
    set.add_row_values(vec![SqlValue::Int(6)]);
    let user: User = project_single(&set)?;
    assert_eq!(user.id, 5); // first row only
    Ok(())
}
