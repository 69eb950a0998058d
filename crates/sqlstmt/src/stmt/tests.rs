use std::sync::Arc;

use super::*;
use crate::dialect::Capabilities;
use crate::expr::{BoolExpr, SqlExpr};

fn person() -> Arc<Table> {
    Arc::new(
        Table::new("person")
            .with_columns(["id", "name", "age"])
            .with_primary_key(["id"]),
    )
}

fn address() -> Arc<Table> {
    Arc::new(
        Table::new("address")
            .with_columns(["id", "person_id", "city"])
            .with_primary_key(["id"]),
    )
}

fn phone() -> Arc<Table> {
    Arc::new(Table::new("phone").with_columns(["id", "address_id", "number"]))
}

fn stmt(dialect: Capabilities) -> Statement {
    Statement::new(Arc::new(dialect), person()).unwrap()
}

fn join_address(s: &mut Statement) -> TableRef {
    let address = address();
    s.join(
        JoinSpec::inner(address.clone())
            .from_primary(person().primary_key())
            .on(address.mapping(["person_id"])),
    )
    .unwrap()
}

// ==================== Table registry ====================

#[test]
fn primary_table_registered_first() {
    let s = stmt(Capabilities::ansi());
    assert_eq!(s.primary_table().alias(), "A0");
    assert_eq!(s.primary_table().group(), PRIMARY_GROUP);
    assert_eq!(s.number_of_tables(), 1);
    let group = s.table_group(PRIMARY_GROUP).unwrap();
    assert_eq!(group.anchor(), Some(s.primary_table()));
    assert_eq!(group.join_type(), None);
}

#[test]
fn builder_overrides_alias_and_group() {
    let s = Statement::builder(Arc::new(Capabilities::ansi()), person())
        .alias("P")
        .group("people")
        .build()
        .unwrap();
    assert_eq!(s.primary_table().alias(), "P");
    assert!(s.table_group("people").is_some());
    assert!(s.table_group(PRIMARY_GROUP).is_none());
}

#[test]
fn joined_tables_get_group_letters() {
    let mut s = stmt(Capabilities::ansi());
    let b = join_address(&mut s);
    assert_eq!(b.alias(), "B0");
    assert_eq!(b.group(), "Group1");

    let same_group = s
        .join(
            JoinSpec::inner(phone())
                .from("B0", address().primary_key())
                .on(phone().mapping(["address_id"]))
                .group("Group1"),
        )
        .unwrap();
    assert_eq!(same_group.alias(), "B1");

    let in_primary_group = s
        .join(
            JoinSpec::left_outer(address())
                .from_primary(person().primary_key())
                .on(address().mapping(["person_id"]))
                .group(PRIMARY_GROUP),
        )
        .unwrap();
    assert_eq!(in_primary_group.alias(), "A1");

    assert_eq!(s.number_of_tables(), 4);
    assert_eq!(s.number_of_table_groups(), 2);
    assert_eq!(s.table_group("Group1").unwrap().join_type(), Some(JoinType::Inner));
    assert_eq!(s.table_in_group("address", "Group1"), Some(&b));
    assert_eq!(s.table_for("phone").map(TableRef::alias), Some("B1"));
    assert_eq!(s.table("A1"), Some(&in_primary_group));
    assert_eq!(s.join_type_for("A1"), Some(JoinType::LeftOuter));
}

#[test]
fn t_scheme_counts_tables() {
    let options = StatementOptions::default().with_naming_strategy("t-scheme");
    let mut s = Statement::builder(Arc::new(Capabilities::ansi()), person())
        .options(options)
        .build()
        .unwrap();
    assert_eq!(s.primary_table().alias(), "T0");
    assert_eq!(join_address(&mut s).alias(), "T1");
}

#[test]
fn switching_strategy_affects_later_tables() {
    let mut s = stmt(Capabilities::ansi());
    s.set_naming_strategy("t-scheme").unwrap();
    assert_eq!(s.primary_table().alias(), "A0");
    assert_eq!(join_address(&mut s).alias(), "T1");
    assert!(matches!(
        s.set_naming_strategy("bogus"),
        Err(StmtError::UnknownNamingStrategy(_))
    ));
}

#[test]
fn subquery_aliases_are_suffixed() {
    let s = stmt(Capabilities::ansi());
    let sub = s.subquery(address()).build().unwrap();
    assert_eq!(sub.primary_table().alias(), "A0_SUB");
    assert!(sub.is_child_of(&s));
    assert!(!s.is_child_of(&sub));

    let nested = sub.subquery(phone()).build().unwrap();
    assert_eq!(nested.primary_table().alias(), "A0_SUB_SUB");
    assert!(nested.is_child_of(&s));
    assert_eq!(nested.subquery_depth(), 2);
}

// ==================== Join graph ====================

#[test]
fn join_to_registered_alias_is_noop() {
    let mut s = stmt(Capabilities::ansi());
    join_address(&mut s);
    let again = s
        .join(
            JoinSpec::inner(address())
                .alias("B0")
                .from_primary(person().primary_key())
                .on(address().mapping(["person_id"])),
        )
        .unwrap();
    assert_eq!(again.alias(), "B0");
    assert_eq!(s.number_of_joins(), 1);
}

#[test]
fn alias_bound_to_other_table_fails() {
    let mut s = stmt(Capabilities::ansi());
    join_address(&mut s);
    let err = s.join(JoinSpec::inner(phone()).alias("B0")).unwrap_err();
    assert!(matches!(err, StmtError::DuplicateAlias { ref alias, ref table } if alias == "B0" && table == "address"));
}

#[test]
fn unknown_source_alias_fails() {
    let mut s = stmt(Capabilities::ansi());
    let err = s
        .join(
            JoinSpec::inner(phone())
                .from("ZZ", address().primary_key())
                .on(phone().mapping(["address_id"])),
        )
        .unwrap_err();
    assert!(matches!(err, StmtError::UnknownAlias(ref a) if a == "ZZ"));
}

#[test]
fn join_key_arity_must_match() {
    let mut s = stmt(Capabilities::ansi());
    let err = s
        .join(
            JoinSpec::inner(address())
                .from_primary(person().primary_key())
                .on(address().mapping(["person_id", "city"])),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StmtError::JoinArityMismatch { source_arity: 1, target_arity: 2 }
    ));
    assert_eq!(s.number_of_tables(), 1);
}

#[test]
fn right_outer_join_requires_support() {
    let mut legacy = stmt(Capabilities::legacy());
    let err = legacy
        .join(
            JoinSpec::right_outer(address())
                .from_primary(person().primary_key())
                .on(address().mapping(["person_id"])),
        )
        .unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(legacy.number_of_tables(), 1);

    let mut ansi = stmt(Capabilities::ansi());
    ansi.join(
        JoinSpec::right_outer(address())
            .from_primary(person().primary_key())
            .on(address().mapping(["person_id"])),
    )
    .unwrap();
    assert_eq!(
        ansi.select_sql().unwrap(),
        "SELECT * FROM person A0 RIGHT OUTER JOIN address B0 ON A0.id = B0.person_id"
    );
}

#[test]
fn registered_right_outer_join_is_a_no_op() {
    let mut s = stmt(Capabilities::legacy());
    s.cross_join(address(), Some("B0"), None).unwrap();
    let existing = s
        .join(
            JoinSpec::right_outer(address())
                .alias("B0")
                .from_primary(person().primary_key())
                .on(address().mapping(["person_id"])),
        )
        .unwrap();
    assert_eq!(existing.alias(), "B0");
    assert_eq!(s.number_of_joins(), 1);
    assert_eq!(s.join_type_for("B0"), Some(JoinType::Cross));
}

#[test]
fn reorder_places_joins_after_their_source() {
    let mut s = stmt(Capabilities::ansi());
    s.cross_join(address(), Some("X"), None).unwrap();
    s.join(
        JoinSpec::inner(phone())
            .alias("Y")
            .from("X", address().primary_key())
            .on(phone().mapping(["address_id"])),
    )
    .unwrap();
    assert_eq!(s.remove_cross_join("X"), Some("X".to_string()));
    assert!(s.table("X").is_none());

    // Strengthen the speculative cross join into a real one.
    s.join(
        JoinSpec::inner(address())
            .alias("X")
            .from_primary(person().primary_key())
            .on(address().mapping(["person_id"])),
    )
    .unwrap();

    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT * FROM person A0 INNER JOIN address X ON A0.id = X.person_id \
         INNER JOIN phone Y ON X.id = Y.address_id"
    );
    let order: Vec<&str> = s.joins().iter().map(|j| j.target().alias()).collect();
    assert_eq!(order, ["X", "Y"]);
}

#[test]
fn circular_joins_fail_to_render() {
    let mut s = stmt(Capabilities::ansi());
    s.cross_join(address(), Some("X"), None).unwrap();
    s.join(
        JoinSpec::inner(phone())
            .alias("Y")
            .from("X", address().primary_key())
            .on(phone().mapping(["address_id"])),
    )
    .unwrap();
    s.remove_cross_join("X");
    s.join(
        JoinSpec::inner(address())
            .alias("X")
            .from("Y", phone().mapping(["address_id"]))
            .on(address().primary_key()),
    )
    .unwrap();

    let err = s.select_sql().unwrap_err();
    assert!(err.is_circular_joins());
    let message = err.to_string();
    assert!(message.contains("X -> Y"), "{message}");
    assert!(message.contains("Y -> X"), "{message}");
}

#[test]
fn remove_missing_cross_join() {
    let mut s = stmt(Capabilities::ansi());
    join_address(&mut s);
    assert_eq!(s.remove_cross_join("B0"), None);
    assert_eq!(s.remove_cross_join("nope"), None);
    assert_eq!(s.number_of_joins(), 1);
}

#[test]
fn cross_join_rendering_follows_dialect() {
    let render = |dialect: Capabilities| {
        let mut s = stmt(dialect);
        s.cross_join(address(), None, None).unwrap();
        s.select_sql().unwrap()
    };
    assert_eq!(render(Capabilities::ansi()), "SELECT * FROM person A0 CROSS JOIN address B0");
    assert_eq!(
        render(Capabilities::mysql()),
        "SELECT * FROM person A0 INNER JOIN address B0 ON 1=1"
    );
    assert_eq!(render(Capabilities::legacy()), "SELECT * FROM person A0, address B0");
}

#[test]
fn legacy_join_moves_condition_into_where() {
    let mut s = stmt(Capabilities::legacy());
    let b = join_address(&mut s);
    s.where_and(SqlExpr::column(&b, "city").eq_literal("Oslo"), true);
    assert_eq!(s.join_type_for("B0"), Some(JoinType::NonAnsi));
    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT * FROM person A0, address B0 WHERE A0.id = B0.person_id AND B0.city = 'Oslo'"
    );
}

#[test]
fn discriminator_values_restrict_join() {
    let vehicle = Arc::new(
        Table::new("vehicle")
            .with_columns(["id", "owner_id", "kind"])
            .with_discriminator("kind"),
    );
    let mut s = stmt(Capabilities::ansi());
    s.join(
        JoinSpec::inner(vehicle.clone())
            .from_primary(person().primary_key())
            .on(vehicle.mapping(["owner_id"]))
            .discriminators(["car", "bike"]),
    )
    .unwrap();
    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT * FROM person A0 INNER JOIN vehicle B0 \
         ON A0.id = B0.owner_id AND (B0.kind = 'car' OR B0.kind = 'bike')"
    );
}

// ==================== Select list ====================

#[test]
fn same_item_selected_once() {
    let mut s = stmt(Capabilities::ansi());
    let p = s.primary_table().clone();
    let name = SqlExpr::column(&p, "name");
    assert_eq!(s.select(&name, Some("n"), true).unwrap(), vec![1]);
    assert_eq!(s.select(&name, Some("n"), true).unwrap(), vec![1]);
    assert_eq!(s.select(&name, Some("other"), true).unwrap(), vec![1]);
    assert_eq!(s.number_of_selects(), 1);
    assert_eq!(s.select_sql().unwrap(), "SELECT A0.name AS n FROM person A0");
}

#[test]
fn multi_column_aliases() {
    let mut s = stmt(Capabilities::ansi());
    let p = s.primary_table().clone();
    let both = person().mapping(["name", "age"]);
    assert_eq!(s.select_mapping(None, &both, Some("m"), true).unwrap(), vec![1, 2]);
    let expr = SqlExpr::mapping(&p, &person().mapping(["id", "age"]));
    assert_eq!(s.select(&expr, Some("e"), true).unwrap(), vec![3, 2]);
    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT A0.name AS m_0, A0.age AS m_1, A0.id AS e0 FROM person A0"
    );
}

#[test]
fn single_column_mapping_keeps_alias() {
    let mut s = stmt(Capabilities::ansi());
    let pos = s
        .select_column(None, &person().column("name"), Some("n"), true)
        .unwrap();
    assert_eq!(pos, 1);
    assert_eq!(s.selected_items()[0].alias(), Some("n"));
    assert!(s.selected_items()[0].is_primary());
}

#[test]
fn mapping_must_belong_to_table() {
    let mut s = stmt(Capabilities::ansi());
    let err = s
        .select_mapping(None, &address().mapping(["city"]), None, true)
        .unwrap_err();
    assert!(err.is_table_mismatch());

    let b = join_address(&mut s);
    let err = s
        .select_column(Some(&b), &person().column("name"), None, true)
        .unwrap_err();
    assert!(matches!(err, StmtError::TableMismatch { ref given, ref owner } if given == "address" && owner == "person"));
}

#[test]
fn empty_arguments_fail() {
    let mut s = stmt(Capabilities::ansi());
    assert!(matches!(
        s.select(&SqlExpr::raw(""), None, true),
        Err(StmtError::MissingArgument("expression"))
    ));
    assert!(matches!(
        s.select_mapping(None, &person().mapping(Vec::<String>::new()), None, true),
        Err(StmtError::MissingArgument("mapping"))
    ));
}

#[test]
fn aggregates_are_not_primary() {
    let mut s = stmt(Capabilities::ansi());
    let p = s.primary_table().clone();
    s.select(&SqlExpr::aggregate("MAX", &SqlExpr::column(&p, "age")), None, true)
        .unwrap();
    s.select(&SqlExpr::literal(1), None, true).unwrap();
    assert!(s.is_aggregated());
    assert!(s.selected_items().iter().all(|i| !i.is_primary()));
}

// ==================== Cache ====================

#[test]
fn render_is_cached_until_mutation() {
    let mut s = stmt(Capabilities::postgresql());
    let p = s.primary_table().clone();
    s.select_column(None, &person().column("id"), None, true).unwrap();
    let first = s.select_sql().unwrap();
    assert_eq!(s.select_sql().unwrap(), first);

    s.where_and(SqlExpr::column(&p, "age").compare(">", 30), true);
    let second = s.select_sql().unwrap();
    assert_ne!(second, first);
    assert_eq!(second, "SELECT A0.id FROM person A0 WHERE A0.age > 30");

    s.set_distinct(true);
    assert_eq!(s.select_sql().unwrap(), "SELECT DISTINCT A0.id FROM person A0 WHERE A0.age > 30");
}

#[test]
fn true_literal_is_not_added_to_where() {
    let mut s = stmt(Capabilities::ansi());
    s.where_and(BoolExpr::True, true);
    assert!(s.where_clause().is_none());
    s.where_or(BoolExpr::raw("A0.age IS NULL"), true);
    s.where_or(BoolExpr::raw("A0.age > 3"), true);
    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT * FROM person A0 WHERE A0.age IS NULL OR A0.age > 3"
    );
}

// ==================== Unions ====================

#[test]
fn union_replays_selects_and_filters() {
    let dialect = Arc::new(Capabilities::postgresql());
    let mut parent = Statement::new(dialect.clone(), person()).unwrap();
    let child = Statement::new(dialect, person()).unwrap();
    parent.union(child).unwrap();

    let p = parent.primary_table().clone();
    assert_eq!(parent.select(&SqlExpr::column(&p, "name"), Some("x"), true).unwrap(), vec![1]);
    parent.where_and(SqlExpr::column(&p, "age").compare("<", 18), true);
    parent.where_and(BoolExpr::raw("A0.id > 0"), false);

    let child = &parent.unions()[0];
    assert_eq!(child.selected_items(), parent.selected_items());
    assert_eq!(child.where_clause().map(BoolExpr::to_sql).as_deref(), Some("A0.age < 18"));

    assert_eq!(
        parent.select_sql().unwrap(),
        "SELECT A0.name AS x FROM person A0 WHERE A0.age < 18 AND A0.id > 0 \
         UNION ALL SELECT A0.name AS x FROM person A0 WHERE A0.age < 18"
    );
}

#[test]
fn union_counts_are_recursive() {
    let dialect = Arc::new(Capabilities::ansi());
    let mut top = Statement::new(dialect.clone(), person()).unwrap();
    let mut mid = Statement::new(dialect.clone(), person()).unwrap();
    mid.union(Statement::new(dialect.clone(), address()).unwrap()).unwrap();
    top.union(mid).unwrap();
    top.union(Statement::new(dialect, person()).unwrap()).unwrap();

    assert_eq!(top.number_of_unions(), 3);
    assert!(top.all_unions_for_same_primary_table());
    assert!(!top.unions()[0].all_unions_for_same_primary_table());
}

#[test]
fn union_needs_dialect_support() {
    let dialect = Capabilities {
        union_syntax: false,
        ..Capabilities::ansi()
    };
    let mut s = stmt(dialect.clone());
    let other = stmt(dialect);
    assert!(s.union(other).unwrap_err().is_unsupported());
}

#[test]
fn union_keyword_follows_dialect() {
    let mut s = stmt(Capabilities::legacy());
    s.union(stmt(Capabilities::legacy())).unwrap();
    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT * FROM person A0 UNION SELECT * FROM person A0"
    );
}

#[test]
fn grouping_and_joins_reach_every_branch() {
    let mut s = stmt(Capabilities::ansi());
    s.union(stmt(Capabilities::ansi())).unwrap();
    let p = s.primary_table().clone();
    join_address(&mut s);
    s.cross_join(phone(), Some("Z"), None).unwrap();
    s.add_grouping_expression(SqlExpr::column(&p, "age"));
    s.set_having(BoolExpr::raw("COUNT(*) > 1"));

    let branch = &s.unions()[0];
    assert_eq!(branch.number_of_joins(), 2);
    assert_eq!(branch.grouping_expressions().len(), 1);
    assert!(branch.having().is_some());
    assert!(branch.is_aggregated());

    assert_eq!(s.remove_cross_join("Z"), Some("Z".to_string()));
    assert_eq!(s.unions()[0].number_of_joins(), 1);
}

#[test]
fn branches_reuse_parent_join_aliases() {
    let mut s = stmt(Capabilities::ansi());
    s.union(stmt(Capabilities::ansi())).unwrap();
    let local = s
        .join(
            JoinSpec::inner(phone())
                .from_primary(person().primary_key())
                .on(phone().mapping(["id"]))
                .local_only(),
        )
        .unwrap();
    assert_eq!(local.alias(), "B0");
    let c = join_address(&mut s);
    assert_eq!((c.alias(), c.group()), ("C0", "Group2"));

    s.select_column(Some(&c), &address().column("city"), None, true)
        .unwrap();
    assert_eq!(
        s.select_sql().unwrap(),
        "SELECT C0.city FROM person A0 INNER JOIN phone B0 ON A0.id = B0.id \
         INNER JOIN address C0 ON A0.id = C0.person_id \
         UNION ALL SELECT C0.city FROM person A0 INNER JOIN address C0 ON A0.id = C0.person_id"
    );

    let branch = &mut s.unions_mut()[0];
    assert_eq!(branch.table("C0").map(TableRef::group), Some("Group2"));
    assert!(branch.table("B0").is_none());
    let z = branch.cross_join(phone(), Some("Z"), None).unwrap();
    assert_eq!(z.group(), "Group3");
}

#[test]
fn editing_a_branch_clears_parent_cache() {
    let mut s = stmt(Capabilities::ansi());
    s.union(stmt(Capabilities::ansi())).unwrap();
    let before = s.select_sql().unwrap();
    s.unions_mut()[0].set_distinct(true);
    let after = s.select_sql().unwrap();
    assert_ne!(before, after);
    assert!(after.ends_with("UNION ALL SELECT DISTINCT * FROM person A0"));
}
