
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use tracing_subscriber::EnvFilter;
use super::*;
use crate::catalog_client::{CatalogRow, CatalogValue};
use crate::{ConstraintKind, GadgetError, PostgresForeignKey, PostgresTable};

type Responder = Box<dyn Fn(&str, &[&str]) -> Result<Vec<CatalogRow>>>;

/// A catalog client answering from canned rows, recording every query it was asked.
struct FakeCatalog {
    respond: Responder,
    queries: RefCell<Vec<(String, Vec<String>)>>,
}

impl FakeCatalog {
    fn new(respond: impl Fn(&str, &[&str]) -> Result<Vec<CatalogRow>> + 'static) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            respond: Box::new(respond),
            queries: RefCell::new(vec![]),
        }
    }

    fn queries(&self) -> Vec<(String, Vec<String>)> {
        self.queries.borrow().clone()
    }
}

impl CatalogClient for FakeCatalog {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>> {
        self.queries
            .borrow_mut()
            .push((sql.to_string(), params.iter().map(|p| p.to_string()).collect()));
        (self.respond)(sql, params)
    }
}

fn row(values: &[(&str, CatalogValue)]) -> CatalogRow {
    values.iter().cloned().collect()
}

fn text(s: &str) -> CatalogValue {
    CatalogValue::from(s)
}

fn int(i: i64) -> CatalogValue {
    CatalogValue::Int(i)
}

const DROPPED: &str = "........pg.dropped.2........";

/// `(table, oid, position, name, dropped)` for a small shop schema.
///
/// `orders` has a dropped column at position 2, in front of the columns its foreign keys use.
const COLUMNS: &[(&str, i64, i64, &str, bool)] = &[
    ("customers", 100, 1, "id", false),
    ("customers", 100, 2, "name", false),
    ("order_lines", 300, 1, "id", false),
    ("order_lines", 300, 2, "order_id", false),
    ("orders", 200, 1, "id", false),
    ("orders", 200, 2, DROPPED, true),
    ("orders", 200, 3, "customer_id", false),
    ("orders", 200, 4, "billing_customer_id", false),
];

/// `(name, table, columns, referenced table, referenced columns)`.
const FOREIGN_KEYS: &[(&str, &str, &str, &str, &str)] = &[
    ("order_lines_order_id_fkey", "order_lines", "{2}", "orders", "{1}"),
    ("orders_billing_customer_id_fkey", "orders", "{4}", "customers", "{1}"),
    ("orders_customer_id_fkey", "orders", "{3}", "customers", "{1}"),
];

fn table_filter<'p>(params: &[&'p str]) -> Option<&'p str> {
    params.get(1).copied()
}

fn shop_catalog(sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>> {
    let table = table_filter(params);

    if sql.contains("pg_catalog.pg_attribute") {
        let skip_dropped = sql.contains("not a.attisdropped");
        return Ok(COLUMNS
            .iter()
            .filter(|(_, _, _, _, dropped)| !(skip_dropped && *dropped))
            .filter(|(t, ..)| table.map_or(true, |table| table == *t))
            .map(|(t, oid, position, name, _)| {
                row(&[
                    ("oid", int(*oid)),
                    ("table_name", text(t)),
                    ("column_name", text(name)),
                    ("position", int(*position)),
                ])
            })
            .collect());
    }

    if sql.contains("con.contype = 'f'") {
        return Ok(FOREIGN_KEYS
            .iter()
            .filter(|(_, t, ..)| table.map_or(true, |table| table == *t))
            .map(|(name, t, cols, ref_t, ref_cols)| {
                row(&[
                    ("constraint_name", text(name)),
                    ("source_table_name", text(t)),
                    ("source_columns", text(cols)),
                    ("target_table_name", text(ref_t)),
                    ("target_columns", text(ref_cols)),
                ])
            })
            .collect());
    }

    let other_listing = ["pg_catalog.pg_constraint", "pg_catalog.pg_trigger", "pg_catalog.pg_proc", "pg_catalog.pg_type", "relkind = 'S'"];
    if other_listing.iter().any(|marker| sql.contains(marker)) {
        return Ok(vec![]);
    }

    if sql.contains("pg_catalog.pg_class c") {
        return Ok(vec![
            row(&[("oid", int(100)), ("table_name", text("customers"))]),
            row(&[("oid", int(300)), ("table_name", text("order_lines"))]),
            row(&[("oid", int(200)), ("table_name", text("orders"))]),
        ]);
    }

    Ok(vec![])
}

fn shop() -> FakeCatalog {
    FakeCatalog::new(shop_catalog)
}

#[tokio::test]
async fn lists_tables_with_oids() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let tables = reader.list_tables().await.unwrap();

    assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["customers", "order_lines", "orders"]);
    assert_eq!(
        tables["orders"],
        PostgresTable {
            name: "orders".to_string(),
            oid: 200,
            columns: vec![],
        }
    );

    let queries = catalog.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].1, vec!["public"]);
}

#[tokio::test]
async fn lists_columns_without_dropped_ones_by_default() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let tables = reader.list_columns(None, ColumnListOptions::default()).await.unwrap();

    assert_eq!(tables["orders"].columns, vec!["id", "customer_id", "billing_customer_id"]);
    assert_eq!(tables["orders"].oid, 200);
    assert_eq!(tables["customers"].columns, vec!["id", "name"]);
}

#[tokio::test]
async fn lists_dropped_columns_on_request() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let tables = reader
        .list_columns(Some("orders"), ColumnListOptions { include_dropped: true })
        .await
        .unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables["orders"].columns, vec!["id", DROPPED, "customer_id", "billing_customer_id"]);

    let queries = catalog.queries();
    let (sql, params) = &queries[0];
    assert!(!sql.contains("attisdropped"));
    assert!(sql.contains("c.relname = $2"));
    assert_eq!(params, &vec!["public", "orders"]);
}

#[tokio::test]
async fn resolves_foreign_key_columns_past_dropped_columns() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let foreign_keys = reader.list_foreign_keys(None).await.unwrap();

    similar_asserts::assert_eq!(
        foreign_keys["orders"],
        vec![
            PostgresForeignKey {
                name: "orders_billing_customer_id_fkey".to_string(),
                columns: vec!["billing_customer_id".to_string()],
                referenced_table: "customers".to_string(),
                referenced_columns: vec!["id".to_string()],
            },
            PostgresForeignKey {
                name: "orders_customer_id_fkey".to_string(),
                columns: vec!["customer_id".to_string()],
                referenced_table: "customers".to_string(),
                referenced_columns: vec!["id".to_string()],
            },
        ]
    );
    assert_eq!(foreign_keys["order_lines"][0].columns, vec!["order_id"]);
    assert!(!foreign_keys.contains_key("customers"));
}

#[tokio::test]
async fn filters_foreign_keys_by_table() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let foreign_keys = reader.list_foreign_keys(Some("order_lines")).await.unwrap();

    assert_eq!(foreign_keys.keys().collect::<Vec<_>>(), vec!["order_lines"]);
    let queries = catalog.queries();
    let (sql, params) = &queries[0];
    assert!(sql.contains("tab.relname = $2"));
    assert_eq!(params, &vec!["public", "order_lines"]);
}

#[tokio::test]
async fn unresolvable_position_is_an_error() {
    let catalog = FakeCatalog::new(|sql, params| {
        if sql.contains("con.contype = 'f'") {
            Ok(vec![row(&[
                ("constraint_name", text("orders_customer_id_fkey")),
                ("source_table_name", text("orders")),
                ("source_columns", text("{7}")),
                ("target_table_name", text("customers")),
                ("target_columns", text("{1}")),
            ])])
        } else {
            shop_catalog(sql, params)
        }
    });
    let reader = SchemaReader::new(&catalog);

    let err = reader.list_foreign_keys(None).await.unwrap_err();

    assert!(matches!(
        err,
        GadgetError::UnresolvedColumnReference { position: 7, ref table_name, .. } if table_name == "orders"
    ));
}

#[tokio::test]
async fn mismatched_column_counts_are_an_error() {
    let catalog = FakeCatalog::new(|sql, params| {
        if sql.contains("con.contype = 'f'") {
            Ok(vec![row(&[
                ("constraint_name", text("orders_customer_id_fkey")),
                ("source_table_name", text("orders")),
                ("source_columns", text("{3,4}")),
                ("target_table_name", text("customers")),
                ("target_columns", text("{1}")),
            ])])
        } else {
            shop_catalog(sql, params)
        }
    });
    let reader = SchemaReader::new(&catalog);

    let err = reader.list_foreign_keys(None).await.unwrap_err();

    assert!(matches!(err, GadgetError::MismatchedForeignKeyColumns { columns: 2, referenced_columns: 1, .. }));
}

#[tokio::test]
async fn builds_dependencies_from_the_catalog() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let graph = reader.dependencies().await.unwrap();

    assert_eq!(graph.len(), 3);
    assert!(graph["customers"].is_empty());
    assert_eq!(graph["orders"], BTreeSet::from(["customers".to_string()]));
    assert_eq!(graph["order_lines"], BTreeSet::from(["orders".to_string()]));
}

#[tokio::test]
async fn orders_tables_by_dependencies() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let order = reader.tables_in_dependency_order().await.unwrap();

    assert_eq!(order, vec!["customers", "orders", "order_lines"]);
}

#[tokio::test]
async fn renders_the_dependency_graph() {
    let catalog = shop();
    let reader = SchemaReader::new(&catalog);

    let dot = reader.dependency_graph().await.unwrap();

    similar_asserts::assert_eq!(
        dot,
        indoc::indoc! {r#"
            digraph dependencies {
            "customers"
            "order_lines" -> "orders"
            "orders" -> "customers"
            }
        "#}
    );
}

#[tokio::test]
async fn mutual_references_are_a_cycle() {
    let catalog = FakeCatalog::new(|sql, _| {
        if sql.contains("pg_catalog.pg_attribute") {
            Ok(["a", "b"]
                .iter()
                .flat_map(|t| {
                    [
                        row(&[("oid", int(1)), ("table_name", text(t)), ("column_name", text("id")), ("position", int(1))]),
                        row(&[("oid", int(1)), ("table_name", text(t)), ("column_name", text("other_id")), ("position", int(2))]),
                    ]
                })
                .collect())
        } else if sql.contains("con.contype = 'f'") {
            Ok(vec![
                row(&[
                    ("constraint_name", text("a_other_id_fkey")),
                    ("source_table_name", text("a")),
                    ("source_columns", text("{2}")),
                    ("target_table_name", text("b")),
                    ("target_columns", text("{1}")),
                ]),
                row(&[
                    ("constraint_name", text("b_other_id_fkey")),
                    ("source_table_name", text("b")),
                    ("source_columns", text("{2}")),
                    ("target_table_name", text("a")),
                    ("target_columns", text("{1}")),
                ]),
            ])
        } else {
            Ok(vec![
                row(&[("oid", int(1)), ("table_name", text("a"))]),
                row(&[("oid", int(2)), ("table_name", text("b"))]),
            ])
        }
    });
    let reader = SchemaReader::new(&catalog);

    let err = reader.tables_in_dependency_order().await.unwrap_err();

    match err {
        GadgetError::CycleDetected { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
        e => panic!("Expected CycleDetected, got {:?}", e),
    }

    // The graph itself can still be rendered.
    let dot = reader.dependency_graph().await.unwrap();
    assert!(dot.contains(r#""a" -> "b""#));
    assert!(dot.contains(r#""b" -> "a""#));
}

#[tokio::test]
async fn query_failures_are_propagated() {
    let catalog = FakeCatalog::new(|sql, params| {
        if sql.contains("con.contype = 'f'") {
            Err(GadgetError::IoError(std::io::Error::new(ErrorKind::ConnectionReset, "connection reset")))
        } else {
            shop_catalog(sql, params)
        }
    });
    let reader = SchemaReader::new(&catalog);

    assert!(matches!(reader.dependencies().await, Err(GadgetError::IoError(_))));
    assert!(matches!(reader.tables_in_dependency_order().await, Err(GadgetError::IoError(_))));
    assert_eq!(catalog.queries().iter().filter(|(sql, _)| sql.contains("con.contype = 'f'")).count(), 2);
}

#[tokio::test]
async fn malformed_rows_are_query_failures() {
    let catalog = FakeCatalog::new(|_, _| Ok(vec![row(&[("oid", text("not a number")), ("table_name", text("a"))])]));
    let reader = SchemaReader::new(&catalog);

    let err = reader.list_tables().await.unwrap_err();

    assert!(matches!(err, GadgetError::UnexpectedValueType { ref column, .. } if column == "oid"));
}

#[tokio::test]
async fn maps_constraint_kinds() {
    let catalog = FakeCatalog::new(|_, _| {
        Ok([("orders_pkey", "p"), ("orders_customer_id_fkey", "f"), ("orders_total_check", "c"), ("orders_weird", "z")]
            .iter()
            .map(|(name, code)| {
                row(&[
                    ("table_name", text("orders")),
                    ("constraint_name", text(name)),
                    ("constraint_type", text(code)),
                ])
            })
            .collect())
    });
    let reader = SchemaReader::new(&catalog);

    let constraints = reader.list_constraints(None).await.unwrap();

    let kinds: Vec<ConstraintKind> = constraints["orders"].iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ConstraintKind::PrimaryKey,
            ConstraintKind::ForeignKey,
            ConstraintKind::Check,
            ConstraintKind::Unknown('z'),
        ]
    );
    assert_eq!(constraints["orders"][3].kind.to_string(), "*** unknown: \"z\"");
}

#[tokio::test]
async fn multi_character_constraint_code_is_malformed() {
    let catalog = FakeCatalog::new(|_, _| {
        Ok(vec![row(&[
            ("table_name", text("orders")),
            ("constraint_name", text("orders_pkey")),
            ("constraint_type", text("pk")),
        ])])
    });
    let reader = SchemaReader::new(&catalog);

    assert!(matches!(reader.list_constraints(None).await, Err(GadgetError::MalformedValue { .. })));
}

#[tokio::test]
async fn lists_functions_sequences_triggers_and_types() {
    let catalog = FakeCatalog::new(|sql, _| {
        if sql.contains("pg_catalog.pg_trigger") {
            Ok(vec![row(&[
                ("oid", int(16600)),
                ("trigger_name", text("orders_touch")),
                ("table_name", text("orders")),
                ("function_name", text("touch_updated_at")),
            ])])
        } else if sql.contains("pg_catalog.pg_proc") {
            Ok(vec![
                row(&[("oid", int(16500)), ("function_name", text("add_tax")), ("arg_types", text("1700 1700"))]),
                row(&[("oid", int(16501)), ("function_name", text("touch_updated_at")), ("arg_types", text(""))]),
            ])
        } else if sql.contains("pg_catalog.pg_type") {
            Ok(vec![row(&[("oid", int(16400)), ("type_name", text("order_status"))])])
        } else if sql.contains("relkind = 'S'") {
            Ok(vec![row(&[("oid", int(16390)), ("sequence_name", text("orders_id_seq"))])])
        } else {
            Ok(vec![])
        }
    });
    let reader = SchemaReader::new(&catalog);

    let functions = reader.list_functions().await.unwrap();
    assert_eq!(functions["add_tax"].arg_types, vec![1700, 1700]);
    assert!(functions["touch_updated_at"].arg_types.is_empty());

    let triggers = reader.list_triggers(Some("orders")).await.unwrap();
    assert_eq!(triggers["orders"].len(), 1);
    assert_eq!(triggers["orders"][0].name, "orders_touch");
    assert_eq!(triggers["orders"][0].function_name, "touch_updated_at");

    let types = reader.list_types().await.unwrap();
    assert_eq!(types["order_status"].oid, 16400);

    let sequences = reader.list_sequences().await.unwrap();
    assert_eq!(sequences["orders_id_seq"].oid, 16390);

    let trigger_query = catalog
        .queries()
        .into_iter()
        .find(|(sql, _)| sql.contains("pg_catalog.pg_trigger"))
        .unwrap();
    assert_eq!(trigger_query.1, vec!["public", "orders"]);
}

#[tokio::test]
async fn keeps_triggers_sharing_a_name_on_different_tables() {
    let catalog = FakeCatalog::new(|_, _| {
        Ok(["customers", "orders"]
            .iter()
            .enumerate()
            .map(|(idx, table)| {
                row(&[
                    ("oid", int(16600 + idx as i64)),
                    ("trigger_name", text("touch_updated_at")),
                    ("table_name", text(table)),
                    ("function_name", text("touch_updated_at")),
                ])
            })
            .collect())
    });
    let reader = SchemaReader::new(&catalog);

    let triggers = reader.list_triggers(None).await.unwrap();

    assert_eq!(triggers.keys().collect::<Vec<_>>(), vec!["customers", "orders"]);
    assert_eq!(triggers["customers"][0].oid, 16600);
    assert_eq!(triggers["orders"][0].oid, 16601);
    assert!(triggers.values().flatten().all(|t| t.name == "touch_updated_at"));
}

#[tokio::test]
async fn scopes_every_query_to_the_configured_schema() {
    let catalog = shop();
    let reader = SchemaReader::with_options(
        &catalog,
        ReaderOptions {
            schema_name: "accounting".to_string(),
        },
    );

    reader.dependencies().await.unwrap();
    reader.list_constraints(None).await.unwrap();
    reader.list_functions().await.unwrap();
    reader.list_sequences().await.unwrap();
    reader.list_triggers(None).await.unwrap();
    reader.list_types().await.unwrap();

    let queries = catalog.queries();
    assert_eq!(queries.len(), 8);
    assert!(queries.iter().all(|(_, params)| params.first().map(String::as_str) == Some("accounting")));
}
