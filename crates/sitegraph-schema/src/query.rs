//! Standard node query resolvers.
//!
//! `findOne` and `findManyPaginated` are the resolver bodies the enricher
//! attaches to every node type: materialized filter evaluation over the
//! store's per-type node list, multi-key sort, skip/limit pagination and
//! envelope assembly. Executing the surrounding GraphQL document is the
//! runtime's job, not ours.

use std::cmp::Ordering;
use std::sync::Arc;

use async_graphql::{Name, Value};
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use tracing::trace;

use crate::resolve::{Next, Resolve, ResolveResult, ResolverContext, json_to_graphql_value};

/// Resolves to the first node of a type matching the `filter` argument.
pub struct FindOne {
    type_name: String,
}

impl FindOne {
    pub fn new(type_name: impl Into<String>) -> Arc<dyn Resolve> {
        Arc::new(Self {
            type_name: type_name.into(),
        })
    }
}

impl Resolve for FindOne {
    fn resolve<'a>(&'a self, ctx: &'a ResolverContext, _next: Next<'a>) -> BoxFuture<'a, ResolveResult> {
        Box::pin(async move {
            let nodes = ctx.store.get_nodes_by_type(&self.type_name).await;
            trace!(type_name = %self.type_name, candidates = nodes.len(), "findOne");
            let filter = ctx.arg("filter");
            let found = nodes
                .into_iter()
                .map(|node| json_to_graphql_value(node.to_value()))
                .find(|value| filter.is_none_or(|f| matches_filter(value, f)));
            Ok(found)
        })
    }
}

/// Resolves to a pagination envelope over all nodes of a type, after
/// filtering and sorting.
pub struct FindManyPaginated {
    type_name: String,
}

impl FindManyPaginated {
    pub fn new(type_name: impl Into<String>) -> Arc<dyn Resolve> {
        Arc::new(Self {
            type_name: type_name.into(),
        })
    }
}

impl Resolve for FindManyPaginated {
    fn resolve<'a>(&'a self, ctx: &'a ResolverContext, _next: Next<'a>) -> BoxFuture<'a, ResolveResult> {
        Box::pin(async move {
            let nodes = ctx.store.get_nodes_by_type(&self.type_name).await;
            let mut values: Vec<Value> = nodes
                .into_iter()
                .map(|node| json_to_graphql_value(node.to_value()))
                .collect();

            if let Some(filter) = ctx.arg("filter") {
                values.retain(|value| matches_filter(value, filter));
            }
            if let Some(sort) = ctx.arg("sort") {
                apply_sort(&mut values, sort);
            }

            let total = values.len();
            let skip = usize_arg(ctx, "skip").unwrap_or(0);
            let limit = usize_arg(ctx, "limit");
            trace!(type_name = %self.type_name, total, skip, ?limit, "findManyPaginated");

            let page: Vec<Value> = match limit {
                Some(limit) => values.into_iter().skip(skip).take(limit).collect(),
                None => values.into_iter().skip(skip).collect(),
            };
            Ok(Some(envelope(total, page, skip, limit)))
        })
    }
}

fn usize_arg(ctx: &ResolverContext, name: &str) -> Option<usize> {
    match ctx.arg(name) {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        _ => None,
    }
}

/// Assembles the `{Type}Connection` envelope.
fn envelope(total: usize, items: Vec<Value>, skip: usize, limit: Option<usize>) -> Value {
    let item_count = items.len();
    let page_count = match limit {
        Some(limit) if limit > 0 => total.div_ceil(limit).max(1),
        _ => 1,
    };
    let current_page = match limit {
        Some(limit) if limit > 0 => skip / limit + 1,
        _ => 1,
    };

    let mut page_info: IndexMap<Name, Value> = IndexMap::new();
    page_info.insert(Name::new("currentPage"), number(current_page));
    page_info.insert(
        Name::new("hasNextPage"),
        Value::Boolean(skip + item_count < total),
    );
    page_info.insert(Name::new("hasPreviousPage"), Value::Boolean(skip > 0));
    page_info.insert(Name::new("itemCount"), number(item_count));
    page_info.insert(Name::new("pageCount"), number(page_count));
    page_info.insert(
        Name::new("perPage"),
        limit.map_or(Value::Null, number),
    );

    let mut out: IndexMap<Name, Value> = IndexMap::new();
    out.insert(Name::new("totalCount"), number(total));
    out.insert(Name::new("nodes"), Value::List(items));
    out.insert(Name::new("pageInfo"), Value::Object(page_info));
    Value::Object(out)
}

fn number(n: usize) -> Value {
    Value::Number((n as u64).into())
}

/// Evaluates a filter object (`field -> operator -> expected`) against a
/// node value. Every listed operator must hold.
pub(crate) fn matches_filter(value: &Value, filter: &Value) -> bool {
    let (Value::Object(fields), Value::Object(filter)) = (value, filter) else {
        return false;
    };
    filter.iter().all(|(field_name, operators)| {
        let Value::Object(operators) = operators else {
            return true;
        };
        let actual = fields.get(field_name.as_str()).unwrap_or(&Value::Null);
        operators
            .iter()
            .all(|(op, expected)| matches_operator(op.as_str(), expected, actual))
    })
}

fn matches_operator(op: &str, expected: &Value, actual: &Value) -> bool {
    match op {
        "eq" => actual == expected,
        "ne" => actual != expected,
        "in" => match expected {
            Value::List(items) => items.contains(actual),
            _ => false,
        },
        "nin" => match expected {
            Value::List(items) => !items.contains(actual),
            _ => false,
        },
        "lt" => compare_values(actual, expected) == Some(Ordering::Less),
        "lte" => matches!(
            compare_values(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "gt" => compare_values(actual, expected) == Some(Ordering::Greater),
        "gte" => matches!(
            compare_values(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        _ => false,
    }
}

/// Orders two scalar values. Incomparable pairs (mixed kinds, nulls,
/// non-finite numbers) yield `None` and never match a range operator.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64()?, b.as_f64()?);
            a.partial_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sorts values by the `fields` list of a sort input, all keys sharing the
/// input's single `order`. Stable, so equal keys keep store order.
fn apply_sort(values: &mut [Value], sort: &Value) {
    let Value::Object(sort) = sort else {
        return;
    };
    let fields: Vec<String> = match sort.get("fields") {
        Some(Value::List(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => return,
    };
    let descending = matches!(
        sort.get("order"),
        Some(Value::Enum(order)) if order.as_str() == "DESC"
    ) || matches!(
        sort.get("order"),
        Some(Value::String(order)) if order == "DESC"
    );

    values.sort_by(|a, b| {
        for field in &fields {
            let left = field_of(a, field);
            let right = field_of(b, field);
            let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
            if ordering != Ordering::Equal {
                return if descending { ordering.reverse() } else { ordering };
            }
        }
        Ordering::Equal
    });
}

fn field_of<'a>(value: &'a Value, field: &str) -> &'a Value {
    match value {
        Value::Object(obj) => obj.get(field).unwrap_or(&Value::Null),
        _ => &Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitegraph_core::{InMemoryNodeStore, Node, QueryPath};

    fn people_store() -> Arc<InMemoryNodeStore> {
        Arc::new(InMemoryNodeStore::with_nodes([
            Node::new("p1", "Person")
                .with_field("name", json!("Ada"))
                .with_field("age", json!(36)),
            Node::new("p2", "Person")
                .with_field("name", json!("Grace"))
                .with_field("age", json!(45)),
            Node::new("p3", "Person")
                .with_field("name", json!("Alan"))
                .with_field("age", json!(41)),
        ]))
    }

    fn ctx(args: serde_json::Value) -> ResolverContext {
        let args = match json_to_graphql_value(args) {
            Value::Object(obj) => obj.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            _ => IndexMap::new(),
        };
        ResolverContext {
            parent: Value::Null,
            args,
            store: people_store(),
            path: QueryPath::root(),
            field_name: "test".to_string(),
        }
    }

    async fn run(step: Arc<dyn Resolve>, args: serde_json::Value) -> Option<Value> {
        let ctx = ctx(args);
        let chain = crate::resolve::ResolverChain::of(step);
        chain.resolve(&ctx).await.unwrap()
    }

    fn names(envelope: &Value) -> Vec<String> {
        let Value::Object(obj) = envelope else {
            panic!("expected envelope");
        };
        let Some(Value::List(nodes)) = obj.get("nodes") else {
            panic!("expected nodes list");
        };
        nodes
            .iter()
            .map(|node| match field_of(node, "name") {
                Value::String(name) => name.clone(),
                other => panic!("unexpected name: {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_find_one_with_filter() {
        let value = run(FindOne::new("Person"), json!({ "filter": { "name": { "eq": "Grace" } } }))
            .await
            .unwrap();
        assert_eq!(field_of(&value, "age"), &Value::Number(45.into()));

        let missing = run(FindOne::new("Person"), json!({ "filter": { "name": { "eq": "Linus" } } })).await;
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_find_one_without_filter_takes_first() {
        let value = run(FindOne::new("Person"), json!({})).await.unwrap();
        assert_eq!(field_of(&value, "name"), &Value::String("Ada".to_string()));
    }

    #[tokio::test]
    async fn test_find_many_filter_operators() {
        let value = run(
            FindManyPaginated::new("Person"),
            json!({ "filter": { "age": { "gte": 41, "ne": 45 } } }),
        )
        .await
        .unwrap();
        assert_eq!(names(&value), vec!["Alan"]);

        let value = run(
            FindManyPaginated::new("Person"),
            json!({ "filter": { "name": { "in": ["Ada", "Grace"] } } }),
        )
        .await
        .unwrap();
        assert_eq!(names(&value), vec!["Ada", "Grace"]);
    }

    #[tokio::test]
    async fn test_find_many_sort_and_pagination() {
        let value = run(
            FindManyPaginated::new("Person"),
            json!({
                "sort": { "fields": ["age"], "order": "DESC" },
                "skip": 1,
                "limit": 1
            }),
        )
        .await
        .unwrap();

        assert_eq!(names(&value), vec!["Alan"]);
        let Value::Object(obj) = &value else {
            panic!("expected envelope");
        };
        assert_eq!(obj.get("totalCount"), Some(&Value::Number(3.into())));
        let Some(Value::Object(page_info)) = obj.get("pageInfo") else {
            panic!("expected pageInfo");
        };
        assert_eq!(page_info.get("currentPage"), Some(&Value::Number(2.into())));
        assert_eq!(page_info.get("pageCount"), Some(&Value::Number(3.into())));
        assert_eq!(page_info.get("hasNextPage"), Some(&Value::Boolean(true)));
        assert_eq!(page_info.get("hasPreviousPage"), Some(&Value::Boolean(true)));
        assert_eq!(page_info.get("perPage"), Some(&Value::Number(1.into())));
    }

    #[tokio::test]
    async fn test_find_many_no_args_returns_all() {
        let value = run(FindManyPaginated::new("Person"), json!({})).await.unwrap();
        assert_eq!(names(&value).len(), 3);
        let Value::Object(obj) = &value else {
            panic!("expected envelope");
        };
        let Some(Value::Object(page_info)) = obj.get("pageInfo") else {
            panic!("expected pageInfo");
        };
        assert_eq!(page_info.get("hasNextPage"), Some(&Value::Boolean(false)));
        assert_eq!(page_info.get("perPage"), Some(&Value::Null));
    }

    #[test]
    fn test_incomparable_values_never_match_ranges() {
        assert!(!matches_operator("lt", &Value::Number(3.into()), &Value::Null));
        assert!(!matches_operator(
            "gt",
            &Value::String("a".to_string()),
            &Value::Number(1.into())
        ));
    }
}
