//! Node-type enrichment.
//!
//! Every object type implementing `Node` is enriched in place: identity
//! fields injected, generated inputs re-synthesized, the standard `findOne`
//! and `findManyPaginated` resolvers attached and wired onto the root
//! query, and parent/child relationship fields derived from the live data.
//!
//! Relationship shape is decided per (parent type, child type) pair by the
//! maximum sibling count observed across all parents. A single parent with
//! two children of a type makes the field plural for every instance of the
//! parent type; the schema shape stays uniform across nodes even when most
//! parents hold one child.

use std::sync::Arc;

use async_graphql::Value;
use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::debug;

use sitegraph_core::NodeStore;

use crate::descriptor::{FieldDescriptor, InputValueSpec, TypeRefSpec};
use crate::error::SchemaError;
use crate::inputs::{discard_input_artifacts, filter_input, pagination_type, sort_input};
use crate::node_interface::{add_node_identity_fields, child_ids};
use crate::query::{FindManyPaginated, FindOne};
use crate::registry::{ResolverDefinition, TypeRegistry, capitalize_first};
use crate::resolve::{Resolve, ResolverChain, json_to_graphql_value, resolver};

/// Per child type, the maximum number of live children of that type held by
/// any single node of the analyzed type.
pub type ChildCounts = IndexMap<String, usize>;

/// Analyzes parent/child relationships for the given node types.
///
/// Per-type analysis only reads the store, so it runs concurrently; the
/// registry mutation that consumes the result stays serial.
pub async fn analyze_node_types(
    store: &Arc<dyn NodeStore>,
    type_names: &[String],
) -> IndexMap<String, ChildCounts> {
    let analyses = type_names
        .iter()
        .map(|type_name| analyze_children(store, type_name));
    let results = join_all(analyses).await;
    type_names.iter().cloned().zip(results).collect()
}

/// Groups one type's nodes' live children by child type, keeping the
/// maximum count across parents. Dangling child ids do not count.
pub async fn analyze_children(store: &Arc<dyn NodeStore>, type_name: &str) -> ChildCounts {
    let mut counts = ChildCounts::new();
    for node in store.get_nodes_by_type(type_name).await {
        if node.children.is_empty() {
            continue;
        }
        let path = sitegraph_core::QueryPath::from_segments(vec![
            type_name.to_string(),
            "children".to_string(),
        ]);
        let children = store.get_nodes_by_ids(&node.children, None, &path).await;
        let mut per_node = IndexMap::<String, usize>::new();
        for child in &children {
            *per_node.entry(child.type_name().to_string()).or_default() += 1;
        }
        for (child_type, count) in per_node {
            let entry = counts.entry(child_type).or_default();
            *entry = (*entry).max(count);
        }
    }
    counts
}

/// Enriches one node type in place and wires its root query fields.
///
/// Generated input artifacts for the type are discarded first, so running
/// enrichment again on a type whose shape changed is safe.
pub fn enrich_node_type(
    registry: &mut TypeRegistry,
    type_name: &str,
    child_counts: &ChildCounts,
) -> Result<(), SchemaError> {
    let snapshot = {
        let Some(object) = registry
            .get_mut(type_name)
            .and_then(|t| t.descriptor.as_object_mut())
        else {
            return Ok(());
        };
        add_node_identity_fields(object);
        object.clone()
    };
    debug!(type_name = %type_name, "Enriching node type");

    discard_input_artifacts(registry, type_name);
    let filter_name = filter_input(registry, &snapshot)?;
    let sort_name = sort_input(registry, &snapshot)?;
    let connection_name = pagination_type(registry, type_name)?;

    let find_one = ResolverDefinition {
        type_ref: TypeRefSpec::named(type_name),
        args: IndexMap::from([(
            "filter".to_string(),
            InputValueSpec::new(TypeRefSpec::named(filter_name.clone())),
        )]),
        chain: ResolverChain::of(FindOne::new(type_name)),
    };
    let find_many = ResolverDefinition {
        type_ref: TypeRefSpec::named_nn(connection_name),
        args: IndexMap::from([
            (
                "filter".to_string(),
                InputValueSpec::new(TypeRefSpec::named(filter_name)),
            ),
            (
                "sort".to_string(),
                InputValueSpec::new(TypeRefSpec::named(sort_name)),
            ),
            (
                "skip".to_string(),
                InputValueSpec::new(TypeRefSpec::named("Int")),
            ),
            (
                "limit".to_string(),
                InputValueSpec::new(TypeRefSpec::named("Int")),
            ),
        ]),
        chain: ResolverChain::of(FindManyPaginated::new(type_name)),
    };

    let relationship_fields = relationship_fields(registry, child_counts);

    let Some(registered) = registry.get_mut(type_name) else {
        return Ok(());
    };
    registered
        .resolvers
        .insert("findOne".to_string(), find_one.clone());
    registered
        .resolvers
        .insert("findManyPaginated".to_string(), find_many.clone());
    if let Some(fields) = registered.descriptor.fields_mut() {
        for (field_name, field) in relationship_fields {
            if !fields.contains_key(&field_name) {
                fields.insert(field_name, field);
            }
        }
    }

    registry.add_query_field(lower_camel_case(type_name), find_one.to_field());
    registry.add_query_field(
        format!("all{}", capitalize_first(&lower_camel_case(type_name))),
        find_many.to_field(),
    );
    Ok(())
}

/// Derives `children{Child}` / `child{Child}` fields from the analysis.
/// Child types not registered in this build contribute nothing.
fn relationship_fields(
    registry: &TypeRegistry,
    child_counts: &ChildCounts,
) -> Vec<(String, FieldDescriptor)> {
    let mut fields = Vec::new();
    for (child_type, max_count) in child_counts {
        if !registry.contains(child_type) {
            continue;
        }
        let suffix = capitalize_first(&lower_camel_case(child_type));
        if *max_count > 1 {
            fields.push((
                format!("children{suffix}"),
                FieldDescriptor::new(TypeRefSpec::named_nn_list_nn(child_type))
                    .resolver(children_of_type(child_type.clone())),
            ));
        } else {
            fields.push((
                format!("child{suffix}"),
                FieldDescriptor::new(TypeRefSpec::named(child_type))
                    .resolver(child_of_type(child_type.clone())),
            ));
        }
    }
    fields
}

fn children_of_type(child_type: String) -> Arc<dyn Resolve> {
    resolver(move |ctx, _next| {
        let child_type = child_type.clone();
        Box::pin(async move {
            let ids = child_ids(&ctx.parent);
            let nodes = ctx
                .store
                .get_nodes_by_ids(&ids, Some(&child_type), &ctx.path)
                .await;
            Ok(Some(Value::List(
                nodes
                    .into_iter()
                    .map(|node| json_to_graphql_value(node.to_value()))
                    .collect(),
            )))
        })
    })
}

fn child_of_type(child_type: String) -> Arc<dyn Resolve> {
    resolver(move |ctx, _next| {
        let child_type = child_type.clone();
        Box::pin(async move {
            let ids = child_ids(&ctx.parent);
            let nodes = ctx
                .store
                .get_nodes_by_ids(&ids, Some(&child_type), &ctx.path)
                .await;
            Ok(nodes
                .into_iter()
                .next()
                .map(|node| json_to_graphql_value(node.to_value())))
        })
    })
}

/// Lowers a type name to camel case, folding leading acronym runs the way
/// `NPMPackage` becomes `npmPackage`.
pub(crate) fn lower_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let run = chars.iter().take_while(|c| c.is_ascii_uppercase()).count();
    let lower_until = if run == chars.len() || run <= 1 {
        run
    } else {
        run - 1
    };
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i < lower_until {
                c.to_ascii_lowercase()
            } else {
                *c
            }
        })
        .collect()
}
