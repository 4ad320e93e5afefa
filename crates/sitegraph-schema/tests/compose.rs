//! End-to-end schema composition tests: store in, executable schema out.

use std::sync::Arc;

use async_graphql::Value;
use async_trait::async_trait;
use serde_json::json;

use sitegraph_core::{InMemoryNodeStore, Node, RecordingReporter};
use sitegraph_schema::{
    FieldDescriptor, IntermediateSchema, NodeTypeFields, ResolverPatch, SchemaBuilder,
    SchemaError, SchemaPlugin, TypeRefSpec, resolver,
};

fn family_store() -> Arc<InMemoryNodeStore> {
    Arc::new(InMemoryNodeStore::with_nodes([
        Node::new("p1", "Person")
            .with_field("name", json!("Ada"))
            .with_field("age", json!(36))
            .with_children(["pet1", "pet2"]),
        Node::new("p2", "Person")
            .with_field("name", json!("Grace"))
            .with_field("age", json!(45))
            .with_children(["pet3"]),
        Node::new("pet1", "Pet")
            .with_parent("p1")
            .with_field("nickname", json!("Rex")),
        Node::new("pet2", "Pet")
            .with_parent("p1")
            .with_field("nickname", json!("Misu")),
        Node::new("pet3", "Pet")
            .with_parent("p2")
            .with_field("nickname", json!("Bits")),
    ]))
}

async fn execute(schema: &async_graphql::dynamic::Schema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data
}

#[tokio::test]
async fn test_person_pet_end_to_end() {
    let mut builder = SchemaBuilder::new(family_store());
    let schema = builder.build_schema().await.unwrap();
    let sdl = schema.sdl();

    assert!(sdl.contains("type Person implements Node"));
    assert!(sdl.contains("type Pet implements Node"));
    assert!(sdl.contains("PersonFilterInput"));
    assert!(sdl.contains("PersonSortInput"));
    assert!(sdl.contains("type PersonConnection"));

    let data = execute(
        &schema,
        r#"{
            person(filter: { name: { eq: "Ada" } }) {
                id
                name
                childrenPet { nickname }
            }
        }"#,
    )
    .await;
    let json = data.into_json().unwrap();
    assert_eq!(json["person"]["id"], json!("p1"));
    assert_eq!(json["person"]["childrenPet"][0]["nickname"], json!("Rex"));
    assert_eq!(json["person"]["childrenPet"][1]["nickname"], json!("Misu"));
}

#[tokio::test]
async fn test_relationship_shape_is_uniform_across_instances() {
    let mut builder = SchemaBuilder::new(family_store());
    let schema = builder.build_schema().await.unwrap();

    // Grace holds a single pet, but Ada's two make the field plural for
    // every Person.
    let data = execute(
        &schema,
        r#"{
            person(filter: { name: { eq: "Grace" } }) {
                childrenPet { nickname }
            }
        }"#,
    )
    .await;
    let json = data.into_json().unwrap();
    assert_eq!(json["person"]["childrenPet"], json!([{ "nickname": "Bits" }]));
}

#[tokio::test]
async fn test_pagination_and_sort_roundtrip() {
    let mut builder = SchemaBuilder::new(family_store());
    let schema = builder.build_schema().await.unwrap();

    let data = execute(
        &schema,
        r#"{
            allPerson(sort: { fields: ["age"], order: DESC }, limit: 1) {
                totalCount
                nodes { name }
                pageInfo { currentPage pageCount hasNextPage }
            }
        }"#,
    )
    .await;
    let json = data.into_json().unwrap();
    assert_eq!(json["allPerson"]["totalCount"], json!(2));
    assert_eq!(json["allPerson"]["nodes"], json!([{ "name": "Grace" }]));
    assert_eq!(json["allPerson"]["pageInfo"]["currentPage"], json!(1));
    assert_eq!(json["allPerson"]["pageInfo"]["pageCount"], json!(2));
    assert_eq!(json["allPerson"]["pageInfo"]["hasNextPage"], json!(true));
}

#[tokio::test]
async fn test_parent_and_children_identity_fields() {
    let mut builder = SchemaBuilder::new(family_store());
    let schema = builder.build_schema().await.unwrap();

    let data = execute(
        &schema,
        r#"{
            pet(filter: { nickname: { eq: "Rex" } }) {
                parent { id }
                internal { type }
            }
        }"#,
    )
    .await;
    let json = data.into_json().unwrap();
    assert_eq!(json["pet"]["parent"]["id"], json!("p1"));
    assert_eq!(json["pet"]["internal"]["type"], json!("Pet"));
}

#[tokio::test]
async fn test_reserved_node_name_is_fatal() {
    let mut builder = SchemaBuilder::new(family_store()).add_sdl("type Node { id: ID! }");
    let err = builder.build_schema().await.unwrap_err();
    let SchemaError::NameConflict { name, .. } = err else {
        panic!("expected name conflict, got {err}");
    };
    assert_eq!(name, "Node");
}

#[tokio::test]
async fn test_reserved_suffix_and_scalar_names_are_fatal() {
    for sdl in ["type PetFilterInput { x: Int }", "type Date { y: Int }"] {
        let mut builder = SchemaBuilder::new(family_store()).add_sdl(sdl);
        assert!(matches!(
            builder.build_schema().await,
            Err(SchemaError::NameConflict { .. })
        ));
    }
}

#[tokio::test]
async fn test_explicit_definition_wins_over_inference() {
    // `age` is explicitly a Float even though every sampled value is an
    // integer; `name` is left to inference.
    let mut builder =
        SchemaBuilder::new(family_store()).add_sdl("type Person { age: Float }");
    let schema = builder.build_schema().await.unwrap();
    let sdl = schema.sdl();
    assert!(sdl.contains("age: Float"));
    assert!(sdl.contains("name: String"));
}

#[tokio::test]
async fn test_parse_error_reports_code_frame() {
    let mut builder =
        SchemaBuilder::new(family_store()).add_sdl("type Person {\n  name String\n}");
    let err = builder.build_schema().await.unwrap_err();
    let SchemaError::Parse { excerpt, .. } = &err else {
        panic!("expected parse error, got {err}");
    };
    assert!(excerpt.as_deref().unwrap().contains("name String"));
}

#[tokio::test]
async fn test_repeated_builds_are_stable() {
    let store = family_store();
    let first = SchemaBuilder::new(store.clone())
        .build_schema()
        .await
        .unwrap()
        .sdl();
    let second = SchemaBuilder::new(store)
        .build_schema()
        .await
        .unwrap()
        .sdl();
    assert_eq!(first, second);
}

struct SlugPlugin;

#[async_trait]
impl SchemaPlugin for SlugPlugin {
    async fn set_fields_on_node_type(
        &self,
        request: &NodeTypeFields,
    ) -> Vec<(String, FieldDescriptor)> {
        if request.type_name != "Person" {
            return Vec::new();
        }
        vec![(
            "meta.slug".to_string(),
            FieldDescriptor::new(TypeRefSpec::named("String")),
        )]
    }

    async fn create_resolvers(&self, schema: &IntermediateSchema) -> Vec<ResolverPatch> {
        // The intermediate schema is fully resolved before overlay runs.
        assert!(schema.sdl().contains("type Person implements Node"));
        vec![
            ResolverPatch::new("Person", "shout")
                .type_ref(TypeRefSpec::named("String"))
                .resolver(resolver(|ctx, next| {
                    Box::pin(async move {
                        let inner = {
                            let mut ctx = ctx.clone();
                            ctx.field_name = "name".to_string();
                            next.run(&ctx).await?
                        };
                        Ok(inner.map(|value| match value {
                            Value::String(s) => Value::String(s.to_uppercase()),
                            other => other,
                        }))
                    })
                })),
            // Declares Int for a String field on a local type: rejected.
            ResolverPatch::new("Person", "name").type_ref(TypeRefSpec::named("Int")),
        ]
    }
}

#[tokio::test]
async fn test_plugin_fields_and_overlay_rules() {
    let reporter = Arc::new(RecordingReporter::new());
    let mut builder = SchemaBuilder::new(family_store())
        .with_reporter(reporter.clone())
        .add_plugin(Box::new(SlugPlugin));
    let schema = builder.build_schema().await.unwrap();
    let sdl = schema.sdl();

    assert!(sdl.contains("type PersonMeta"));
    assert!(sdl.contains("shout: String"));
    // The type-changing patch was refused, with a warning naming both types.
    assert!(sdl.contains("name: String"));
    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("String") && warnings[0].contains("Int"));

    let data = execute(
        &schema,
        r#"{ person(filter: { name: { eq: "Ada" } }) { shout } }"#,
    )
    .await;
    assert_eq!(data.into_json().unwrap()["person"]["shout"], json!("ADA"));
}
