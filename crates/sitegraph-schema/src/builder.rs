//! Build orchestration.
//!
//! `SchemaBuilder` gathers the build inputs and runs the composition
//! pipeline in its fixed order: explicit sources, inferred types, plugin
//! node-type fields, per-node-type enrichment, third-party schemas,
//! resolver overlay, finalization. Any fatal error aborts before
//! finalization, so a partial type graph never escapes the builder.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sitegraph_core::{NodeStore, Reporter, TracingReporter};

use crate::enrich::{analyze_children, analyze_node_types, enrich_node_type};
use crate::error::SchemaError;
use crate::finalize::finalize;
use crate::hooks::{SchemaPlugin, run_set_fields};
use crate::node_interface::register_node_types;
use crate::overlay::{IntermediateSchema, apply_resolver_patches};
use crate::registry::TypeRegistry;
use crate::sources::{
    ForeignSchema, TypeInference, TypeSource, ValueSampleInference, merge_foreign_schema,
    register_type_source,
};

/// The node type that is re-derived on incremental rebuilds. Pages are the
/// one type whose nodes keep changing while everything else stays put.
pub const SITE_PAGE_TYPE: &str = "SitePage";

/// Schema build limits and toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth.
    pub max_depth: usize,
    /// Maximum query complexity.
    pub max_complexity: usize,
    /// Whether introspection queries are allowed.
    pub introspection: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection: true,
        }
    }
}

/// Composes an executable schema from all contributing sources.
pub struct SchemaBuilder {
    store: Arc<dyn NodeStore>,
    reporter: Arc<dyn Reporter>,
    config: SchemaBuilderConfig,
    sources: Vec<TypeSource>,
    foreign: Vec<ForeignSchema>,
    plugins: Vec<Box<dyn SchemaPlugin>>,
    inference: Box<dyn TypeInference>,
    registry: Option<TypeRegistry>,
}

impl SchemaBuilder {
    /// Creates a builder over a node store, with the default reporter,
    /// configuration and inference strategy.
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            reporter: Arc::new(TracingReporter),
            config: SchemaBuilderConfig::default(),
            sources: Vec::new(),
            foreign: Vec::new(),
            plugins: Vec::new(),
            inference: Box::new(ValueSampleInference),
            registry: None,
        }
    }

    /// Replaces the diagnostics reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchemaBuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the inference strategy.
    #[must_use]
    pub fn with_inference(mut self, inference: Box<dyn TypeInference>) -> Self {
        self.inference = inference;
        self
    }

    /// Adds an explicit type source.
    #[must_use]
    pub fn add_type_source(mut self, source: impl Into<TypeSource>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Adds an explicit SDL fragment.
    #[must_use]
    pub fn add_sdl(self, sdl: impl Into<String>) -> Self {
        self.add_type_source(TypeSource::Sdl(sdl.into()))
    }

    /// Adds a third-party schema.
    #[must_use]
    pub fn add_foreign_schema(mut self, schema: ForeignSchema) -> Self {
        self.foreign.push(schema);
        self
    }

    /// Adds a plugin.
    #[must_use]
    pub fn add_plugin(mut self, plugin: Box<dyn SchemaPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Runs the full composition pipeline.
    pub async fn build_schema(&mut self) -> Result<Schema, SchemaError> {
        info!("Building schema");
        let mut registry = TypeRegistry::new();
        register_node_types(&mut registry)?;

        for source in &self.sources {
            register_type_source(&mut registry, source.clone())?;
        }
        self.inference
            .infer_types(self.store.as_ref(), &mut registry, self.reporter.as_ref())
            .await?;
        run_set_fields(&mut registry, self.store.as_ref(), &self.plugins).await?;

        let node_types = registry.node_type_names();
        debug!(node_types = node_types.len(), "Enriching node types");
        let analyses = analyze_node_types(&self.store, &node_types).await;
        for (type_name, counts) in &analyses {
            enrich_node_type(&mut registry, type_name, counts)?;
        }

        for schema in &self.foreign {
            merge_foreign_schema(&mut registry, schema.clone())?;
        }

        if !self.plugins.is_empty() {
            let intermediate =
                IntermediateSchema::new(finalize(&registry, &self.store, &self.config)?);
            let mut patches = Vec::new();
            for plugin in &self.plugins {
                patches.extend(plugin.create_resolvers(&intermediate).await);
            }
            apply_resolver_patches(&mut registry, patches, self.reporter.as_ref());
        }

        let schema = finalize(&registry, &self.store, &self.config)?;
        info!(types = registry.type_names().len(), "Schema built");
        self.registry = Some(registry);
        Ok(schema)
    }

    /// Re-derives the page node type against the current store contents and
    /// finalizes again, leaving every other registration untouched.
    pub async fn rebuild_schema_with_site_page(&mut self) -> Result<Schema, SchemaError> {
        let Some(mut registry) = self.registry.take() else {
            return Err(SchemaError::BuildFailed(
                "cannot rebuild before an initial build".to_string(),
            ));
        };
        debug!(type_name = SITE_PAGE_TYPE, "Rebuilding page type");
        self.inference
            .infer_type(
                SITE_PAGE_TYPE,
                self.store.as_ref(),
                &mut registry,
                self.reporter.as_ref(),
            )
            .await?;
        let counts = analyze_children(&self.store, SITE_PAGE_TYPE).await;
        enrich_node_type(&mut registry, SITE_PAGE_TYPE, &counts)?;

        let schema = finalize(&registry, &self.store, &self.config)?;
        self.registry = Some(registry);
        Ok(schema)
    }
}
