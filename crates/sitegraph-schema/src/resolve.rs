//! Resolver chains.
//!
//! A field carries an ordered list of resolver steps invoked outer-to-inner,
//! middleware style. Each step receives the remaining chain as [`Next`] and
//! may delegate to it, wrap its result, or replace it entirely. The terminal
//! step, reached when the chain is exhausted, looks the field up on the
//! parent value. Overlay patches prepend steps, which is how an override
//! keeps the previous resolver reachable.

use std::fmt;
use std::sync::Arc;

use async_graphql::{Name, Value};
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use sitegraph_core::{NodeStore, QueryPath};

/// Result of one resolution step.
pub type ResolveResult = Result<Option<Value>, async_graphql::Error>;

/// Everything a resolver step gets to work with.
#[derive(Clone)]
pub struct ResolverContext {
    /// The parent object value the field is resolved on. `Value::Null` at
    /// the query root.
    pub parent: Value,
    /// Coerced field arguments.
    pub args: IndexMap<String, Value>,
    /// The node lookup collaborator.
    pub store: Arc<dyn NodeStore>,
    /// Query position of this field, threaded to the store.
    pub path: QueryPath,
    /// Name of the field being resolved.
    pub field_name: String,
}

impl ResolverContext {
    /// Returns an argument by name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

impl fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext")
            .field("field_name", &self.field_name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// One step in a resolver chain.
pub trait Resolve: Send + Sync {
    /// Resolves the field, optionally delegating to `next`.
    fn resolve<'a>(&'a self, ctx: &'a ResolverContext, next: Next<'a>) -> BoxFuture<'a, ResolveResult>;
}

/// Handle to the remaining steps of a chain.
///
/// Running an exhausted `Next` falls through to the default field-lookup
/// resolver, so an overriding step can always delegate, even when no
/// previous resolver was ever attached.
pub struct Next<'a> {
    steps: &'a [Arc<dyn Resolve>],
}

impl<'a> Next<'a> {
    /// Runs the remaining chain. The context may be a shorter-lived value
    /// than the chain itself, so a step can delegate with an adjusted copy.
    pub async fn run(self, ctx: &ResolverContext) -> ResolveResult {
        match self.steps.split_first() {
            Some((head, rest)) => head.resolve(ctx, Next { steps: rest }).await,
            None => default_field_lookup(ctx),
        }
    }
}

/// The terminal resolver: extract the field's value from the parent object.
fn default_field_lookup(ctx: &ResolverContext) -> ResolveResult {
    if let Value::Object(obj) = &ctx.parent
        && let Some(value) = obj.get(&Name::new(&ctx.field_name))
    {
        return Ok(Some(value.clone()));
    }
    Ok(None)
}

/// An ordered resolver chain. The empty chain is just the default
/// field-lookup resolver.
#[derive(Clone, Default)]
pub struct ResolverChain {
    steps: Vec<Arc<dyn Resolve>>,
}

impl ResolverChain {
    /// Creates a chain with a single step.
    pub fn of(step: Arc<dyn Resolve>) -> Self {
        Self { steps: vec![step] }
    }

    /// Prepends a step; the previous chain stays reachable via [`Next`].
    pub fn prepend(&mut self, step: Arc<dyn Resolve>) {
        self.steps.insert(0, step);
    }

    /// Number of steps in the chain.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if only the default field lookup would run.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the chain outer-to-inner.
    pub async fn resolve(&self, ctx: &ResolverContext) -> ResolveResult {
        Next { steps: &self.steps }.run(ctx).await
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolverChain({} steps)", self.steps.len())
    }
}

struct FnResolver<F>(F);

impl<F> Resolve for FnResolver<F>
where
    F: for<'a> Fn(&'a ResolverContext, Next<'a>) -> BoxFuture<'a, ResolveResult> + Send + Sync,
{
    fn resolve<'a>(&'a self, ctx: &'a ResolverContext, next: Next<'a>) -> BoxFuture<'a, ResolveResult> {
        (self.0)(ctx, next)
    }
}

/// Wraps a closure as a resolver step.
///
/// # Example
///
/// ```
/// use sitegraph_schema::resolve::resolver;
/// use async_graphql::Value;
///
/// let step = resolver(|_ctx, _next| {
///     Box::pin(async move { Ok(Some(Value::String("ok".to_string()))) })
/// });
/// assert_eq!(std::sync::Arc::strong_count(&step), 1);
/// ```
pub fn resolver<F>(f: F) -> Arc<dyn Resolve>
where
    F: for<'a> Fn(&'a ResolverContext, Next<'a>) -> BoxFuture<'a, ResolveResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnResolver(f))
}

/// Converts a `serde_json::Value` to a GraphQL value.
pub fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: indexmap::IndexMap<Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitegraph_core::InMemoryNodeStore;

    fn ctx_with_parent(parent: serde_json::Value, field_name: &str) -> ResolverContext {
        ResolverContext {
            parent: json_to_graphql_value(parent),
            args: IndexMap::new(),
            store: Arc::new(InMemoryNodeStore::new()),
            path: QueryPath::root(),
            field_name: field_name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_falls_back_to_field_lookup() {
        let chain = ResolverChain::default();
        let ctx = ctx_with_parent(json!({ "name": "Ada" }), "name");
        let value = chain.resolve(&ctx).await.unwrap();
        assert_eq!(value, Some(Value::String("Ada".to_string())));

        let ctx = ctx_with_parent(json!({ "name": "Ada" }), "missing");
        assert_eq!(chain.resolve(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prepended_step_can_delegate() {
        let mut chain = ResolverChain::of(resolver(|ctx, next| {
            Box::pin(async move {
                let inner = next.run(ctx).await?;
                Ok(inner.map(|v| match v {
                    Value::String(s) => Value::String(format!("{s}!")),
                    other => other,
                }))
            })
        }));
        chain.prepend(resolver(|ctx, next| {
            Box::pin(async move {
                let inner = next.run(ctx).await?;
                Ok(inner.map(|v| match v {
                    Value::String(s) => Value::String(s.to_uppercase()),
                    other => other,
                }))
            })
        }));

        let ctx = ctx_with_parent(json!({ "name": "ada" }), "name");
        let value = chain.resolve(&ctx).await.unwrap();
        // Outer step runs first, wrapping the inner step's result.
        assert_eq!(value, Some(Value::String("ADA!".to_string())));
    }

    #[tokio::test]
    async fn test_step_can_replace_entirely() {
        let chain = ResolverChain::of(resolver(|_ctx, _next| {
            Box::pin(async move { Ok(Some(Value::Boolean(true))) })
        }));
        let ctx = ctx_with_parent(json!({ "flag": false }), "flag");
        assert_eq!(chain.resolve(&ctx).await.unwrap(), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_json_conversion() {
        let value = json_to_graphql_value(json!({ "a": [1, "x", null, true] }));
        if let Value::Object(obj) = value {
            assert!(matches!(obj.get(&Name::new("a")), Some(Value::List(_))));
        } else {
            panic!("expected object");
        }
    }
}
