use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema};

use super::rest::AppState;
use super::DaemonHealth;
use crate::domain::collector::{Category, CollectRequest};
use crate::domain::outcome::DegradationCount;
use crate::domain::snapshot::Snapshot;

pub type NetsightSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Collect a fresh snapshot. `traceroute` defaults to the daemon config.
    async fn snapshot(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] category: Category,
        traceroute: Option<bool>,
    ) -> async_graphql::Result<Snapshot> {
        let state = ctx.data::<AppState>()?;
        state
            .collector
            .collect(&CollectRequest {
                category,
                traceroute,
            })
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))
    }

    /// Degradations per probe since the daemon started.
    async fn degradations(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<DegradationCount>> {
        let state = ctx.data::<AppState>()?;
        Ok(state.collector.degradation_counts())
    }

    async fn health(&self, ctx: &Context<'_>) -> async_graphql::Result<DaemonHealth> {
        let state = ctx.data::<AppState>()?;
        Ok(state.health())
    }
}

pub fn build_schema(state: AppState) -> NetsightSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(state)
        .finish()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::CollectorConfig;
    use crate::domain::collector::Collector;
    use crate::domain::runner::scripted::ScriptedRunner;

    fn schema(runner: ScriptedRunner) -> NetsightSchema {
        let collector = Collector::new(Arc::new(runner), CollectorConfig::default());
        build_schema(AppState::new(collector))
    }

    #[tokio::test]
    async fn snapshot_by_category() {
        let schema = schema(ScriptedRunner::new().ok("top -l 1 -n 0", "CPU usage: 20.0% user, 5.0% sys, 75.0% idle\n"));
        let res = schema
            .execute("{ snapshot(category: PERFORMANCE) { performance { cpu } macInfo { osVersion } interfaces { name } } }")
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);

        let data = res.data.into_json().unwrap();
        assert_eq!(data["snapshot"]["performance"]["cpu"], 25.0);
        assert_eq!(data["snapshot"]["macInfo"]["osVersion"], "Unknown");
        assert!(data["snapshot"]["interfaces"].is_null());
    }

    #[tokio::test]
    async fn degradations_after_collection() {
        let schema = schema(ScriptedRunner::new());
        let res = schema.execute("{ snapshot(category: ROUTES) { ping { latency loss } } }").await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);

        let res = schema.execute("{ degradations { probe count } }").await;
        let data = res.data.into_json().unwrap();
        let entries = data["degradations"].as_array().unwrap();
        assert!(entries.iter().any(|e| e["probe"] == "ping" && e["count"] == 1));
    }
}
