//! Read-side use cases: list, neighbors, traverse, paths
//!
//! Raw parameters are validated and normalized here, then handed to the
//! repository in a single call. Nothing is written and no events are
//! emitted.

use super::Erm;
use crate::edge::Edge;
use crate::entity::Entity;
use crate::error::Result;
use crate::ids::{EntityId, WorkspaceId};
use crate::repository::{ListFilters, NeighborOptions, PathOptions, TraversalOptions};
use crate::validation::{
    parse_direction, parse_id, validate_depth, validate_limit, validate_offset,
    validate_type_name, DEFAULT_LIST_LIMIT, MAX_PATH_DEPTH, MAX_TRAVERSAL_DEPTH,
};
use serde::{Deserialize, Serialize};

/// Filters for `list_entities` / `list_edges`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListParams {
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn normalize(self) -> Result<ListFilters> {
        if let Some(name) = &self.type_name {
            validate_type_name(name)?;
        }
        let limit = validate_limit(self.limit)?.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = validate_offset(self.offset)?.unwrap_or(0);
        Ok(ListFilters::new(self.type_name, limit, offset))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborParams {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub edge_type: Option<String>,
}

impl NeighborParams {
    fn normalize(self) -> Result<NeighborOptions> {
        let direction = parse_direction(self.direction.as_deref())?;
        for name in [&self.entity_type, &self.edge_type].into_iter().flatten() {
            validate_type_name(name)?;
        }
        Ok(NeighborOptions {
            direction,
            entity_type: self.entity_type,
            edge_type: self.edge_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraverseParams {
    #[serde(default)]
    pub max_depth: Option<i64>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl TraverseParams {
    fn normalize(self) -> Result<TraversalOptions> {
        Ok(TraversalOptions {
            max_depth: validate_depth(self.max_depth, 1, MAX_TRAVERSAL_DEPTH)?,
            direction: parse_direction(self.direction.as_deref())?,
            limit: validate_limit(self.limit)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathParams {
    #[serde(default)]
    pub max_depth: Option<i64>,
    /// Defaults to `out`: paths follow edge direction unless asked otherwise
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub max_paths: Option<i64>,
}

impl PathParams {
    fn normalize(self) -> Result<PathOptions> {
        let defaults = PathOptions::default();
        let direction = match self.direction.as_deref() {
            None => defaults.direction,
            Some(raw) => parse_direction(Some(raw))?,
        };
        Ok(PathOptions {
            max_depth: validate_depth(self.max_depth, defaults.max_depth, MAX_PATH_DEPTH)?,
            direction,
            max_paths: validate_limit(self.max_paths)?.unwrap_or(defaults.max_paths),
        })
    }
}

pub struct QueryService<'a> {
    erm: &'a Erm,
}

impl<'a> QueryService<'a> {
    pub(crate) fn new(erm: &'a Erm) -> Self {
        Self { erm }
    }

    pub async fn list_entities(&self, workspace: &WorkspaceId, params: ListParams) -> Result<Vec<Entity>> {
        let filters = params.normalize()?;
        tracing::debug!("Listing entities in {} ({:?})", workspace, filters);
        self.erm.graph_repo().list_entities(workspace, &filters).await
    }

    pub async fn list_edges(&self, workspace: &WorkspaceId, params: ListParams) -> Result<Vec<Edge>> {
        let filters = params.normalize()?;
        tracing::debug!("Listing edges in {} ({:?})", workspace, filters);
        self.erm.graph_repo().list_edges(workspace, &filters).await
    }

    pub async fn get_neighbors(
        &self,
        workspace: &WorkspaceId,
        entity_id: &str,
        params: NeighborParams,
    ) -> Result<Vec<Entity>> {
        let id: EntityId = parse_id("entity_id", entity_id)?;
        let opts = params.normalize()?;
        tracing::debug!("Neighbors of {} ({})", id, opts.direction);
        self.erm.graph_repo().get_neighbors(workspace, &id, &opts).await
    }

    pub async fn traverse(
        &self,
        workspace: &WorkspaceId,
        start_id: &str,
        params: TraverseParams,
    ) -> Result<Vec<Entity>> {
        let start: EntityId = parse_id("start_id", start_id)?;
        let opts = params.normalize()?;
        tracing::debug!(
            "Traversing from {} (depth {}, {})",
            start,
            opts.max_depth,
            opts.direction
        );
        self.erm.graph_repo().traverse(workspace, &start, &opts).await
    }

    /// All simple paths from `source_id` to `target_id`, shortest first
    pub async fn find_paths(
        &self,
        workspace: &WorkspaceId,
        source_id: &str,
        target_id: &str,
        params: PathParams,
    ) -> Result<Vec<Vec<Entity>>> {
        let source: EntityId = parse_id("source_id", source_id)?;
        let target: EntityId = parse_id("target_id", target_id)?;
        let opts = params.normalize()?;
        tracing::debug!(
            "Finding paths {} -> {} (depth {}, {})",
            source,
            target,
            opts.max_depth,
            opts.direction
        );
        self.erm
            .graph_repo()
            .find_paths(workspace, &source, &target, &opts)
            .await
    }
}
