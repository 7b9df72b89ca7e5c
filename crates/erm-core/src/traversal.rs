//! Graph algorithms over a workspace snapshot
//!
//! Storage backends load a workspace's live entities and edges and hand
//! them to [`TraversalEngine`]; the algorithms themselves never touch
//! storage.

use crate::edge::{Direction, Edge};
use crate::entity::Entity;
use crate::ids::EntityId;
use crate::repository::{NeighborOptions, PathOptions, TraversalOptions};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Traversal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub edges_traversed: usize,
    pub max_depth_reached: u32,
}

/// Adjacency view over live edges
struct Adjacency<'a> {
    by_entity: HashMap<EntityId, Vec<&'a Edge>>,
}

impl<'a> Adjacency<'a> {
    fn build(edges: &'a [Edge]) -> Self {
        let mut by_entity: HashMap<EntityId, Vec<&'a Edge>> = HashMap::new();
        for edge in edges.iter().filter(|e| !e.is_deleted()) {
            by_entity.entry(edge.source_id).or_default().push(edge);
            if edge.target_id != edge.source_id {
                by_entity.entry(edge.target_id).or_default().push(edge);
            }
        }
        Self { by_entity }
    }

    /// Entities one step from `node`, in edge order, with the edge walked
    fn steps(&self, node: &EntityId, direction: Direction) -> Vec<(&'a Edge, EntityId)> {
        self.by_entity
            .get(node)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| edge.step_from(node, direction).map(|next| (*edge, next)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Hop count from every entity that can reach `target` within `max_hops`
    ///
    /// Walks the edges backwards from `target`, so the counts hold for paths
    /// that follow `direction`.
    fn distances_to(
        &self,
        target: &EntityId,
        direction: Direction,
        max_hops: u32,
        entities: &HashMap<EntityId, Entity>,
    ) -> HashMap<EntityId, u32> {
        let mut dist = HashMap::from([(*target, 0)]);
        let mut queue = VecDeque::from([(*target, 0u32)]);
        while let Some((node, hops)) = queue.pop_front() {
            if hops >= max_hops {
                continue;
            }
            for (_, prev) in self.steps(&node, direction.reversed()) {
                if entities.contains_key(&prev) && !dist.contains_key(&prev) {
                    dist.insert(prev, hops + 1);
                    queue.push_back((prev, hops + 1));
                }
            }
        }
        dist
    }
}

/// Graph traversal engine
pub struct TraversalEngine;

impl TraversalEngine {
    /// Distinct entities adjacent to `start`, filtered by edge and entity type
    pub fn neighbors(
        start: &EntityId,
        opts: &NeighborOptions,
        entities: &HashMap<EntityId, Entity>,
        edges: &[Edge],
    ) -> Vec<Entity> {
        let adjacency = Adjacency::build(edges);
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for (edge, next) in adjacency.steps(start, opts.direction) {
            if let Some(edge_type) = &opts.edge_type {
                if &edge.edge_type != edge_type {
                    continue;
                }
            }
            let Some(entity) = entities.get(&next) else {
                continue;
            };
            if let Some(entity_type) = &opts.entity_type {
                if &entity.entity_type != entity_type {
                    continue;
                }
            }
            if seen.insert(next) {
                result.push(entity.clone());
            }
        }

        result
    }

    /// Breadth-first walk from `start` up to `max_depth` hops
    ///
    /// Returns reachable entities in visit order, excluding `start`.
    pub fn traverse(
        start: &EntityId,
        opts: &TraversalOptions,
        entities: &HashMap<EntityId, Entity>,
        edges: &[Edge],
    ) -> (Vec<Entity>, TraversalStats) {
        let adjacency = Adjacency::build(edges);
        let mut visited: HashSet<EntityId> = HashSet::new();
        let mut queue: VecDeque<(EntityId, u32)> = VecDeque::new();
        let mut stats = TraversalStats::default();
        let mut result = Vec::new();
        let limit = opts.limit.unwrap_or(usize::MAX);

        queue.push_back((*start, 0));
        visited.insert(*start);

        'walk: while let Some((current, depth)) = queue.pop_front() {
            stats.nodes_visited += 1;
            stats.max_depth_reached = stats.max_depth_reached.max(depth);

            if depth >= opts.max_depth {
                continue;
            }

            for (_, next) in adjacency.steps(&current, opts.direction) {
                stats.edges_traversed += 1;

                let Some(entity) = entities.get(&next) else {
                    continue;
                };
                if visited.insert(next) {
                    result.push(entity.clone());
                    if result.len() >= limit {
                        break 'walk;
                    }
                    queue.push_back((next, depth + 1));
                }
            }
        }

        tracing::debug!(
            "Traversal visited {} nodes, traversed {} edges",
            stats.nodes_visited,
            stats.edges_traversed
        );

        (result, stats)
    }

    /// Simple paths from `source` to `target` of at most `max_depth` edges
    ///
    /// Paths come back shortest first, capped at `max_paths`. Each path
    /// lists its entities from source to target.
    pub fn find_paths(
        source: &EntityId,
        target: &EntityId,
        opts: &PathOptions,
        entities: &HashMap<EntityId, Entity>,
        edges: &[Edge],
    ) -> Vec<Vec<Entity>> {
        if !entities.contains_key(source) || !entities.contains_key(target) {
            return Vec::new();
        }

        let adjacency = Adjacency::build(edges);

        // Only extend towards entities that can still reach the target in time
        let dist = adjacency.distances_to(target, opts.direction, opts.max_depth, entities);
        if !dist.contains_key(source) {
            tracing::debug!("Path search: {} cannot reach {}", source, target);
            return Vec::new();
        }

        let mut found: Vec<Vec<EntityId>> = Vec::new();
        let mut queue: VecDeque<Vec<EntityId>> = VecDeque::new();
        queue.push_back(vec![*source]);

        while let Some(path) = queue.pop_front() {
            if found.len() >= opts.max_paths {
                break;
            }

            let last = path[path.len() - 1];
            if last == *target {
                found.push(path);
                continue;
            }

            let mut seen_next = HashSet::new();
            for (_, next) in adjacency.steps(&last, opts.direction) {
                // Edges used once `next` is appended, plus the shortest way on
                let within_depth = dist
                    .get(&next)
                    .is_some_and(|d| path.len() as u32 + d <= opts.max_depth);
                if !within_depth || path.contains(&next) || !seen_next.insert(next) {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(next);
                queue.push_back(extended);
            }
        }

        tracing::debug!("Path search found {} path(s)", found.len());

        found
            .into_iter()
            .map(|ids| ids.iter().filter_map(|id| entities.get(id).cloned()).collect())
            .collect()
    }
}
