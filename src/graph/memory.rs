use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{Edge, GraphStore, Node, NodeMutation, Position};
use crate::error::{GraphError, GraphResult};

#[derive(Default)]
struct GraphState {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

/// In-memory graph store living for the lifetime of the process.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<RwLock<GraphState>>,
    last_stamp: Arc<AtomicI64>,
}

impl MemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph holding a single root node
    pub fn with_root(root: Node) -> Self {
        let mut state = GraphState::default();
        state.index.insert(root.id.clone(), 0);
        state.nodes.push(root);
        Self {
            state: Arc::new(RwLock::new(state)),
            last_stamp: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Millisecond timestamp, strictly increasing across calls.
    ///
    /// Used as the time-based suffix of generated ids so two batches created
    /// within the same millisecond still get distinct ids.
    pub fn stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self.last_stamp.compare_exchange(
                last,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }

    /// Apply a closure to a node under the write lock.
    pub async fn modify<F>(&self, id: &str, f: F) -> GraphResult<Node>
    where
        F: FnOnce(&mut Node) + Send + 'static,
    {
        self.modify_node(id, Box::new(f)).await
    }

    /// Move a node on the canvas. Positions change only through here.
    pub async fn move_node(&self, id: &str, position: Position) -> GraphResult<Node> {
        debug!(node_id = %id, x = position.x, y = position.y, "Moving node");
        self.modify(id, move |node| node.position = position).await
    }

    /// Number of nodes
    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn create_node(&self, node: Node) -> GraphResult<()> {
        let mut state = self.state.write().await;
        debug!(node_id = %node.id, kind = %node.kind(), "Creating node");

        if let Some(&slot) = state.index.get(&node.id) {
            warn!(node_id = %node.id, "Node id already present, replacing");
            state.nodes[slot] = node;
            return Ok(());
        }

        let slot = state.nodes.len();
        state.index.insert(node.id.clone(), slot);
        state.nodes.push(node);
        Ok(())
    }

    async fn get_node(&self, id: &str) -> Option<Node> {
        let state = self.state.read().await;
        state.index.get(id).map(|&slot| state.nodes[slot].clone())
    }

    async fn update_node(&self, node: Node) -> GraphResult<()> {
        let mut state = self.state.write().await;
        let slot = *state
            .index
            .get(&node.id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node.id.clone(),
            })?;

        if state.nodes[slot].kind() != node.kind() {
            return Err(GraphError::InvalidAction {
                action: "update".to_string(),
                node_id: node.id.clone(),
                reason: "node type is fixed at creation".to_string(),
            });
        }

        state.nodes[slot] = node;
        Ok(())
    }

    async fn modify_node(&self, id: &str, mutation: NodeMutation) -> GraphResult<Node> {
        let mut state = self.state.write().await;
        let slot = *state.index.get(id).ok_or_else(|| GraphError::NodeNotFound {
            node_id: id.to_string(),
        })?;

        let mut node = state.nodes[slot].clone();
        mutation(&mut node);

        if node.id != id || node.kind() != state.nodes[slot].kind() {
            return Err(GraphError::InvalidAction {
                action: "update".to_string(),
                node_id: id.to_string(),
                reason: "node id and type are fixed at creation".to_string(),
            });
        }

        state.nodes[slot] = node.clone();
        Ok(node)
    }

    async fn list_nodes(&self) -> Vec<Node> {
        self.state.read().await.nodes.clone()
    }

    async fn create_edge(&self, edge: Edge) -> GraphResult<()> {
        let mut state = self.state.write().await;
        for endpoint in [&edge.source, &edge.target] {
            if !state.index.contains_key(endpoint) {
                return Err(GraphError::NodeNotFound {
                    node_id: endpoint.clone(),
                });
            }
        }
        debug!(edge_id = %edge.id, "Creating edge");
        state.edges.push(edge);
        Ok(())
    }

    async fn list_edges(&self) -> Vec<Edge> {
        self.state.read().await.edges.clone()
    }

    async fn snapshot(&self) -> (Vec<Node>, Vec<Edge>) {
        let state = self.state.read().await;
        (state.nodes.clone(), state.edges.clone())
    }
}
