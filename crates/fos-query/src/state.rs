//! Query state arena
//!
//! Every chain step appends one immutable state. A state links back to
//! the state it was derived from, always an earlier entry, so the history
//! forms a chain without cycles.

use std::fmt;

use fos_dom::{DocumentId, NodeId};

/// Index of a query state in the session arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state-{}", self.0)
    }
}

/// One result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// Owning document
    pub document: DocumentId,
    /// Matched nodes in result order
    pub nodes: Vec<NodeId>,
    /// Stack before the operation that produced this state
    pub backup: Vec<NodeId>,
    /// State this one was derived from
    pub previous: Option<StateId>,
}

/// Append-only storage for query states
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<QueryState>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a root state (no history)
    pub fn push_root(&mut self, document: DocumentId, nodes: Vec<NodeId>) -> StateId {
        self.push(QueryState {
            document,
            backup: nodes.clone(),
            nodes,
            previous: None,
        })
    }

    /// Append a state and return its id
    pub fn push(&mut self, state: QueryState) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(state);
        id
    }

    pub fn get(&self, id: StateId) -> Option<&QueryState> {
        self.states.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of states reachable through `previous` links, `id` included
    pub fn depth(&self, id: StateId) -> usize {
        let mut depth = 0;
        let mut current = Some(id);
        while let Some(state) = current.and_then(|s| self.get(s)) {
            depth += 1;
            current = state.previous;
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_links_back() {
        let mut arena = StateArena::new();
        let doc = DocumentId(0);
        let root = arena.push_root(doc, vec![NodeId::ROOT]);
        let child = arena.push(QueryState {
            document: doc,
            nodes: Vec::new(),
            backup: vec![NodeId::ROOT],
            previous: Some(root),
        });

        let state = arena.get(child).unwrap();
        assert_eq!(state.previous, Some(root));
        assert_eq!(arena.get(root).unwrap().backup, vec![NodeId::ROOT]);
        assert_eq!(arena.depth(child), 2);
        assert!(child > root);
    }

    #[test]
    fn test_unknown_state() {
        let arena = StateArena::new();
        assert!(arena.get(StateId(7)).is_none());
        assert_eq!(arena.depth(StateId(7)), 0);
        assert!(arena.is_empty());
    }
}
