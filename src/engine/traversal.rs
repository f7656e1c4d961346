//! The selection-rule algorithm behind [`super::Engine::tick`] and
//! [`super::Engine::find_next_action`]. Kept free of `Engine` itself so the borrow
//! checker sees `tree`, per-agent `state` and the log sink as independent borrows.

use crate::error::LeafError;
use crate::state::ExecutionState;
use crate::tree::{LeafKind, NodeId, NodeKind, Status, Tree};
use crate::world::WorldPort;

/// What one [`search`] call discovered at (and below) the node it was given.
pub(crate) struct SearchResult {
    /// An uncached Action leaf ready to be invoked by the caller. Only ever set when
    /// `decided` is `None`: a composite that settles a status never also forwards a
    /// pending action.
    pub action: Option<NodeId>,
    /// The status this node settled to during *this* call, whether freshly decided or
    /// read back from `status_cache`.
    pub decided: Option<Status>,
}

impl SearchResult {
    fn leaf_action(node: NodeId) -> Self {
        SearchResult {
            action: Some(node),
            decided: None,
        }
    }
    fn leaf_decided(status: Status) -> Self {
        SearchResult {
            action: None,
            decided: Some(status),
        }
    }
    fn pending() -> Self {
        SearchResult {
            action: None,
            decided: None,
        }
    }
}

fn read_cached(exec: &ExecutionState, node: NodeId, simulate_fresh: bool) -> Option<Status> {
    if simulate_fresh {
        None
    } else {
        exec.cached_status(node)
    }
}

/// Descends from `node`, honoring (and, unless `lookahead`, extending) `exec`'s cache.
///
/// - `lookahead = false`: this is a real tick. Uncached Condition leaves are invoked;
///   composites that finish deciding are cached and emit ENTRY/EXIT through `log`.
/// - `lookahead = true`: a pure look-ahead ([`super::Engine::find_next_action`]). No
///   mutation, no invocation of Condition leaves (an uncached one is treated as still
///   pending), no events.
/// - `simulate_fresh`: read every node as uncached regardless of the real cache, used
///   to preview what a brand-new run (post root-decided reset) would do next, without
///   actually resetting state.
#[allow(clippy::too_many_arguments)]
pub(crate) fn search<W: WorldPort>(
    tree: &mut Tree<W>,
    exec: &mut ExecutionState,
    log: &mut dyn FnMut(String),
    world: &mut W,
    agent: &W::AgentId,
    node: NodeId,
    lookahead: bool,
    simulate_fresh: bool,
) -> Result<SearchResult, LeafError> {
    let kind = tree.node(node).kind();
    match kind {
        NodeKind::Leaf {
            kind: LeafKind::Condition,
        } => {
            if let Some(status) = read_cached(exec, node, simulate_fresh) {
                return Ok(SearchResult::leaf_decided(status));
            }
            if lookahead {
                return Ok(SearchResult::pending());
            }
            let id = tree.node(node).id().to_string();
            let handle = tree.nodes[node.0]
                .behavior
                .as_mut()
                .expect("condition leaf missing behavior");
            let name = handle.log_name();
            let args = handle.log_args();
            let status = handle
                .tick(world, agent)
                .map_err(|source| LeafError {
                    node_id: id.clone(),
                    source,
                })?;
            exec.status_cache.insert(node, status);
            exec.last_executed_leaf = Some(node);
            log(format_leaf_line(agent, &id, &name, args.as_deref(), status));
            Ok(SearchResult::leaf_decided(status))
        }
        NodeKind::Leaf {
            kind: LeafKind::Action,
        } => {
            if let Some(status) = read_cached(exec, node, simulate_fresh) {
                return Ok(SearchResult::leaf_decided(status));
            }
            Ok(SearchResult::leaf_action(node))
        }
        NodeKind::Sequence => {
            enter_composite(exec, log, tree, agent, node, lookahead);
            let children = tree.node(node).children().to_vec();
            for child in children {
                let status = match read_cached(exec, child, simulate_fresh) {
                    Some(status) => status,
                    None => {
                        let result = search(tree, exec, log, world, agent, child, lookahead, simulate_fresh)?;
                        if result.action.is_some() {
                            return Ok(result);
                        }
                        match result.decided {
                            Some(status) => status,
                            None => return Ok(SearchResult::pending()),
                        }
                    }
                };
                match status {
                    Status::Success => continue,
                    Status::Failure => {
                        return Ok(finalize(exec, log, tree, agent, node, Status::Failure, lookahead));
                    }
                }
            }
            Ok(finalize(exec, log, tree, agent, node, Status::Success, lookahead))
        }
        NodeKind::Fallback => {
            enter_composite(exec, log, tree, agent, node, lookahead);
            let children = tree.node(node).children().to_vec();
            for child in children {
                let status = match read_cached(exec, child, simulate_fresh) {
                    Some(status) => status,
                    None => {
                        let result = search(tree, exec, log, world, agent, child, lookahead, simulate_fresh)?;
                        if result.action.is_some() {
                            return Ok(result);
                        }
                        match result.decided {
                            Some(status) => status,
                            None => return Ok(SearchResult::pending()),
                        }
                    }
                };
                match status {
                    Status::Failure => continue,
                    Status::Success => {
                        return Ok(finalize(exec, log, tree, agent, node, Status::Success, lookahead));
                    }
                }
            }
            Ok(finalize(exec, log, tree, agent, node, Status::Failure, lookahead))
        }
        NodeKind::Parallel { k } => {
            enter_composite(exec, log, tree, agent, node, lookahead);
            let children = tree.node(node).children().to_vec();
            let total = children.len() as u32;
            if total == 0 {
                let status = if k == 0 {
                    Status::Success
                } else {
                    Status::Failure
                };
                return Ok(finalize(exec, log, tree, agent, node, status, lookahead));
            }
            let mut successes = 0u32;
            let mut failures = 0u32;
            let mut found_action = None;
            let mut first_uncached_handled = false;
            for child in children {
                match read_cached(exec, child, simulate_fresh) {
                    Some(Status::Success) => successes += 1,
                    Some(Status::Failure) => failures += 1,
                    None => {
                        if first_uncached_handled {
                            continue;
                        }
                        first_uncached_handled = true;
                        let result =
                            search(tree, exec, log, world, agent, child, lookahead, simulate_fresh)?;
                        if result.action.is_some() {
                            found_action = result.action;
                        }
                        match result.decided {
                            Some(Status::Success) => successes += 1,
                            Some(Status::Failure) => failures += 1,
                            None => {}
                        }
                    }
                }
            }
            if successes >= k {
                Ok(finalize(exec, log, tree, agent, node, Status::Success, lookahead))
            } else if failures > total.saturating_sub(k) {
                Ok(finalize(exec, log, tree, agent, node, Status::Failure, lookahead))
            } else {
                Ok(SearchResult {
                    action: found_action,
                    decided: None,
                })
            }
        }
    }
}

fn enter_composite<W: WorldPort>(
    exec: &mut ExecutionState,
    log: &mut dyn FnMut(String),
    tree: &Tree<W>,
    agent: &impl std::fmt::Display,
    node: NodeId,
    lookahead: bool,
) {
    if lookahead || exec.is_open(node) {
        return;
    }
    exec.open_composites.insert(node);
    let node_ref = tree.node(node);
    log(format!(
        "{agent} {} {} ENTRY",
        node_ref.id(),
        node_ref.kind().tag()
    ));
}

fn finalize<W: WorldPort>(
    exec: &mut ExecutionState,
    log: &mut dyn FnMut(String),
    tree: &mut Tree<W>,
    agent: &impl std::fmt::Display,
    node: NodeId,
    status: Status,
    lookahead: bool,
) -> SearchResult {
    if !lookahead {
        exec.status_cache.insert(node, status);
        exec.open_composites.remove(&node);
        let node_ref = tree.node(node);
        log(format!(
            "{agent} {} {} {}",
            node_ref.id(),
            node_ref.kind().tag(),
            status.as_str()
        ));
        if matches!(tree.node(node).kind(), NodeKind::Parallel { .. }) {
            clear_descendants(tree, exec, node);
        }
    }
    SearchResult::leaf_decided(status)
}

fn clear_descendants<W: WorldPort>(tree: &Tree<W>, exec: &mut ExecutionState, node: NodeId) {
    let children = tree.node(node).children().to_vec();
    for child in children {
        exec.status_cache.remove(&child);
        exec.open_composites.remove(&child);
        clear_descendants(tree, exec, child);
    }
}

fn format_leaf_line(
    agent: &impl std::fmt::Display,
    node_id: &str,
    log_name: &str,
    args: Option<&str>,
    status: Status,
) -> String {
    match args {
        Some(args) if !args.is_empty() => {
            format!("{agent} {node_id} {log_name} {args} {}", status.as_str())
        }
        _ => format!("{agent} {node_id} {log_name} {}", status.as_str()),
    }
}

/// Invokes the sole action leaf a `search` call proposed, the single invocation site
/// the whole engine ever calls.
pub(crate) fn invoke_action<W: WorldPort>(
    tree: &mut Tree<W>,
    exec: &mut ExecutionState,
    log: &mut dyn FnMut(String),
    world: &mut W,
    agent: &W::AgentId,
    node: NodeId,
) -> Result<(), LeafError> {
    let id = tree.node(node).id().to_string();
    let handle = tree.nodes[node.0]
        .behavior
        .as_mut()
        .expect("action leaf missing behavior");
    let name = handle.log_name();
    let args = handle.log_args();
    let status = handle.tick(world, agent).map_err(|source| LeafError {
        node_id: id.clone(),
        source,
    })?;
    exec.status_cache.insert(node, status);
    exec.last_executed_leaf = Some(node);
    log(format_leaf_line(agent, &id, &name, args.as_deref(), status));
    Ok(())
}

/// One attempt to fire an action starting from `exec.current`, followed by a cascade
/// pass from the root to flush any ancestor composites the firing just unblocked.
/// Returns `Ok(true)` iff an action was invoked.
pub(crate) fn fire_if_possible<W: WorldPort>(
    tree: &mut Tree<W>,
    exec: &mut ExecutionState,
    log: &mut dyn FnMut(String),
    world: &mut W,
    agent: &W::AgentId,
) -> Result<bool, LeafError> {
    let root = tree.root();
    if exec.cached_status(root).is_some() {
        return Ok(false);
    }
    let start = exec.current;
    let result = search(tree, exec, log, world, agent, start, false, false)?;
    match result.action {
        Some(leaf) => {
            invoke_action(tree, exec, log, world, agent, leaf)?;
            exec.current = root;
            let _ = search(tree, exec, log, world, agent, root, false, false)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
