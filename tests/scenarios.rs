//! Integration tests reproducing the engine's documented tick scenarios end to end,
//! using the `RecordingWorld`/`ScriptedCondition`/`FailingAction` test doubles.

use std::sync::{Arc, Mutex};

use ladybug_engine::behavior::test_support::{FailingAction, RecordingWorld, ScriptedStatus};
use ladybug_engine::behavior::LeafBehaviorHandle;
use ladybug_engine::editor::{insert_sibling_right_of, SubtreeBuilder};
use ladybug_engine::engine::Engine;
use ladybug_engine::state::Progress;
use ladybug_engine::tree::{LeafKind, NodeKind, Status, Tree};

type Cond = ladybug_engine::behavior::test_support::ScriptedCondition;

fn sink() -> (Box<dyn FnMut(String) + Send>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    let sink: Box<dyn FnMut(String) + Send> = Box::new(move |line| log_clone.lock().unwrap().push(line));
    (sink, log)
}

/// Sequence[c1 success, a1 success]: both leaves decide within one tick, and so does
/// the root. The whole thing completes in a single `tick`.
#[test]
fn scenario_a_sequence_success() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Sequence).unwrap();
    let c1 = tree
        .new_leaf(
            "c1",
            LeafKind::Condition,
            LeafBehaviorHandle::new(Cond::new("c1", ScriptedStatus::Success)),
        )
        .unwrap();
    let a1 = tree
        .new_leaf(
            "a1",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a1", ScriptedStatus::Success)),
        )
        .unwrap();
    tree.append_child(tree.root(), c1).unwrap();
    tree.append_child(tree.root(), a1).unwrap();

    let (log_sink, log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();

    let progress = engine.tick(&mut world, &"1").unwrap();
    assert_eq!(progress, Progress::Executed);

    let lines = log.lock().unwrap().clone();
    assert_eq!(
        lines,
        vec![
            "1 root sequence ENTRY",
            "1 c1 c1 SUCCESS",
            "1 a1 a1 SUCCESS",
            "1 root sequence SUCCESS",
        ]
    );

    let root = engine.tree().root();
    assert_eq!(engine.state_of(&"1").cached_status(root), Some(Status::Success));
}

/// Fallback[c1 failure, a1 success]. The failing condition doesn't stop the
/// fallback; the first successful leaf after it decides the whole node Success.
#[test]
fn scenario_b_fallback_recovers() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Fallback).unwrap();
    let c1 = tree
        .new_leaf(
            "c1",
            LeafKind::Condition,
            LeafBehaviorHandle::new(Cond::new("c1", ScriptedStatus::Failure)),
        )
        .unwrap();
    let a1 = tree
        .new_leaf(
            "a1",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a1", ScriptedStatus::Success)),
        )
        .unwrap();
    tree.append_child(tree.root(), c1).unwrap();
    tree.append_child(tree.root(), a1).unwrap();

    let (log_sink, log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();

    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);

    let lines = log.lock().unwrap().clone();
    assert_eq!(
        lines,
        vec![
            "1 root fallback ENTRY",
            "1 c1 c1 FAILURE",
            "1 a1 a1 SUCCESS",
            "1 root fallback SUCCESS",
        ]
    );
}

/// Parallel(k=2)[a1, a2, a3], all actions succeeding: it takes two ticks to reach the
/// k-of-3 success bound, a third starts a fresh run.
#[test]
fn scenario_c_parallel_interleaves_across_ticks() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Parallel { k: 2 }).unwrap();
    let mut children = Vec::new();
    for name in ["a1", "a2", "a3"] {
        let leaf = tree
            .new_leaf(
                name,
                LeafKind::Action,
                LeafBehaviorHandle::new(Cond::new(name, ScriptedStatus::Success)),
            )
            .unwrap();
        tree.append_child(tree.root(), leaf).unwrap();
        children.push(leaf);
    }

    let (log_sink, log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();
    let root = engine.tree().root();

    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);
    assert!(engine.state_of(&"1").cached_status(root).is_none());

    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);
    assert_eq!(engine.state_of(&"1").cached_status(root), Some(Status::Success));
    for &child in &children {
        assert!(engine.state_of(&"1").cached_status(child).is_none());
    }

    let lines_after_two = log.lock().unwrap().clone();
    assert_eq!(lines_after_two.last().unwrap(), "1 root parallel SUCCESS");

    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);
    let last_line = log.lock().unwrap().last().unwrap().clone();
    assert_eq!(last_line, "1 a1 a1 SUCCESS");
}

/// `jump_to` a non-first child of a Sequence: the next tick fires it directly and
/// (via the cascade pass) the whole sequence finishes deciding in that same tick.
#[test]
fn scenario_d_jump_to_fires_target_and_cascades() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Sequence).unwrap();
    let mut leaves = Vec::new();
    for name in ["a1", "a2", "a3"] {
        let leaf = tree
            .new_leaf(
                name,
                LeafKind::Action,
                LeafBehaviorHandle::new(Cond::new(name, ScriptedStatus::Success)),
            )
            .unwrap();
        tree.append_child(tree.root(), leaf).unwrap();
        leaves.push(leaf);
    }

    let (log_sink, _log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();
    let root = engine.tree().root();

    assert!(engine.jump_to(&"1", "a3"));
    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);

    let state = engine.state_of(&"1");
    assert_eq!(state.cached_status(leaves[0]), Some(Status::Success));
    assert_eq!(state.cached_status(leaves[1]), Some(Status::Success));
    assert_eq!(state.cached_status(leaves[2]), Some(Status::Success));
    assert_eq!(state.cached_status(root), Some(Status::Success));
}

/// After the tail action of a Sequence fires, `find_next_action` keeps returning that
/// same leaf rather than the successor a fresh run would propose.
#[test]
fn scenario_e_head_query_sticks_to_tail_action() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Sequence).unwrap();
    let a1 = tree
        .new_leaf(
            "a1",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a1", ScriptedStatus::Success)),
        )
        .unwrap();
    let a2 = tree
        .new_leaf(
            "a2",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a2", ScriptedStatus::Success)),
        )
        .unwrap();
    tree.append_child(tree.root(), a1).unwrap();
    tree.append_child(tree.root(), a2).unwrap();

    let (log_sink, _log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();

    engine.tick(&mut world, &"1").unwrap();
    engine.tick(&mut world, &"1").unwrap();

    let next = engine.find_next_action(&mut world, &"1").unwrap().unwrap();
    assert_eq!(next.id, "a2");
    // Calling it again must not mutate anything: same answer, no new events.
    let next_again = engine.find_next_action(&mut world, &"1").unwrap().unwrap();
    assert_eq!(next_again.id, "a2");
}

/// The tree editor splices a sibling in without disturbing an agent already mid-run
/// on the same tree; the new node only shows up once the iterating composite reaches
/// that far.
#[test]
fn scenario_f_editor_inserts_sibling() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Sequence).unwrap();
    let a1 = tree
        .new_leaf(
            "a1",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a1", ScriptedStatus::Success)),
        )
        .unwrap();
    tree.append_child(tree.root(), a1).unwrap();

    let mut builder = SubtreeBuilder::new(&mut tree);
    let a2 = builder
        .leaf(
            "a2",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a2", ScriptedStatus::Success)),
        )
        .unwrap();
    let subtree = builder.finish(a2);
    insert_sibling_right_of(&mut tree, "a1", subtree).unwrap();

    assert_eq!(tree.node(tree.root()).children_count(), 2);
    assert_eq!(tree.find_by_id("a2").unwrap().node_id(), a2);

    let (log_sink, _log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();

    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);
    assert_eq!(engine.tick(&mut world, &"1").unwrap(), Progress::Executed);
    let root = engine.tree().root();
    assert_eq!(engine.state_of(&"1").cached_status(root), Some(Status::Success));
}

/// A failing action leaf surfaces as a `LeafError` and does not get cached, so a
/// later retry of the same tick sequence can still succeed once the world cooperates.
#[test]
fn failing_action_propagates_leaf_error() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Sequence).unwrap();
    let a1 = tree
        .new_leaf(
            "a1",
            LeafKind::Action,
            LeafBehaviorHandle::new(FailingAction::new("a1")),
        )
        .unwrap();
    tree.append_child(tree.root(), a1).unwrap();

    let (log_sink, _log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();

    let err = engine.tick(&mut world, &"1").unwrap_err();
    assert_eq!(err.node_id, "a1");
    assert!(engine.state_of(&"1").cached_status(a1).is_none());
}

/// `reset` is idempotent and forces a fresh run even mid-way through one.
#[test]
fn reset_is_idempotent() {
    let mut tree: Tree<RecordingWorld> = Tree::new("root", NodeKind::Sequence).unwrap();
    let a1 = tree
        .new_leaf(
            "a1",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a1", ScriptedStatus::Success)),
        )
        .unwrap();
    let a2 = tree
        .new_leaf(
            "a2",
            LeafKind::Action,
            LeafBehaviorHandle::new(Cond::new("a2", ScriptedStatus::Success)),
        )
        .unwrap();
    tree.append_child(tree.root(), a1).unwrap();
    tree.append_child(tree.root(), a2).unwrap();

    let (log_sink, _log) = sink();
    let mut engine = Engine::new(tree, log_sink);
    let mut world = RecordingWorld::new();

    engine.tick(&mut world, &"1").unwrap();
    engine.reset(&"1");
    engine.reset(&"1");
    let root = engine.tree().root();
    assert!(engine.state_of(&"1").cached_status(root).is_none());
    assert!(engine.state_of(&"1").cached_status(a1).is_none());
}
