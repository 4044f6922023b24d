#![allow(missing_docs)]

use roadgraph::{
    storage::{Dir, EdgeState, GraphStorage, LevelGraphStorage, LevelView, Shortcut},
    types::{EdgeId, GraphError, NodeId, Result},
};

fn n(id: u32) -> NodeId {
    NodeId(id)
}

fn adj_ids(g: &LevelGraphStorage, node: NodeId, dir: Dir) -> Result<Vec<u32>> {
    g.edges(node, dir).map(|s| s.map(|s| s.adj.0)).collect()
}

fn state_of(g: &LevelGraphStorage, edge: EdgeId, end: NodeId) -> Result<EdgeState<Shortcut>> {
    g.edge_props(edge, end)?
        .ok_or_else(|| GraphError::Invalid(format!("{end} is not an endpoint of {edge}")))
}

/// Star around node 0: edges 0-1, 0-2 and 0-3, all bidirectional.
fn star() -> Result<LevelGraphStorage> {
    let mut g = LevelGraphStorage::in_memory()?;
    g.add_road(n(0), n(1), 10.0, true)?;
    g.add_road(n(0), n(2), 20.0, true)?;
    g.add_road(n(0), n(3), 30.0, true)?;
    Ok(g)
}

#[test]
fn levels_are_stored_per_node() -> Result<()> {
    let mut g = star()?;
    assert_eq!(g.level(n(2))?, 0);
    g.set_level(n(2), 11)?;
    g.set_level(n(3), -4)?;
    assert_eq!(g.level(n(2))?, 11);
    assert_eq!(g.level(n(3))?, -4);
    assert_eq!(g.level(n(1))?, 0);
    assert!(matches!(g.level(n(4)), Err(GraphError::OutOfBounds(_))));

    g.set_level(n(9), 1)?;
    assert_eq!(g.node_count(), 10);
    assert_eq!(g.level(n(8))?, 0);
    Ok(())
}

#[test]
fn shortcuts_surface_on_iteration() -> Result<()> {
    let mut g = star()?;
    let shortcut = g
        .add_road(n(1), n(2), 30.0, true)?
        .set_skipped_edges(Some(EdgeId(0)), Some(EdgeId(1)))?
        .edge();

    let mut found = false;
    for state in g.edges(n(2), Dir::Both) {
        let state = state?;
        if state.edge == shortcut {
            assert_eq!(state.data.skipped, Some((EdgeId(0), EdgeId(1))));
            assert!(state.data.is_shortcut());
            found = true;
        } else {
            assert!(!state.data.is_shortcut());
        }
    }
    assert!(found);

    let mut cursor = g
        .edge_props_mut(shortcut, n(1))?
        .ok_or_else(|| GraphError::Invalid("shortcut lost".into()))?;
    assert_eq!(cursor.skipped_edges(), Some((EdgeId(0), EdgeId(1))));
    cursor.set_skipped_edges(None, None)?;
    assert!(!cursor.is_shortcut());
    assert!(matches!(
        cursor.set_skipped_edges(None, Some(EdgeId(2))),
        Err(GraphError::Invalid(_))
    ));
    Ok(())
}

#[test]
fn disconnect_from_base_needs_the_real_predecessor() -> Result<()> {
    let mut g = star()?;
    let middle = state_of(&g, EdgeId(1), n(2))?;
    assert_eq!(middle.base, n(0));

    let err = g.disconnect(&middle, None, true).err();
    assert!(matches!(err, Some(GraphError::Invalid(_))));
    let err = g.disconnect(&middle, Some(EdgeId(2)), true).err();
    assert!(matches!(err, Some(GraphError::Invalid(_))));
    assert_eq!(adj_ids(&g, n(0), Dir::Both)?, vec![1, 2, 3]);

    assert_eq!(g.disconnect(&middle, Some(EdgeId(0)), true)?, EdgeId(1));
    assert_eq!(adj_ids(&g, n(0), Dir::Both)?, vec![1, 3]);
    assert_eq!(adj_ids(&g, n(2), Dir::Both)?, vec![0]);
    Ok(())
}

#[test]
fn disconnect_head_of_list() -> Result<()> {
    let mut g = star()?;
    let first = state_of(&g, EdgeId(0), n(1))?;
    g.disconnect(&first, None, true)?;
    assert_eq!(adj_ids(&g, n(0), Dir::Both)?, vec![2, 3]);
    assert_eq!(adj_ids(&g, n(1), Dir::Both)?, vec![0]);
    Ok(())
}

#[test]
fn disconnect_from_adjacent_side_scans_for_predecessor() -> Result<()> {
    let mut g = star()?;
    g.add_road(n(3), n(4), 5.0, true)?;
    let last = state_of(&g, EdgeId(2), n(3))?;

    g.disconnect(&last, None, false)?;
    assert_eq!(adj_ids(&g, n(3), Dir::Both)?, vec![4]);
    assert_eq!(adj_ids(&g, n(0), Dir::Both)?, vec![1, 2, 3]);

    g.disconnect(&last, None, false)?;
    assert_eq!(adj_ids(&g, n(3), Dir::Both)?, vec![4]);
    assert!(g.verify().iter().all(|problem| !problem.contains("node 3")));
    Ok(())
}

#[test]
fn copies_keep_levels_only_between_level_graphs() -> Result<()> {
    let mut g = star()?;
    g.set_level(n(1), 5)?;
    g.edge_props_mut(EdgeId(2), n(3))?
        .ok_or_else(|| GraphError::Invalid("edge 2 lost".into()))?
        .set_skipped_edges(Some(EdgeId(0)), Some(EdgeId(1)))?;

    let mut same = LevelGraphStorage::in_memory()?;
    g.copy_to(&mut same)?;
    assert_eq!(same.level(n(1))?, 5);
    assert_eq!(state_of(&same, EdgeId(2), n(3))?.data.skipped, Some((EdgeId(0), EdgeId(1))));

    let mut plain: GraphStorage = GraphStorage::in_memory()?;
    g.copy_to_generic(&mut plain)?;
    assert_eq!(plain.node_count(), 4);
    assert_eq!(plain.degree(n(0), Dir::Both)?, 3);
    Ok(())
}

fn highest_level_neighbour<G: LevelView>(graph: &G, node: NodeId) -> Result<Option<NodeId>> {
    let mut best: Option<(i32, NodeId)> = None;
    for state in graph.edges(node, Dir::Out) {
        let adj = state?.adj;
        let level = graph.level(adj)?;
        if best.map_or(true, |(top, _)| level > top) {
            best = Some((level, adj));
        }
    }
    Ok(best.map(|(_, node)| node))
}

#[test]
fn level_view_drives_generic_code() -> Result<()> {
    let mut g = star()?;
    g.set_level(n(1), 2)?;
    g.set_level(n(3), 7)?;
    assert_eq!(highest_level_neighbour(&g, n(0))?, Some(n(3)));
    assert_eq!(highest_level_neighbour(&g, n(2))?, Some(n(0)));
    Ok(())
}
