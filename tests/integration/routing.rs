#![allow(missing_docs)]

use roadgraph::{
    routing::{DijkstraBidirectionRef, Fastest, Path, Shortest, Weighting},
    storage::{EdgeFlags, GraphStorage, LevelGraphStorage, Payload, PointList, RoutingGraph},
    types::{NodeId, Result},
};

fn n(id: u32) -> NodeId {
    NodeId(id)
}

fn ids(path: &Path) -> Vec<u32> {
    path.nodes().iter().map(|node| node.0).collect()
}

fn roads<X: Payload>(g: &mut GraphStorage<X>, edges: &[(u32, u32, f64, bool)]) -> Result<()> {
    for &(a, b, distance, both) in edges {
        g.add_road(n(a), n(b), distance, both)?;
    }
    Ok(())
}

fn plain(edges: &[(u32, u32, f64, bool)]) -> Result<GraphStorage> {
    let mut g: GraphStorage = GraphStorage::in_memory()?;
    roads(&mut g, edges)?;
    Ok(g)
}

const TEST_GRAPH: &[(u32, u32, f64, bool)] = &[
    (0, 1, 7.0, true),
    (0, 4, 6.0, true),
    (1, 4, 2.0, true),
    (1, 5, 8.0, true),
    (1, 2, 2.0, true),
    (2, 5, 5.0, true),
    (2, 3, 2.0, true),
    (3, 5, 2.0, true),
    (3, 7, 10.0, true),
    (4, 6, 4.0, true),
    (4, 5, 7.0, true),
    (5, 6, 2.0, true),
    (5, 7, 1.0, true),
    (6, 7, 5.0, true),
];

const WIKIPEDIA_GRAPH: &[(u32, u32, f64, bool)] = &[
    (0, 1, 7.0, true),
    (0, 2, 9.0, true),
    (0, 5, 14.0, true),
    (1, 2, 10.0, true),
    (1, 3, 15.0, true),
    (2, 5, 2.0, true),
    (2, 3, 11.0, true),
    (3, 4, 6.0, true),
    (4, 5, 9.0, true),
];

//   0-1-2-3-4
//   |     / |
//   |    8  |
//   \   /   /
//    7-6-5-/
fn ring(four_five: f64, five_six: f64) -> Result<GraphStorage> {
    plain(&[
        (0, 1, 100.0, true),
        (1, 2, 1.0, true),
        (2, 3, 1.0, true),
        (3, 4, 1.0, true),
        (4, 5, four_five, true),
        (5, 6, five_six, true),
        (6, 7, 5.0, true),
        (7, 0, 5.0, true),
        (3, 8, 20.0, true),
        (8, 6, 20.0, true),
    ])
}

#[test]
fn shortest_path_on_test_graph() -> Result<()> {
    let g = plain(TEST_GRAPH)?;
    let mut algo = DijkstraBidirectionRef::new(&g);
    let path = algo.calc_path(n(0), n(7))?;
    assert!(path.found());
    assert_eq!(ids(&path), vec![0, 4, 6, 5, 7]);
    assert_eq!(path.weight(), 13.0);
    assert_eq!(path.distance(), 13.0);
    assert_eq!(path.edges().len(), 4);
    assert!((path.time() - 13.0 * 3.6 / 50.0).abs() < 1e-9);
    assert!(algo.calc_visited_nodes() > 0);
    Ok(())
}

#[test]
fn wikipedia_graph_with_and_without_skip_node() -> Result<()> {
    let g = plain(WIKIPEDIA_GRAPH)?;
    let path = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(4))?;
    assert_eq!(ids(&path), vec![0, 2, 5, 4]);
    assert_eq!(path.weight(), 20.0);

    let mut algo = DijkstraBidirectionRef::new(&g);
    algo.add_skip_node(n(5));
    let path = algo.calc_path(n(0), n(4))?;
    assert_eq!(ids(&path), vec![0, 2, 3, 4]);
    assert_eq!(path.weight(), 26.0);
    Ok(())
}

#[test]
fn trivial_requests() -> Result<()> {
    let g = plain(TEST_GRAPH)?;
    let mut algo = DijkstraBidirectionRef::new(&g);

    let same = algo.calc_path(n(0), n(0))?;
    assert!(!same.found());
    assert!(same.nodes().is_empty());
    assert_eq!(same.weight(), 0.0);

    let adjacent = algo.calc_path(n(1), n(2))?;
    assert_eq!(ids(&adjacent), vec![1, 2]);
    assert_eq!(adjacent.weight(), 2.0);
    Ok(())
}

#[test]
fn bidirectional_meeting_in_the_middle() -> Result<()> {
    let g = ring(25.0, 25.0)?;
    let path = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(4))?;
    assert_eq!(ids(&path), vec![0, 7, 6, 8, 3, 4]);
    assert_eq!(path.weight(), 51.0);

    let path = DijkstraBidirectionRef::new(&g).calc_path(n(1), n(2))?;
    assert_eq!(ids(&path), vec![1, 2]);
    assert_eq!(path.weight(), 1.0);

    let g = ring(20.0, 10.0)?;
    let path = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(4))?;
    assert_eq!(ids(&path), vec![0, 7, 6, 5, 4]);
    assert_eq!(path.weight(), 40.0);
    Ok(())
}

fn directed_with_speeds() -> Result<GraphStorage> {
    let mut g: GraphStorage = GraphStorage::in_memory()?;
    let edges: &[(u32, u32, f64, u32, bool)] = &[
        (0, 1, 7000.0, 10, false),
        (0, 4, 5000.0, 20, false),
        (1, 4, 7000.0, 10, true),
        (1, 5, 7000.0, 10, true),
        (1, 2, 20000.0, 10, true),
        (5, 2, 5000.0, 10, false),
        (2, 3, 5000.0, 10, false),
        (5, 3, 11000.0, 20, true),
        (3, 7, 7000.0, 10, false),
        (4, 6, 5000.0, 20, false),
        (5, 4, 7000.0, 10, false),
        (5, 6, 7000.0, 10, false),
        (7, 5, 5000.0, 20, false),
        (6, 7, 5000.0, 20, true),
    ];
    for &(a, b, distance, speed, both) in edges {
        g.add_edge(n(a), n(b), distance, EdgeFlags::new(speed, both))?;
    }
    Ok(g)
}

#[test]
fn fastest_and_shortest_disagree() -> Result<()> {
    let g = directed_with_speeds()?;

    let short = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(3))?;
    assert_eq!(ids(&short), vec![0, 1, 5, 2, 3]);
    assert_eq!(short.weight(), 24000.0);
    assert_eq!(short.distance(), 24000.0);
    assert!((short.time() - 8640.0).abs() < 1e-6);

    let fast = DijkstraBidirectionRef::with_weighting(&g, Fastest).calc_path(n(0), n(3))?;
    assert_eq!(ids(&fast), vec![0, 4, 6, 7, 5, 3]);
    assert!((fast.weight() - 3100.0).abs() < 1e-9);
    assert_eq!(fast.distance(), 31000.0);
    assert!((fast.time() - 5580.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn one_way_traps_are_respected() -> Result<()> {
    let g = plain(&[
        (0, 1, 3.0, false),
        (1, 2, 2.99, false),
        (0, 3, 2.0, false),
        (3, 4, 3.0, false),
        (4, 2, 1.0, false),
    ])?;
    let path = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(2))?;
    assert_eq!(ids(&path), vec![0, 1, 2]);
    assert!((path.weight() - 5.99).abs() < 1e-9);

    let g = plain(&[
        (0, 1, 1.0, false),
        (1, 2, 1.0, false),
        (2, 3, 1.0, false),
        (3, 1, 4.0, true),
    ])?;
    let path = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(3))?;
    assert_eq!(ids(&path), vec![0, 1, 2, 3]);
    assert_eq!(path.weight(), 3.0);
    Ok(())
}

#[test]
fn unreachable_targets_are_not_found() -> Result<()> {
    let g = plain(&[(0, 1, 1.0, false), (1, 2, 1.0, false)])?;
    let path = DijkstraBidirectionRef::new(&g).calc_path(n(0), n(2))?;
    assert_eq!(path.nodes().len(), 3);

    let mut algo = DijkstraBidirectionRef::new(&g);
    algo.add_skip_node(n(1));
    assert!(!algo.calc_path(n(0), n(2))?.found());

    let reverse = DijkstraBidirectionRef::new(&g).calc_path(n(2), n(0))?;
    assert!(!reverse.found());
    assert!(reverse.points().is_empty());

    let g = plain(&[(100, 101, 1.0, true)])?;
    assert!(!DijkstraBidirectionRef::new(&g).calc_path(n(0), n(1))?.found());
    Ok(())
}

fn with_coordinates() -> Result<GraphStorage> {
    let mut g: GraphStorage = GraphStorage::in_memory()?;
    g.set_node(n(0), 0.0, 2.0)?;
    g.set_node(n(1), 0.0, 3.5)?;
    g.set_node(n(2), 1.0, 1.0)?;
    g.set_node(n(3), 1.5, 2.5)?;
    g.set_node(n(4), 0.5, 4.5)?;
    g.add_road(n(0), n(1), 2.0, true)?
        .set_way_geometry(&PointList::from_pairs(&[0.0, 3.0]))?;
    g.add_road(n(2), n(0), 1.0, true)?
        .set_way_geometry(&PointList::from_pairs(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.6]))?;
    g.add_road(n(3), n(1), 10.0, true)?;
    g.add_road(n(4), n(1), 1.0, true)?;
    g.add_road(n(2), n(3), 5.0, true)?;
    g.add_road(n(3), n(4), 5.0, true)?;
    Ok(g)
}

#[test]
fn path_points_include_pillars_in_travel_order() -> Result<()> {
    let g = with_coordinates()?;

    let path = DijkstraBidirectionRef::new(&g).calc_path(n(4), n(0))?;
    assert_eq!(ids(&path), vec![4, 1, 0]);
    let expected = PointList::from_pairs(&[0.5, 4.5, 0.0, 3.5, 0.0, 3.0, 0.0, 2.0]);
    assert!(path.points().approx_eq(&expected, 1e-6), "{:?}", path.points());

    let path = DijkstraBidirectionRef::new(&g).calc_path(n(2), n(1))?;
    assert_eq!(ids(&path), vec![2, 0, 1]);
    let expected = PointList::from_pairs(&[
        1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.6, 0.0, 2.0, 0.0, 3.0, 0.0, 3.5,
    ]);
    assert!(path.points().approx_eq(&expected, 1e-6), "{:?}", path.points());
    Ok(())
}

fn route<G: RoutingGraph, W: Weighting>(graph: &G, weighting: W, from: u32, to: u32) -> Result<Path> {
    DijkstraBidirectionRef::with_weighting(graph, weighting).calc_path(n(from), n(to))
}

#[test]
fn search_runs_on_level_graphs() -> Result<()> {
    let mut g = LevelGraphStorage::in_memory()?;
    roads(&mut g, TEST_GRAPH)?;
    g.set_level(n(5), 4)?;
    let path = route(&g, Shortest, 0, 7)?;
    assert_eq!(ids(&path), vec![0, 4, 6, 5, 7]);
    assert_eq!(path.weight(), 13.0);

    let fast = route(&g, &Fastest, 0, 7)?;
    assert_eq!(ids(&fast), vec![0, 4, 6, 5, 7]);
    assert!((fast.weight() - 13.0 / 25.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn search_survives_compaction() -> Result<()> {
    let mut g = plain(WIKIPEDIA_GRAPH)?;
    g.add_road(n(6), n(0), 1.0, true)?;
    g.add_road(n(6), n(4), 1.0, true)?;
    assert_eq!(ids(&route(&g, Shortest, 0, 4)?), vec![0, 6, 4]);

    g.mark_removed(n(6))?;
    g.optimize()?;
    assert_eq!(g.node_count(), 6);
    let path = route(&g, Shortest, 0, 4)?;
    assert_eq!(ids(&path), vec![0, 2, 5, 4]);
    assert_eq!(path.weight(), 20.0);
    Ok(())
}
