//! Tests for the visible-subtree layout

use std::collections::BTreeSet;

use catmap::domain::{
    build_tree, layout, layout_default, LayoutForest, LayoutOracle, NodeKind, NodeMetrics,
    Perspective, Position, RawCatalogRecord, ViewTree,
};
use catmap::util::testing;

fn scenario_tree() -> ViewTree {
    let records = vec![
        RawCatalogRecord::new("r1", "Catalog1")
            .with_department("d1", "Dept1")
            .with_main_business("m1", "Proc1")
            .with_business_model("b1", "Model1")
            .with_data_catalog("dc1", "Table1"),
        RawCatalogRecord::new("r2", "Catalog2")
            .with_department("d1", "Dept1")
            .with_main_business("m2", "Proc2")
            .with_business_model("b2", "Model2"),
    ];
    build_tree(&records, Perspective::Organization)
}

fn visible_ids(tree: &ViewTree) -> BTreeSet<String> {
    layout_default(tree)
        .nodes
        .into_iter()
        .map(|n| n.id)
        .collect()
}

fn edge_ids(tree: &ViewTree) -> BTreeSet<String> {
    layout_default(tree).edges.iter().map(|e| e.id()).collect()
}

#[test]
fn given_expanded_tree_when_laying_out_then_every_node_and_relation_is_visible() {
    testing::init_test_setup();
    // Arrange
    let tree = scenario_tree();

    // Act
    let result = layout_default(&tree);

    // Assert
    assert_eq!(result.nodes.len(), tree.len());
    assert_eq!(result.edges.len(), tree.len() - 1);
    assert!(result.edges.iter().any(|e| e.id() == "d1->m1"));
}

#[test]
fn given_collapsed_node_when_laying_out_then_only_descendants_disappear() {
    testing::init_test_setup();
    // Arrange
    let mut tree = scenario_tree();
    let before_nodes = visible_ids(&tree);
    let before_edges = edge_ids(&tree);

    // Act
    tree.toggle_collapse("m1").unwrap();
    let collapsed_nodes = visible_ids(&tree);
    let collapsed_edges = edge_ids(&tree);

    // Assert
    for hidden in ["b1", "r1", "dc1"] {
        assert!(!collapsed_nodes.contains(hidden), "{hidden} should be hidden");
    }
    for shown in ["d1", "m1", "m2", "b2", "r2"] {
        assert!(collapsed_nodes.contains(shown), "{shown} should be visible");
    }
    assert!(collapsed_edges.contains("d1->m1"));
    assert!(!collapsed_edges.contains("m1->b1"));
    assert!(collapsed_edges.iter().all(|e| !e.contains("r1")));

    // Act: expand again
    tree.toggle_collapse("m1").unwrap();

    // Assert
    assert_eq!(visible_ids(&tree), before_nodes);
    assert_eq!(edge_ids(&tree), before_edges);
}

#[test]
fn given_nested_collapse_when_parent_reexpanded_then_child_stays_collapsed() {
    testing::init_test_setup();
    let mut tree = scenario_tree();
    tree.toggle_collapse("b1").unwrap();
    tree.toggle_collapse("m1").unwrap();

    tree.toggle_collapse("m1").unwrap();
    let visible = visible_ids(&tree);

    assert!(visible.contains("b1"));
    assert!(!visible.contains("r1"));
    assert_eq!(tree.is_collapsed("b1"), Some(true));
}

#[test]
fn given_fixed_tree_when_laying_out_twice_then_positions_match() {
    testing::init_test_setup();
    let tree = scenario_tree();

    let first = layout_default(&tree);
    let second = layout_default(&tree);

    assert_eq!(first, second);
}

#[test]
fn given_parent_and_child_when_laid_out_then_child_is_one_width_plus_gap_right() {
    testing::init_test_setup();
    // Arrange
    let tree = scenario_tree();
    let metrics = NodeMetrics::default();

    // Act
    let result = layout_default(&tree);

    // Assert
    let d1 = result.node("d1").unwrap();
    let m1 = result.node("m1").unwrap();
    let m2 = result.node("m2").unwrap();
    assert_eq!(d1.x, 0.0);
    assert_eq!(m1.x, d1.width + metrics.h_gap);
    assert_eq!(m1.x, m2.x);
    assert!(m2.y >= m1.y + m1.height + metrics.v_gap);
    assert_eq!(m1.parent_id.as_deref(), Some("d1"));
    assert_eq!(m1.width, metrics.size_of(NodeKind::Process).width);
}

#[test]
fn given_collapsed_node_when_laid_out_then_badge_counts_hidden_catalogs() {
    testing::init_test_setup();
    let mut tree = scenario_tree();
    tree.toggle_collapse("m1").unwrap();

    let result = layout_default(&tree);

    let m1 = result.node("m1").unwrap();
    assert!(m1.collapsed);
    assert_eq!(m1.child_count, 1);
    assert_eq!(m1.catalog_count, 2);
}

#[test]
fn given_empty_tree_when_laying_out_then_layout_is_empty() {
    testing::init_test_setup();
    let tree = build_tree(&[], Perspective::Organization);

    let result = layout_default(&tree);

    assert!(result.is_empty());
    assert!(result.nodes.is_empty());
    assert!(result.edges.is_empty());
}

#[test]
fn given_fan_in_node_when_laid_out_then_placed_once_with_edge_per_parent() {
    testing::init_test_setup();
    // Arrange
    let records = vec![
        RawCatalogRecord::new("r1", "C1")
            .with_department("d1", "Dept1")
            .with_data_catalog("dc", "Shared"),
        RawCatalogRecord::new("r2", "C2")
            .with_department("d1", "Dept1")
            .with_data_catalog("dc", "Shared"),
    ];
    let tree = build_tree(&records, Perspective::Organization);

    // Act
    let result = layout_default(&tree);

    // Assert
    assert_eq!(result.nodes.iter().filter(|n| n.id == "dc").count(), 1);
    assert_eq!(result.node("dc").unwrap().parent_id.as_deref(), Some("r1"));
    let ids: Vec<String> = result.edges.iter().map(|e| e.id()).collect();
    assert!(ids.contains(&"r1->dc".to_string()));
    assert!(ids.contains(&"r2->dc".to_string()));
}

struct DiagonalOracle;

impl LayoutOracle for DiagonalOracle {
    fn position(&self, forest: &LayoutForest, _metrics: &NodeMetrics) -> Vec<Position> {
        (0..forest.slots.len())
            .map(|i| Position {
                x: i as f64,
                y: i as f64,
            })
            .collect()
    }
}

#[test]
fn given_custom_oracle_when_laying_out_then_its_positions_are_used() {
    testing::init_test_setup();
    let tree = scenario_tree();

    let result = layout(&tree, &NodeMetrics::default(), &DiagonalOracle);

    for (i, node) in result.nodes.iter().enumerate() {
        assert_eq!(node.x, i as f64);
        assert_eq!(node.y, i as f64);
    }
}
