use proptest::prelude::*;
use treemap_core::{layout, LayoutConfig, Rect, TreemapView, WeightedNode};

fn flat(weights: &[u64]) -> WeightedNode {
    let children = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| WeightedNode::leaf(format!("n{i:02}"), w))
        .collect();
    let mut root = WeightedNode::branch("", 0, children).unwrap();
    root.sort_siblings();
    root
}

fn nested(groups: &[Vec<u64>]) -> WeightedNode {
    let children = groups
        .iter()
        .enumerate()
        .map(|(i, ws)| {
            let leaves = ws
                .iter()
                .enumerate()
                .map(|(j, &w)| WeightedNode::leaf(format!("f{j}"), w))
                .collect();
            WeightedNode::branch(format!("d{i}"), 0, leaves).unwrap()
        })
        .collect();
    let mut root = WeightedNode::branch("", 0, children).unwrap();
    root.sort_siblings();
    root
}

proptest! {
    #[test]
    fn areas_are_conserved(
        weights in prop::collection::vec(0u64..1000, 1..30),
        w in 1u32..800,
        h in 1u32..800,
    ) {
        let mut root = flat(&weights);
        let bounds = Rect::new(0.0, 0.0, w as f64, h as f64);
        layout(&mut root, bounds, &LayoutConfig::default());
        let total = (w as u64) * (h as u64);
        let sum: u64 = root.children.iter().map(|c| c.area).sum();
        prop_assert!(sum <= total);
        prop_assert!(total - sum < weights.len() as u64);
    }

    #[test]
    fn siblings_tile_without_overlap(
        weights in prop::collection::vec(1u64..500, 1..25),
        w in 10u32..600,
        h in 10u32..600,
    ) {
        let mut root = flat(&weights);
        let bounds = Rect::new(5.0, 7.0, w as f64, h as f64);
        layout(&mut root, bounds, &LayoutConfig::default());
        let kids = &root.children;
        let eps = 1e-6 * bounds.area();
        for (i, a) in kids.iter().enumerate() {
            prop_assert!(a.rect.w >= 0.0 && a.rect.h >= 0.0);
            prop_assert!(a.rect.x >= bounds.x - 1e-6 && a.rect.y >= bounds.y - 1e-6);
            prop_assert!((a.rect.area() - a.area as f64).abs() <= 1e-6 * bounds.area() + 1e-6);
            for b in &kids[i + 1..] {
                prop_assert!(a.rect.intersection_area(&b.rect) <= eps);
            }
        }
        let covered: f64 = kids.iter().map(|c| c.rect.area()).sum();
        prop_assert!(bounds.area() - covered < kids.len() as f64 + 1e-6);
    }

    #[test]
    fn layout_is_deterministic(
        groups in prop::collection::vec(prop::collection::vec(0u64..300, 0..6), 1..8),
    ) {
        let bounds = Rect::new(0.0, 0.0, 1024.0, 768.0);
        let config = LayoutConfig { min_recurse_area: 100, parallel: false };
        let mut a = nested(&groups);
        let first = layout(&mut a, bounds, &config);
        let second = layout(&mut a, bounds, &config);
        prop_assert_eq!(&first, &second);

        let mut b = nested(&groups);
        let parallel = layout(&mut b, bounds, &LayoutConfig { parallel: true, ..config });
        prop_assert_eq!(first, parallel);
    }
}

#[test]
fn equal_weights_with_double_weight_sibling() {
    let mut root = flat(&[200, 100, 100]);
    layout(&mut root, Rect::new(0.0, 0.0, 300.0, 200.0), &LayoutConfig::default());
    let a = root.children[0].area as i64;
    let b = root.children[1].area as i64;
    assert!((a - 2 * b).abs() <= 1);
}

#[test]
fn drill_down_scenario() {
    let tree = nested(&[vec![40, 20], vec![30], vec![]]);
    let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
    let config = LayoutConfig {
        min_recurse_area: 3000,
        parallel: false,
    };
    let mut view = TreemapView::new(&tree, viewport, config);
    let names: Vec<_> = view.current().layout().items.iter().map(|i| i.name.as_str()).collect();
    // d0 (6666) and d1 (3333) recurse; d2 has nothing to show.
    assert_eq!(names, ["d0", "f0", "f1", "d1", "f0", "d2"]);

    let target = {
        let d0 = view.current().node().children[0].rect;
        view.current()
            .layout()
            .drill_target(d0.x + d0.w / 2.0, d0.y + d0.h / 2.0)
            .map(|i| i.path.clone())
            .unwrap()
    };
    assert_eq!(target, [0]);
    view.enter_child(&target).unwrap();
    let areas: Vec<_> = view.current().node().children.iter().map(|c| c.area).collect();
    assert_eq!(areas, [6666, 3333]);
    assert!(view.back());
    assert!(!view.back());
}
