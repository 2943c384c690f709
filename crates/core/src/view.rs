use crate::error::NavError;
use crate::model::{Rect, WeightedNode};
use crate::search::best_match;
use crate::treemap::{layout, Layout, LayoutConfig};

/// One full-viewport view: a private copy of a subtree and its last layout.
#[derive(Debug, Clone)]
pub struct Frame {
    caption: String,
    node: WeightedNode,
    bounds: Rect,
    layout: Layout,
}

impl Frame {
    fn new(caption: String, node: WeightedNode, bounds: Rect, config: &LayoutConfig) -> Self {
        let mut frame = Self {
            caption,
            node,
            bounds,
            layout: Layout::default(),
        };
        frame.relayout(bounds, config);
        frame
    }

    fn relayout(&mut self, bounds: Rect, config: &LayoutConfig) {
        self.bounds = bounds;
        self.layout = layout(&mut self.node, bounds, config);
    }

    pub fn node(&self) -> &WeightedNode {
        &self.node
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }
}

/// Drill-down navigation over a weighted tree.
///
/// Always shows exactly one frame: the last drilled-in frame, or the root
/// frame when nothing is entered. Transitions run to completion on the
/// caller's thread.
#[derive(Debug)]
pub struct TreemapView {
    root: Frame,
    stack: Vec<Frame>,
    viewport: Rect,
    config: LayoutConfig,
}

impl TreemapView {
    pub fn new(root: &WeightedNode, viewport: Rect, config: LayoutConfig) -> Self {
        debug_assert!(root.check_invariants(), "child weights exceed parent weight");
        let mut node = root.clone_subtree();
        node.sort_siblings();
        let frame = Frame::new(String::new(), node, viewport, &config);
        tracing::debug!(nodes = frame.node.node_count(), "treemap view created");
        Self {
            root: frame,
            stack: Vec::new(),
            viewport,
            config,
        }
    }

    pub fn current(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn current_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    /// Number of frames, including the root frame.
    pub fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    pub fn is_top_level(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Captions from the outermost frame to the active one.
    pub fn breadcrumbs(&self) -> Vec<&str> {
        std::iter::once(&self.root)
            .chain(&self.stack)
            .map(Frame::caption)
            .collect()
    }

    /// Drills into the node at `path` inside the active frame. Only nodes
    /// placed by the frame's last layout pass can be entered.
    ///
    /// Returns the node's rectangle in the frame being left, where a renderer
    /// can start its zoom from.
    pub fn enter_child(&mut self, path: &[usize]) -> Result<Rect, NavError> {
        let frame = self.current();
        let origin = frame
            .layout
            .items
            .iter()
            .find(|item| item.path == path)
            .map(|item| item.rect)
            .ok_or_else(|| NavError::NoSuchNode(path.to_vec()))?;
        let selected = frame
            .node
            .get(path)
            .ok_or_else(|| NavError::NoSuchNode(path.to_vec()))?;
        if selected.is_leaf() {
            return Err(NavError::Leaf(selected.name.clone()));
        }
        let node = selected.clone_subtree();
        tracing::debug!(name = %node.name, depth = self.depth(), "entering child");
        let frame = Frame::new(node.name.clone(), node, self.viewport, &self.config);
        self.stack.push(frame);
        Ok(origin)
    }

    /// Returns to the previous frame. `false` if already at the top level.
    pub fn back(&mut self) -> bool {
        if self.stack.pop().is_none() {
            return false;
        }
        let (viewport, config) = (self.viewport, self.config);
        let frame = self.current_mut();
        if frame.bounds != viewport {
            tracing::debug!("viewport changed while away, relaying out");
            frame.relayout(viewport, &config);
        }
        tracing::debug!(depth = self.depth(), "back");
        true
    }

    /// Lays out the active frame for a new viewport. Frames underneath are
    /// refreshed when they become active again. Empty viewports are ignored.
    pub fn resize(&mut self, viewport: Rect) -> bool {
        if viewport.is_empty() {
            return false;
        }
        self.viewport = viewport;
        let config = self.config;
        let frame = self.current_mut();
        if frame.bounds != viewport {
            frame.relayout(viewport, &config);
        }
        true
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        if config == self.config {
            return;
        }
        self.config = config;
        let viewport = self.viewport;
        self.current_mut().relayout(viewport, &config);
        // Frames underneath no longer match the configuration either.
        let below = self.stack.len();
        for frame in std::iter::once(&mut self.root).chain(&mut self.stack).take(below) {
            frame.bounds = Rect::default();
        }
    }

    /// Index of the active frame's child called `query`, exact or fuzzy.
    pub fn find_child(&self, query: &str) -> Option<usize> {
        let children = &self.current().node.children;
        best_match(query, children.iter().map(|c| c.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeightedNode {
        let ns = |name: &str, leaves: &[(&str, u64)]| {
            let leaves = leaves.iter().map(|&(n, w)| WeightedNode::leaf(n, w)).collect();
            WeightedNode::branch(name, 0, leaves).unwrap()
        };
        let system = WeightedNode::branch(
            "System",
            0,
            vec![ns("String", &[("Concat", 40), ("Split", 20)]), ns("Int32", &[("Parse", 10)])],
        )
        .unwrap();
        let io = ns("System.IO", &[("Read", 15), ("Write", 10)]);
        let module = WeightedNode::leaf("<Module>", 5);
        WeightedNode::branch("mscorlib.dll", 0, vec![io, system, module]).unwrap()
    }

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 300.0)
    }

    #[test]
    fn initial_frame_is_sorted_and_laid_out() {
        let view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        assert!(view.is_top_level());
        let names: Vec<_> = view
            .current()
            .node()
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["System", "System.IO", "<Module>"]);
        assert_eq!(view.current().caption(), "");
        assert_eq!(view.current().layout().top_level().count(), 3);
        let sum: u64 = view.current().node().children.iter().map(|c| c.area).sum();
        assert!(sum <= 120_000 && 120_000 - sum < 3);
    }

    #[test]
    fn enter_and_back_round_trip() {
        let tree = sample();
        let mut view = TreemapView::new(&tree, viewport(), LayoutConfig::default());
        let before_node = view.current().node().clone();
        let before_layout = view.current().layout().clone();

        let origin = view.enter_child(&[0]).unwrap();
        assert_eq!(origin, before_node.children[0].rect);
        assert_eq!(view.depth(), 2);
        assert_eq!(view.current().caption(), "System");
        assert_eq!(view.current().bounds(), viewport());
        assert_eq!(view.breadcrumbs(), ["", "System"]);

        assert!(view.back());
        assert!(view.is_top_level());
        assert_eq!(view.current().node(), &before_node);
        assert_eq!(view.current().layout(), &before_layout);
        assert!(!std::ptr::eq(view.current().node(), &tree));
        let mut sorted = tree.clone_subtree();
        sorted.sort_siblings();
        assert_eq!(view.current().node().clone_subtree(), sorted);
    }

    #[test]
    fn drilled_frame_fills_viewport_and_is_independent() {
        let mut view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        let parent_rect = view.current().node().children[0].children[0].rect;
        view.enter_child(&[0]).unwrap();
        let child_total: f64 = view.current().node().children.iter().map(|c| c.rect.area()).sum();
        assert!((child_total - viewport().area()).abs() < 3.0);
        view.back();
        assert_eq!(view.current().node().children[0].children[0].rect, parent_rect);
    }

    #[test]
    fn entering_a_leaf_fails() {
        let mut view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        assert_eq!(view.enter_child(&[2]), Err(NavError::Leaf("<Module>".into())));
        assert_eq!(view.enter_child(&[7]), Err(NavError::NoSuchNode(vec![7])));
        assert_eq!(view.enter_child(&[]), Err(NavError::NoSuchNode(vec![])));
        assert_eq!(view.depth(), 1);
    }

    #[test]
    fn back_at_top_level_is_a_no_op() {
        let mut view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        let before = view.current().layout().clone();
        assert!(!view.back());
        assert_eq!(view.current().layout(), &before);
    }

    #[test]
    fn nested_paths_can_be_entered() {
        let mut view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        view.enter_child(&[0, 0]).unwrap();
        assert_eq!(view.current().caption(), "String");
        assert_eq!(view.breadcrumbs(), ["", "String"]);
    }

    #[test]
    fn hidden_nodes_cannot_be_entered() {
        let deep = LayoutConfig {
            min_recurse_area: 1,
            parallel: false,
        };
        let mut view = TreemapView::new(&sample(), viewport(), deep);
        assert!(view.current().layout().items.iter().any(|i| i.path == [0, 0]));

        view.set_config(LayoutConfig {
            min_recurse_area: u64::MAX,
            parallel: false,
        });
        assert!(view.current().layout().items.iter().all(|i| i.depth == 0));
        assert_eq!(view.enter_child(&[0, 0]), Err(NavError::NoSuchNode(vec![0, 0])));
        assert_eq!(view.depth(), 1);

        let visible = view.current().layout().items[0].rect;
        assert_eq!(view.enter_child(&[0]), Ok(visible));
    }

    #[test]
    fn resize_only_touches_active_frame_until_back() {
        let mut view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        view.enter_child(&[0]).unwrap();
        let bigger = Rect::new(0.0, 0.0, 800.0, 600.0);
        assert!(view.resize(bigger));
        assert_eq!(view.current().bounds(), bigger);
        assert!(view.back());
        assert_eq!(view.current().bounds(), bigger);
        let sum: u64 = view.current().node().children.iter().map(|c| c.area).sum();
        assert!(480_000 - sum < 3);
    }

    #[test]
    fn empty_resize_is_ignored() {
        let mut view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        assert!(!view.resize(Rect::new(0.0, 0.0, 0.0, 100.0)));
        assert_eq!(view.viewport(), viewport());
    }

    #[test]
    fn config_change_refreshes_lower_frames_lazily() {
        let flat = LayoutConfig {
            min_recurse_area: u64::MAX,
            parallel: false,
        };
        let mut view = TreemapView::new(&sample(), viewport(), flat);
        assert_eq!(view.current().layout().items.len(), 3);
        view.enter_child(&[0]).unwrap();
        view.set_config(LayoutConfig::default());
        assert!(view.back());
        assert!(view.current().layout().items.len() > 3);
        assert!(view.current().layout().items.iter().any(|i| i.depth == 2));
    }

    #[test]
    fn find_child_by_name() {
        let view = TreemapView::new(&sample(), viewport(), LayoutConfig::default());
        assert_eq!(view.find_child("System.IO"), Some(1));
        assert_eq!(view.find_child("sysio"), Some(1));
        assert_eq!(view.find_child("zzz"), None);
    }
}
