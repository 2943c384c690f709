use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn short_side(&self) -> f64 {
        self.w.min(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w && y < self.y + self.h
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = (self.x + self.w).min(other.x + other.w) - self.x.max(other.x);
        let h = (self.y + self.h).min(other.y + other.h) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

/// A node of the weighted hierarchy.
///
/// `weight` and `secondary` are summed bottom-up when the tree is built.
/// `area` and `rect` are written by the squarify pass that lays out this
/// node's parent and are only meaningful after that pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedNode {
    pub name: String,
    pub weight: u64,
    pub secondary: i64,
    pub children: Vec<WeightedNode>,
    pub area: u64,
    pub rect: Rect,
}

impl WeightedNode {
    pub fn leaf(name: impl Into<String>, weight: u64) -> Self {
        Self {
            name: name.into(),
            weight,
            ..Self::default()
        }
    }

    /// Builds an interior node whose weight is `intrinsic` plus the weights of
    /// `children`. Returns `None` if the sum overflows.
    pub fn branch(
        name: impl Into<String>,
        intrinsic: u64,
        children: Vec<WeightedNode>,
    ) -> Option<Self> {
        let mut weight = intrinsic;
        let mut secondary: i64 = 0;
        for child in &children {
            weight = weight.checked_add(child.weight)?;
            secondary = secondary.checked_add(child.secondary)?;
        }
        Some(Self {
            name: name.into(),
            weight,
            secondary,
            children,
            ..Self::default()
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Resolves a path of child indices starting at this node.
    pub fn get(&self, path: &[usize]) -> Option<&WeightedNode> {
        path.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(WeightedNode::node_count).sum::<usize>()
    }

    /// True if every interior node weighs at least as much as its children.
    pub fn check_invariants(&self) -> bool {
        let sum = self
            .children
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.weight));
        match sum {
            Some(sum) => {
                self.weight >= sum && self.children.iter().all(WeightedNode::check_invariants)
            }
            None => false,
        }
    }

    /// Orders every level by descending weight, then descending name.
    pub fn sort_siblings(&mut self) {
        self.children
            .sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| b.name.cmp(&a.name)));
        for child in &mut self.children {
            child.sort_siblings();
        }
    }

    /// Deep copy of the data-model fields. The copy has no layout yet.
    pub fn clone_subtree(&self) -> WeightedNode {
        WeightedNode {
            name: self.name.clone(),
            weight: self.weight,
            secondary: self.secondary,
            children: self.children.iter().map(WeightedNode::clone_subtree).collect(),
            area: 0,
            rect: Rect::default(),
        }
    }
}
