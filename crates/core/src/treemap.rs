use rayon::prelude::*;
use serde::Serialize;

use crate::model::{Rect, WeightedNode};

pub const DEFAULT_MIN_RECURSE_AREA: u64 = 9000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Children with a smaller assigned area are not subdivided further.
    pub min_recurse_area: u64,
    /// Subdivide sibling subtrees on the rayon pool.
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_recurse_area: DEFAULT_MIN_RECURSE_AREA,
            parallel: false,
        }
    }
}

impl LayoutConfig {
    fn recurses_into(&self, node: &WeightedNode) -> bool {
        node.area >= self.min_recurse_area && !node.children.is_empty()
    }
}

/// One visible rectangle of a layout pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutItem {
    /// Child indices from the laid-out root to this node.
    pub path: Vec<usize>,
    pub depth: usize,
    pub name: String,
    pub weight: u64,
    pub secondary: i64,
    pub area: u64,
    pub rect: Rect,
    pub drillable: bool,
}

/// Geometry produced by one pass, in pre-order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Layout {
    pub bounds: Rect,
    pub items: Vec<LayoutItem>,
}

impl Layout {
    /// Deepest visible item under the point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&LayoutItem> {
        // Siblings never overlap, so the last pre-order hit is the deepest.
        self.items.iter().rev().find(|item| item.rect.contains(x, y))
    }

    /// Deepest visible item under the point that can be entered.
    pub fn drill_target(&self, x: f64, y: f64) -> Option<&LayoutItem> {
        self.items
            .iter()
            .rev()
            .find(|item| item.drillable && item.rect.contains(x, y))
    }

    pub fn top_level(&self) -> impl Iterator<Item = &LayoutItem> {
        self.items.iter().filter(|item| item.depth == 0)
    }
}

/// Lays out `root.children` inside `bounds` and returns the visible geometry.
pub fn layout(root: &mut WeightedNode, bounds: Rect, config: &LayoutConfig) -> Layout {
    squarify(&mut root.children, bounds, config);
    let mut items = Vec::new();
    let mut path = Vec::new();
    collect(&root.children, config, &mut path, &mut items);
    tracing::trace!(items = items.len(), w = bounds.w, h = bounds.h, "layout pass");
    Layout { bounds, items }
}

fn collect(
    children: &[WeightedNode],
    config: &LayoutConfig,
    path: &mut Vec<usize>,
    out: &mut Vec<LayoutItem>,
) {
    for (i, child) in children.iter().enumerate() {
        path.push(i);
        out.push(LayoutItem {
            path: path.clone(),
            depth: path.len() - 1,
            name: child.name.clone(),
            weight: child.weight,
            secondary: child.secondary,
            area: child.area,
            rect: child.rect,
            drillable: !child.children.is_empty(),
        });
        if config.recurses_into(child) {
            collect(&child.children, config, path, out);
        }
        path.pop();
    }
}

/// Assigns every node in `children` a rectangle inside `bounds`, then
/// subdivides the children that are large enough.
///
/// `children` must already be in display order (see
/// [`WeightedNode::sort_siblings`]).
pub fn squarify(children: &mut [WeightedNode], bounds: Rect, config: &LayoutConfig) {
    if children.is_empty() {
        return;
    }
    assign_areas(children, bounds);
    place_rows(children, bounds);

    let recurse = |child: &mut WeightedNode| {
        if config.recurses_into(child) {
            let rect = child.rect;
            squarify(&mut child.children, rect, config);
        }
    };
    if config.parallel {
        children.par_iter_mut().for_each(recurse);
    } else {
        children.iter_mut().for_each(recurse);
    }
}

fn assign_areas(children: &mut [WeightedNode], bounds: Rect) {
    let available = bounds.area().floor() as u128;
    let total: u128 = children.iter().map(|c| c.weight as u128).sum();
    if total == 0 {
        // No proportional basis: split evenly.
        let share = saturate(available / children.len() as u128);
        for child in children.iter_mut() {
            child.area = share;
        }
        return;
    }
    let (q, r) = (available / total, available % total);
    for child in children.iter_mut() {
        let w = child.weight as u128;
        // floor(available * w / total) without forming the full product.
        let area = q * w + mul_div(r, w, total);
        child.area = saturate(area);
    }
}

fn saturate(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

/// `floor(a * b / c)` for `a < c` and `b <= c`.
fn mul_div(a: u128, b: u128, c: u128) -> u128 {
    if let Some(p) = a.checked_mul(b) {
        return p / c;
    }
    // Shift-and-add over the bits of `b`, keeping the running product as
    // `quot * c + rem` with `rem < c`.
    let (mut quot, mut rem) = (0u128, 0u128);
    for bit in (0..u128::BITS - b.leading_zeros()).rev() {
        quot *= 2;
        if rem >= c - rem {
            rem -= c - rem;
            quot += 1;
        } else {
            rem *= 2;
        }
        if (b >> bit) & 1 == 1 {
            if rem >= c - a {
                rem -= c - a;
                quot += 1;
            } else {
                rem += a;
            }
        }
    }
    quot
}

/// Greedy row building. The current row is always `children[start..end]`.
fn place_rows(children: &mut [WeightedNode], bounds: Rect) {
    let mut remaining = bounds;
    let mut start = 0;
    let mut end = 0;
    while end < children.len() {
        let side = remaining.short_side();
        let grows = start == end
            || worst_ratio(&children[start..end], side) > worst_ratio(&children[start..=end], side);
        if grows {
            end += 1;
        } else {
            remaining = layout_row(remaining, &mut children[start..end]);
            start = end;
        }
    }
    if start < end {
        layout_row(remaining, &mut children[start..end]);
    }
}

/// Squarified badness of laying `row` along a side of length `side`.
/// Infinite when the row cannot be measured (zero side or zero areas), which
/// makes the caller close the row.
pub fn worst_ratio(row: &[WeightedNode], side: f64) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    let (mut max, mut min, mut total) = (0.0f64, f64::MAX, 0.0f64);
    for node in row {
        let a = node.area as f64;
        max = max.max(a);
        min = min.min(a);
        total += a;
    }
    if side <= 0.0 || total <= 0.0 || min <= 0.0 {
        return f64::INFINITY;
    }
    let s2 = side * side;
    let t2 = total * total;
    (s2 * max / t2).max(t2 / (s2 * min))
}

/// Places `row` as a strip along the long edge of `bounds` and returns what is left.
fn layout_row(bounds: Rect, row: &mut [WeightedNode]) -> Rect {
    let used: f64 = row.iter().map(|n| n.area as f64).sum();
    if bounds.w > bounds.h {
        let strip = if bounds.h > 0.0 { used / bounds.h } else { 0.0 };
        let mut y = bounds.y;
        for node in row.iter_mut() {
            let h = if used > 0.0 { node.area as f64 * bounds.h / used } else { 0.0 };
            node.rect = Rect::new(bounds.x, y, strip, h);
            y += h;
        }
        Rect::new(bounds.x + strip, bounds.y, (bounds.w - strip).max(0.0), bounds.h)
    } else {
        let strip = if bounds.w > 0.0 { used / bounds.w } else { 0.0 };
        let mut x = bounds.x;
        for node in row.iter_mut() {
            let w = if used > 0.0 { node.area as f64 * bounds.w / used } else { 0.0 };
            node.rect = Rect::new(x, bounds.y, w, strip);
            x += w;
        }
        Rect::new(bounds.x, bounds.y + strip, bounds.w, (bounds.h - strip).max(0.0))
    }
}
