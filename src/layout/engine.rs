//! The recursive image layout and its navigation cursor.

use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::SlotMap;

use crate::constants::DEFAULT_CLASS_INDEX;

use super::node::{LayoutNode, NodeId, nearest};
use super::shape::{LayoutComponentShape, LayoutPrimitive};

/// Maps every pixel of an image to a spectral class index.
///
/// The layout is a tree of nodes stored in an arena. Each node has its own
/// pixel size, an ordered list of [`LayoutPrimitive`]s and an ordered list of
/// nested sub-layouts, all expressed in the node's own unit square.
///
/// Editing goes through a navigation path: after
/// [`zoom_in_to_sub_layout`](Self::zoom_in_to_sub_layout) every add, generate,
/// reset and read accessor targets the focused sub-layout until
/// [`zoom_out_to_root`](Self::zoom_out_to_root). The root always owns the
/// whole tree; zooming never moves nodes.
#[derive(Debug, Clone)]
pub struct ImageLayout {
    nodes: SlotMap<NodeId, LayoutNode>,
    root: NodeId,
    /// Focused descendants, outermost first. Empty when the root is active.
    focus: Vec<NodeId>,
    pub(crate) rng: StdRng,
}

impl ImageLayout {
    /// Create an empty layout; every pixel maps to the default class.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Create an empty layout whose random generators are reproducible.
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: u32, height: u32, rng: StdRng) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(LayoutNode::new(width, height));
        Self {
            nodes,
            root,
            focus: Vec::new(),
            rng,
        }
    }

    /// Reseed the random layout generator.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub(crate) fn active_id(&self) -> NodeId {
        self.focus.last().copied().unwrap_or(self.root)
    }

    pub(crate) fn active_node(&self) -> &LayoutNode {
        &self.nodes[self.active_id()]
    }

    pub(crate) fn active_node_mut(&mut self) -> &mut LayoutNode {
        let id = self.active_id();
        &mut self.nodes[id]
    }

    /// Append a single-class rectangle to the active node.
    ///
    /// Does not re-render; call [`render`](Self::render) afterwards.
    /// Negative class indices are rejected with a warning.
    pub fn add_layout_primitive(
        &mut self,
        left_x: f64,
        top_y: f64,
        width: f64,
        height: f64,
        class_index: i32,
    ) {
        if class_index < 0 {
            log::warn!("Ignoring layout primitive with negative class index {}", class_index);
            return;
        }
        let shape = LayoutComponentShape::new(left_x, top_y, width, height);
        self.active_node_mut()
            .primitives
            .push(LayoutPrimitive::new(shape, class_index));
    }

    /// Nest a new empty sub-layout in the active node.
    ///
    /// The child's pixel size is the shape's fraction of the active node's
    /// size. Returns the child's handle.
    pub fn add_sub_layout(&mut self, left_x: f64, top_y: f64, width: f64, height: f64) -> NodeId {
        let shape = LayoutComponentShape::new(left_x, top_y, width, height);
        let parent = self.active_id();
        let (child_width, child_height) = child_size(&self.nodes[parent], &shape);
        let child = self.nodes.insert(LayoutNode::new(child_width, child_height));
        self.nodes[parent].sub_layouts.push((shape, child));
        log::debug!(
            "Added {}x{} sub-layout at ({}, {})",
            child_width,
            child_height,
            left_x,
            top_y
        );
        child
    }

    /// Clear the active node: primitives, sub-layouts (and their subtrees),
    /// generated pixel fill, and the class map back to the default index.
    pub fn reset_layout(&mut self) {
        let id = self.active_id();
        let children: Vec<NodeId> = self.nodes[id]
            .sub_layouts
            .drain(..)
            .map(|(_, child)| child)
            .collect();
        for child in children {
            self.remove_subtree(child);
        }
        let node = &mut self.nodes[id];
        node.primitives.clear();
        node.pixel_fill = None;
        let num_pixels = node.num_pixels();
        node.class_map.clear();
        node.class_map.resize(num_pixels, DEFAULT_CLASS_INDEX);
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for (_, child) in node.sub_layouts {
                self.remove_subtree(child);
            }
        }
    }

    /// Focus the first sub-layout of the active node containing the
    /// normalized point `(x, y)`.
    ///
    /// Coordinates are relative to the active node. Returns false, leaving
    /// the focus unchanged, if no sub-layout contains the point.
    pub fn zoom_in_to_sub_layout(&mut self, x: f64, y: f64) -> bool {
        let hit = self
            .active_node()
            .sub_layouts
            .iter()
            .find(|(shape, _)| shape.contains(x, y))
            .map(|(_, child)| *child);
        match hit {
            Some(child) => {
                self.focus.push(child);
                log::debug!("Zoomed into sub-layout (depth {})", self.focus.len());
                true
            }
            None => false,
        }
    }

    /// Step one level back towards the root. Returns false at the root.
    pub fn zoom_out(&mut self) -> bool {
        self.focus.pop().is_some()
    }

    /// Return editing focus to the root.
    pub fn zoom_out_to_root(&mut self) {
        self.focus.clear();
    }

    /// Whether a sub-layout currently has the focus.
    pub fn is_zoomed(&self) -> bool {
        !self.focus.is_empty()
    }

    /// Number of sub-layout levels between the root and the active node.
    pub fn focus_depth(&self) -> usize {
        self.focus.len()
    }

    /// Recompute the class maps of the root and of every focused node.
    ///
    /// Pixels start at the default class (or the generated pixel fill),
    /// primitives are painted in insertion order, and sub-layout regions are
    /// marked with [`SUB_LAYOUT_CLASS_INDEX`](crate::constants::SUB_LAYOUT_CLASS_INDEX).
    /// Use [`render_composited`](Self::render_composited) for the nested
    /// content.
    pub fn render(&mut self) {
        let path: Vec<NodeId> = std::iter::once(self.root)
            .chain(self.focus.iter().copied())
            .collect();
        for id in path {
            self.render_node(id);
        }
    }

    fn render_node(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.class_map = node.paint();
        log::debug!(
            "Rendered {}x{} layout node ({} primitives, {} sub-layouts)",
            node.width,
            node.height,
            node.primitives.len(),
            node.sub_layouts.len()
        );
    }

    /// Flatten the whole tree into a root-sized class map.
    ///
    /// Each sub-layout region receives its child's own composited classes,
    /// nearest-resampled to the region. Stored class maps are not modified.
    pub fn render_composited(&self) -> Vec<i32> {
        self.composite(self.root)
    }

    fn composite(&self, id: NodeId) -> Vec<i32> {
        let node = &self.nodes[id];
        let mut map = node.paint_base();
        for (shape, child_id) in &node.sub_layouts {
            let child = &self.nodes[*child_id];
            let child_map = self.composite(*child_id);
            let (columns, rows) = shape.pixel_bounds(node.width, node.height);
            let region_width = columns.end - columns.start;
            let region_height = rows.end - rows.start;
            node.fill_region(&mut map, shape, |x, y| {
                if child_map.is_empty() {
                    return DEFAULT_CLASS_INDEX;
                }
                let child_x = nearest(x, region_width, child.width);
                let child_y = nearest(y, region_height, child.height);
                child_map[child.map_index(child_x, child_y)]
            });
        }
        map
    }

    /// Resize the root and rescale the tree, then re-render.
    ///
    /// Shapes are normalized, so primitives follow automatically; each
    /// sub-layout's pixel size is recomputed from its shape.
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        let root = self.root;
        self.nodes[root].width = width;
        self.nodes[root].height = height;
        self.rescale_children(root);
        self.render();
    }

    fn rescale_children(&mut self, id: NodeId) {
        let children = self.nodes[id].sub_layouts.clone();
        for (shape, child) in children {
            let (width, height) = child_size(&self.nodes[id], &shape);
            let node = &mut self.nodes[child];
            node.width = width;
            node.height = height;
            self.rescale_children(child);
            self.render_node(child);
        }
    }

    /// Width of the active node in pixels.
    pub fn width(&self) -> u32 {
        self.active_node().width
    }

    /// Height of the active node in pixels.
    pub fn height(&self) -> u32 {
        self.active_node().height
    }

    /// Number of pixels of the active node.
    pub fn num_pixels(&self) -> usize {
        self.active_node().num_pixels()
    }

    /// Rendered class map of the active node, row-major.
    pub fn class_map(&self) -> &[i32] {
        &self.active_node().class_map
    }

    /// Class of pixel `(x, y)` of the active node.
    ///
    /// # Panics
    /// Coordinates are not range checked; out-of-bounds pixels panic.
    pub fn class_at_pixel(&self, x: u32, y: u32) -> i32 {
        self.active().class_at_pixel(x, y)
    }

    /// Row-major index of `(x, y)` in the active node's class map.
    pub fn map_index(&self, x: u32, y: u32) -> usize {
        self.active_node().map_index(x, y)
    }

    /// Primitives of the active node.
    pub fn primitives(&self) -> &[LayoutPrimitive] {
        &self.active_node().primitives
    }

    /// Read-only view of the root node.
    pub fn root(&self) -> LayoutView<'_> {
        LayoutView {
            layout: self,
            id: self.root,
        }
    }

    /// Read-only view of the node currently being edited.
    pub fn active(&self) -> LayoutView<'_> {
        LayoutView {
            layout: self,
            id: self.active_id(),
        }
    }

    /// View of an arbitrary node, if it is still part of the tree.
    pub fn node(&self, id: NodeId) -> Option<LayoutView<'_>> {
        self.nodes
            .contains_key(id)
            .then_some(LayoutView { layout: self, id })
    }

    /// Total number of nodes, root included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn child_size(parent: &LayoutNode, shape: &LayoutComponentShape) -> (u32, u32) {
    let scale = |fraction: f64, dimension: u32| {
        (fraction * f64::from(dimension)).clamp(0.0, f64::from(u32::MAX)) as u32
    };
    (
        scale(shape.width(), parent.width),
        scale(shape.height(), parent.height),
    )
}

/// Borrowed view of one node of an [`ImageLayout`].
#[derive(Debug, Clone, Copy)]
pub struct LayoutView<'a> {
    layout: &'a ImageLayout,
    id: NodeId,
}

impl<'a> LayoutView<'a> {
    fn node(&self) -> &'a LayoutNode {
        &self.layout.nodes[self.id]
    }

    /// Handle of the viewed node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.node().width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.node().height
    }

    /// Number of pixels.
    pub fn num_pixels(&self) -> usize {
        self.node().num_pixels()
    }

    /// Rendered class map, row-major.
    pub fn class_map(&self) -> &'a [i32] {
        &self.node().class_map
    }

    /// Class of pixel `(x, y)`.
    ///
    /// # Panics
    /// Coordinates are not range checked; out-of-bounds pixels panic.
    pub fn class_at_pixel(&self, x: u32, y: u32) -> i32 {
        let node = self.node();
        node.class_map[node.map_index(x, y)]
    }

    /// Row-major index of `(x, y)`.
    pub fn map_index(&self, x: u32, y: u32) -> usize {
        self.node().map_index(x, y)
    }

    /// Primitives in paint order.
    pub fn primitives(&self) -> &'a [LayoutPrimitive] {
        &self.node().primitives
    }

    /// Nested sub-layouts with the shapes they occupy.
    pub fn sub_layouts(self) -> impl Iterator<Item = (LayoutComponentShape, LayoutView<'a>)> + 'a {
        let layout = self.layout;
        layout.nodes[self.id]
            .sub_layouts
            .iter()
            .map(move |(shape, id)| (*shape, LayoutView { layout, id: *id }))
    }
}
