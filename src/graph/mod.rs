//! Graph data model: nodes, their identity, and renderer invalidation.

mod node;
mod registry;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{CanvasError, CanvasResult};

pub use node::{
	NODE_SLOT_HEIGHT, NODE_TITLE_HEIGHT, NODE_WIDTH, Node, NodeFlags, NodeId, Slot, SlotExtra,
	TextMeasure,
};
pub use registry::{NodeDescriptor, NodeKind, NodeStyle, SlotDirection, TypeRegistry};

/// Receiver of layer invalidation requests.
///
/// `true` marks the layer dirty; `false` leaves it alone.
pub trait Invalidate {
	/// Marks the named layers for redraw.
	fn set_dirty(&self, background: bool, foreground: bool);
}

/// State shared between a graph and its nodes' back-references.
#[derive(Default)]
pub(crate) struct GraphShared {
	renderer: RefCell<Option<Rc<dyn Invalidate>>>,
}

impl GraphShared {
	pub(crate) fn notify(&self, background: bool, foreground: bool) {
		if let Some(renderer) = self.renderer.borrow().as_ref() {
			renderer.set_dirty(background, foreground);
		}
	}
}

pub(crate) type GraphLink = Rc<GraphShared>;

/// Ordered set of nodes with sequential identity.
///
/// Iteration order is insertion order, which is also the draw order.
#[derive(Default)]
pub struct Graph {
	last_assigned_id: u32,
	nodes: Vec<Node>,
	nodes_by_id: HashMap<NodeId, usize>,
	link: GraphLink,
}

impl Graph {
	/// Empty graph with no renderer attached.
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes ownership of `node`, assigns it the next id and notifies the
	/// attached renderer that the foreground is stale. Ids are never reused,
	/// so this fails once the id space is used up.
	pub fn add(&mut self, mut node: Node) -> CanvasResult<NodeId> {
		let id = NodeId::after(self.last_assigned_id).ok_or(CanvasError::IdsExhausted)?;
		node.attach(id, self.link.clone());
		self.last_assigned_id = id.get();
		self.nodes_by_id.insert(id, self.nodes.len());
		self.nodes.push(node);
		debug!("added node {} to graph", id);

		self.link.notify(false, true);
		Ok(id)
	}

	/// Binds the renderer that receives future invalidations, replacing any
	/// previous binding. Nothing is marked dirty by the bind itself.
	pub fn attach_renderer(&mut self, renderer: Rc<dyn Invalidate>) {
		debug!("renderer attached to graph");
		*self.link.renderer.borrow_mut() = Some(renderer);
	}

	/// Whether a renderer is bound.
	pub fn has_renderer(&self) -> bool {
		self.link.renderer.borrow().is_some()
	}

	/// Forwards a background invalidation to the attached renderer.
	pub fn mark_dirty(&self, dirty: bool) {
		self.link.notify(dirty, false);
	}

	/// Looks a node up by id.
	pub fn get(&self, id: NodeId) -> Option<&Node> {
		self.nodes_by_id.get(&id).map(|&index| &self.nodes[index])
	}

	/// Mutable lookup by id.
	pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.nodes_by_id
			.get(&id)
			.copied()
			.map(move |index| &mut self.nodes[index])
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Iterator over nodes in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter()
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// The most recently assigned id, 0 when nothing was added.
	pub fn last_assigned_id(&self) -> u32 {
		self.last_assigned_id
	}
}
