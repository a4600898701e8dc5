//! Node-type table and slot-type side table.
//!
//! One [`TypeRegistry`] is built at application start and handed to every
//! node at construction. Cloning it clones the handle, not the tables.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use log::debug;

use super::node::Node;
use crate::error::{CanvasError, CanvasResult};

/// Type-level colours a node kind may supply.
///
/// Each field is the middle step of the colour lookup: an instance override
/// wins over it, and the renderer's global default is used when it is unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeStyle {
	/// Outline colour.
	pub color: Option<String>,
	/// Body fill colour.
	pub bg_color: Option<String>,
	/// Title bar fill colour.
	pub title_color: Option<String>,
}

/// Static description of a node kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDescriptor {
	/// Registry key, e.g. `basic/sum`.
	pub type_name: String,
	/// Title shown when an instance sets none.
	pub title: Option<String>,
	/// Type-level colours.
	pub style: NodeStyle,
}

impl NodeDescriptor {
	/// Descriptor with no title and no colours.
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			title: None,
			style: NodeStyle::default(),
		}
	}

	/// Sets the type-level title.
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Sets the type-level colours.
	pub fn with_style(mut self, style: NodeStyle) -> Self {
		self.style = style;
		self
	}
}

/// A concrete node variant.
///
/// Implementors describe themselves through a [`NodeDescriptor`] and declare
/// their slots in [`NodeKind::init`], which runs once per created node.
pub trait NodeKind {
	/// The kind's type name, title and colours.
	fn descriptor(&self) -> &NodeDescriptor;

	/// Declares slots and any other per-instance state.
	fn init(&self, _node: &mut Node) {}
}

/// Which side of a node a slot sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotDirection {
	/// Consumed by the node.
	Input,
	/// Produced by the node.
	Output,
}

#[derive(Default)]
struct Tables {
	slot_types: BTreeSet<String>,
	input_producers: HashMap<String, String>,
	output_producers: HashMap<String, String>,
	node_kinds: HashMap<String, Rc<dyn NodeKind>>,
}

/// Shared handle to the node-type and slot-type tables.
///
/// Entries are never removed. For slot types the most recent registration
/// per direction wins.
#[derive(Clone, Default)]
pub struct TypeRegistry {
	tables: Rc<RefCell<Tables>>,
}

impl fmt::Debug for TypeRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tables = self.tables.borrow();
		let mut kinds: Vec<&String> = tables.node_kinds.keys().collect();
		kinds.sort();
		f.debug_struct("TypeRegistry")
			.field("node_kinds", &kinds)
			.field("slot_types", &tables.slot_types)
			.finish()
	}
}

impl TypeRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `kind` under its descriptor's type name, replacing any previous
	/// kind with that name.
	pub fn register_node_type<K: NodeKind + 'static>(&self, kind: K) -> Rc<dyn NodeKind> {
		let kind: Rc<dyn NodeKind> = Rc::new(kind);
		let name = kind.descriptor().type_name.clone();
		debug!("registered node type {}", name);
		self.tables.borrow_mut().node_kinds.insert(name, kind.clone());
		kind
	}

	/// Looks up a registered kind.
	pub fn node_kind(&self, type_name: &str) -> Option<Rc<dyn NodeKind>> {
		self.tables.borrow().node_kinds.get(type_name).cloned()
	}

	/// Builds a fresh, unattached node of a registered kind.
	pub fn create_node(&self, type_name: &str) -> CanvasResult<Node> {
		let kind = self
			.node_kind(type_name)
			.ok_or_else(|| CanvasError::UnknownNodeType(type_name.to_owned()))?;
		Ok(Node::new(self, kind))
	}

	/// Records that `node_type` declares a slot of `slot_type`.
	pub fn register_slot(&self, slot_type: &str, node_type: &str, direction: SlotDirection) {
		let mut tables = self.tables.borrow_mut();
		tables.slot_types.insert(slot_type.to_owned());
		let producers = match direction {
			SlotDirection::Input => &mut tables.input_producers,
			SlotDirection::Output => &mut tables.output_producers,
		};
		producers.insert(slot_type.to_owned(), node_type.to_owned());
	}

	/// Whether any node ever declared a slot of this type.
	pub fn has_slot_type(&self, slot_type: &str) -> bool {
		self.tables.borrow().slot_types.contains(slot_type)
	}

	/// Every slot type seen so far, sorted.
	pub fn slot_types(&self) -> Vec<String> {
		self.tables.borrow().slot_types.iter().cloned().collect()
	}

	/// Node type that most recently declared an input of `slot_type`.
	pub fn input_producer(&self, slot_type: &str) -> Option<String> {
		self.tables.borrow().input_producers.get(slot_type).cloned()
	}

	/// Node type that most recently declared an output of `slot_type`.
	pub fn output_producer(&self, slot_type: &str) -> Option<String> {
		self.tables.borrow().output_producers.get(slot_type).cloned()
	}
}
