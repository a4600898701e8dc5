use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use super::registry::{NodeDescriptor, NodeKind, SlotDirection, TypeRegistry};
use super::{Graph, GraphLink};

/// Width of an expanded node, in world units.
pub const NODE_WIDTH: f64 = 140.0;
/// Height of the title bar, in world units.
pub const NODE_TITLE_HEIGHT: f64 = 30.0;
/// Height of one row of slots.
pub const NODE_SLOT_HEIGHT: f64 = 20.0;

/// Free-form per-slot annotations.
pub type SlotExtra = BTreeMap<String, String>;

/// Anything that can report the rendered width of a string.
pub trait TextMeasure {
	/// Width of `text` in the current font.
	fn measure_text(&self, text: &str) -> f64;
}

/// Identity of a node inside its graph. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
	/// Wraps a raw id; `None` for zero.
	pub fn new(raw: u32) -> Option<Self> {
		NonZeroU32::new(raw).map(Self)
	}

	/// The raw id.
	pub fn get(self) -> u32 {
		self.0.get()
	}

	/// The id following `last`, `None` once the id space is used up.
	pub(crate) fn after(last: u32) -> Option<Self> {
		NonZeroU32::MIN.checked_add(last).map(Self)
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A named, typed input or output declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
	/// Display name; not required to be unique.
	pub name: String,
	/// Type tag used for connection typing.
	pub slot_type: String,
	/// Optional annotations.
	pub extra: Option<SlotExtra>,
}

/// Named boolean flags on a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags(BTreeMap<String, bool>);

impl NodeFlags {
	/// Key of the collapsed flag.
	pub const COLLAPSED: &'static str = "collapsed";

	/// Value of a flag; unset flags read as `false`.
	pub fn get(&self, name: &str) -> bool {
		self.0.get(name).copied().unwrap_or(false)
	}

	/// Sets a flag.
	pub fn set(&mut self, name: impl Into<String>, value: bool) {
		self.0.insert(name.into(), value);
	}

	/// Whether the node is drawn as a title-only pill.
	pub fn collapsed(&self) -> bool {
		self.get(Self::COLLAPSED)
	}

	/// Collapses or expands the node.
	pub fn set_collapsed(&mut self, collapsed: bool) {
		self.set(Self::COLLAPSED, collapsed);
	}
}

/// A positioned, titled entity with typed slots.
///
/// A node is created unattached. [`Graph::add`] takes it by value and gives
/// it an id and a graph back-reference in one step; neither changes again.
pub struct Node {
	id: Option<NodeId>,
	graph: Option<GraphLink>,
	kind: Rc<dyn NodeKind>,
	registry: TypeRegistry,
	inputs: Vec<Slot>,
	outputs: Vec<Slot>,
	/// Top-left corner in world space.
	pub position: (f64, f64),
	/// Instance title; falls back to the kind's title, then its type name.
	pub title: Option<String>,
	/// Free text shown by tooling.
	pub description: Option<String>,
	/// Outline colour override.
	pub color: Option<String>,
	/// Body colour override.
	pub bg_color: Option<String>,
	/// Named flags, `collapsed` among them.
	pub flags: NodeFlags,
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Node")
			.field("id", &self.id)
			.field("type", &self.type_name())
			.field("title", &self.display_title())
			.field("position", &self.position)
			.field("inputs", &self.inputs)
			.field("outputs", &self.outputs)
			.field("flags", &self.flags)
			.finish()
	}
}

impl Node {
	/// Builds an unattached node of `kind` and runs the kind's `init`.
	pub fn new(registry: &TypeRegistry, kind: Rc<dyn NodeKind>) -> Self {
		let mut node = Self {
			id: None,
			graph: None,
			kind: kind.clone(),
			registry: registry.clone(),
			inputs: Vec::new(),
			outputs: Vec::new(),
			position: (0.0, 0.0),
			title: None,
			description: None,
			color: None,
			bg_color: None,
			flags: NodeFlags::default(),
		};
		kind.init(&mut node);
		node
	}

	/// Id assigned by the owning graph, `None` until added.
	pub fn id(&self) -> Option<NodeId> {
		self.id
	}

	/// Whether the node has been added to a graph.
	pub fn is_attached(&self) -> bool {
		self.graph.is_some()
	}

	/// Whether `graph` owns this node.
	pub fn belongs_to(&self, graph: &Graph) -> bool {
		self.graph
			.as_ref()
			.is_some_and(|link| Rc::ptr_eq(link, &graph.link))
	}

	/// The kind's static description.
	pub fn descriptor(&self) -> &NodeDescriptor {
		self.kind.descriptor()
	}

	/// Registry key of the node's kind.
	pub fn type_name(&self) -> &str {
		&self.descriptor().type_name
	}

	/// Declared inputs, in declaration order.
	pub fn inputs(&self) -> &[Slot] {
		&self.inputs
	}

	/// Declared outputs, in declaration order.
	pub fn outputs(&self) -> &[Slot] {
		&self.outputs
	}

	/// Declares an input slot.
	pub fn add_input(&mut self, name: impl Into<String>, slot_type: impl Into<String>, extra: Option<SlotExtra>) {
		self.add_slot(SlotDirection::Input, name.into(), slot_type.into(), extra);
	}

	/// Declares an output slot.
	pub fn add_output(&mut self, name: impl Into<String>, slot_type: impl Into<String>, extra: Option<SlotExtra>) {
		self.add_slot(SlotDirection::Output, name.into(), slot_type.into(), extra);
	}

	fn add_slot(&mut self, direction: SlotDirection, name: String, slot_type: String, extra: Option<SlotExtra>) {
		self.registry
			.register_slot(&slot_type, &self.kind.descriptor().type_name, direction);
		let slot = Slot {
			name,
			slot_type,
			extra,
		};
		match direction {
			SlotDirection::Input => self.inputs.push(slot),
			SlotDirection::Output => self.outputs.push(slot),
		}
		// slot changes may touch cached visuals
		if let Some(link) = &self.graph {
			link.notify(true, false);
		}
	}

	/// Title to draw.
	pub fn display_title(&self) -> &str {
		let descriptor = self.descriptor();
		self.title
			.as_deref()
			.or(descriptor.title.as_deref())
			.unwrap_or(&descriptor.type_name)
	}

	/// Width of the node body: fixed when expanded, fitted to the title when
	/// collapsed.
	pub fn compute_width(&self, measurer: &impl TextMeasure) -> f64 {
		if !self.flags.collapsed() {
			return NODE_WIDTH;
		}
		let text = measurer.measure_text(self.display_title());
		(text + NODE_TITLE_HEIGHT * 2.0).clamp(NODE_TITLE_HEIGHT, NODE_WIDTH)
	}

	/// Height below the title bar.
	pub fn content_height(&self) -> f64 {
		let rows = self.inputs.len().max(self.outputs.len()).max(1);
		rows as f64 * NODE_SLOT_HEIGHT
	}

	/// Outline colour: instance, then kind, then `default`.
	pub fn resolve_color<'a>(&'a self, default: &'a str) -> &'a str {
		self.color
			.as_deref()
			.or(self.descriptor().style.color.as_deref())
			.unwrap_or(default)
	}

	/// Body colour: instance, then kind, then `default`.
	pub fn resolve_bg_color<'a>(&'a self, default: &'a str) -> &'a str {
		self.bg_color
			.as_deref()
			.or(self.descriptor().style.bg_color.as_deref())
			.unwrap_or(default)
	}

	/// Title bar colour set by the kind, if any.
	pub fn title_color(&self) -> Option<&str> {
		self.descriptor().style.title_color.as_deref()
	}

	pub(crate) fn attach(&mut self, id: NodeId, link: GraphLink) {
		debug_assert!(self.graph.is_none(), "node attached twice");
		self.id = Some(id);
		self.graph = Some(link);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::NodeStyle;

	struct Kind(NodeDescriptor);

	impl NodeKind for Kind {
		fn descriptor(&self) -> &NodeDescriptor {
			&self.0
		}
	}

	struct Fixed(f64);

	impl TextMeasure for Fixed {
		fn measure_text(&self, _text: &str) -> f64 {
			self.0
		}
	}

	fn node(descriptor: NodeDescriptor) -> Node {
		Node::new(&TypeRegistry::new(), Rc::new(Kind(descriptor)))
	}

	#[test]
	fn fresh_node_is_unattached() {
		let n = node(NodeDescriptor::new("basic/sum"));
		assert_eq!(n.id(), None);
		assert!(!n.is_attached());
		assert_eq!(n.position, (0.0, 0.0));
	}

	#[test]
	fn title_falls_back_to_kind_then_type_name() {
		let mut n = node(NodeDescriptor::new("basic/sum"));
		assert_eq!(n.display_title(), "basic/sum");

		let mut titled = node(NodeDescriptor::new("basic/sum").with_title("Sum"));
		assert_eq!(titled.display_title(), "Sum");

		titled.title = Some("Total".into());
		n.title = Some("Total".into());
		assert_eq!(titled.display_title(), "Total");
		assert_eq!(n.display_title(), "Total");
	}

	#[test]
	fn expanded_width_is_fixed() {
		let n = node(NodeDescriptor::new("basic/sum"));
		assert_eq!(n.compute_width(&Fixed(400.0)), NODE_WIDTH);
	}

	#[test]
	fn collapsed_width_fits_title() {
		let mut n = node(NodeDescriptor::new("basic/sum"));
		n.title = Some("Sum".into());
		n.flags.set_collapsed(true);
		assert_eq!(n.compute_width(&Fixed(40.0)), 100.0);
	}

	#[test]
	fn collapsed_width_is_capped() {
		let mut n = node(NodeDescriptor::new("basic/sum"));
		n.flags.set_collapsed(true);
		assert_eq!(n.compute_width(&Fixed(500.0)), NODE_WIDTH);
		assert_eq!(n.compute_width(&Fixed(0.0)), NODE_TITLE_HEIGHT * 2.0);
	}

	#[test]
	fn colors_resolve_in_three_levels() {
		let style = NodeStyle {
			color: Some("#a00".into()),
			bg_color: None,
			title_color: Some("#0a0".into()),
		};
		let mut n = node(NodeDescriptor::new("basic/sum").with_style(style));

		assert_eq!(n.resolve_color("#333"), "#a00");
		assert_eq!(n.resolve_bg_color("#353535"), "#353535");
		assert_eq!(n.title_color(), Some("#0a0"));

		n.color = Some("#fff".into());
		n.bg_color = Some("#000".into());
		assert_eq!(n.resolve_color("#333"), "#fff");
		assert_eq!(n.resolve_bg_color("#353535"), "#000");
	}

	#[test]
	fn slots_keep_declaration_order_and_duplicates() {
		let mut n = node(NodeDescriptor::new("basic/sum"));
		n.add_input("A", "number", None);
		n.add_input("A", "string", None);
		let extra: SlotExtra = [("label".to_string(), "result".to_string())].into();
		n.add_output("out", "number", Some(extra.clone()));

		let names: Vec<_> = n.inputs().iter().map(|s| s.slot_type.as_str()).collect();
		assert_eq!(names, ["number", "string"]);
		assert_eq!(n.outputs()[0].extra.as_ref(), Some(&extra));
		assert_eq!(n.content_height(), 2.0 * NODE_SLOT_HEIGHT);
	}

	#[test]
	fn content_height_has_one_row_minimum() {
		let n = node(NodeDescriptor::new("basic/const"));
		assert_eq!(n.content_height(), NODE_SLOT_HEIGHT);
	}

	#[test]
	fn unknown_flags_read_false() {
		let mut flags = NodeFlags::default();
		assert!(!flags.get("pinned"));
		flags.set("pinned", true);
		assert!(flags.get("pinned"));
		assert!(!flags.collapsed());
	}

	#[test]
	fn node_id_is_never_zero() {
		assert_eq!(NodeId::new(0), None);
		assert_eq!(NodeId::after(0).map(NodeId::get), Some(1));
		assert_eq!(NodeId::after(41).map(NodeId::get), Some(42));
		assert_eq!(NodeId::after(u32::MAX - 1).map(NodeId::get), Some(u32::MAX));
		assert_eq!(NodeId::after(u32::MAX), None);
	}
}
