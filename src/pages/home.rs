use leptos::prelude::*;

use crate::components::graph_canvas::GraphCanvasView;
use crate::graph::{Graph, Node, NodeDescriptor, NodeKind, TypeRegistry};

/// Adds its two number inputs.
struct SumNode {
	descriptor: NodeDescriptor,
}

impl SumNode {
	fn new() -> Self {
		Self {
			descriptor: NodeDescriptor::new("basic/sum").with_title("Sum"),
		}
	}
}

impl NodeKind for SumNode {
	fn descriptor(&self) -> &NodeDescriptor {
		&self.descriptor
	}

	fn init(&self, node: &mut Node) {
		node.add_input("A", "number", None);
		node.add_input("B", "number", None);
	}
}

/// Demo graph: a single sum node.
fn demo_scene(registry: &TypeRegistry) -> Graph {
	registry.register_node_type(SumNode::new());

	let mut graph = Graph::new();
	let added = registry.create_node("basic/sum").and_then(|mut node| {
		node.position = (200.0, 200.0);
		graph.add(node)
	});
	if let Err(err) = added {
		log::error!("demo scene: {err}");
	}
	graph
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<div class="fullscreen-graph">
			<GraphCanvasView scene=demo_scene fullscreen=true />
			<div class="graph-overlay">
				<h1>"Node Graph"</h1>
				<p class="subtitle">"Drag to pan. Scroll to zoom. Double-click to reset the view."</p>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn demo_scene_places_one_sum_node() {
		let registry = TypeRegistry::new();
		let graph = demo_scene(&registry);

		assert_eq!(graph.len(), 1);
		let node = &graph.nodes()[0];
		assert_eq!(node.id().map(|id| id.get()), Some(1));
		assert_eq!(node.position, (200.0, 200.0));
		assert_eq!(node.display_title(), "Sum");
		assert_eq!(node.inputs().len(), 2);
		assert_eq!(registry.input_producer("number").as_deref(), Some("basic/sum"));
	}
}
