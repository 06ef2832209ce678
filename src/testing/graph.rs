//! A composite wrapper type whose values may refer to other wrappers,
//! including themselves

use std::sync::Arc;

use binding_core::{
    AttachToken, CanonicalType, CanonicalTypeInfo, CanonicalValue, ClassSchema, ConverterSpec,
    LiteralType, PropertyContainer, PropertyInfo, Result, TypeBound, Value, WrapperCore,
    WrapperRef,
};

pub static GRAPH: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "graph",
    literal_type: LiteralType::Any,
    parent: None,
    constructor: Some(new_graph),
};

/// Graph node holding any value, typically a reference to another node.
#[derive(Debug, Default)]
pub struct GraphNode {
    core: WrapperCore,
}

impl CanonicalValue for GraphNode {
    fn canonical_type(&self) -> CanonicalType {
        CanonicalType::of(&GRAPH)
    }

    fn value(&self) -> Value {
        self.core.literal().clone()
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
        self.core.set_literal(value);
        Ok(())
    }

    fn clear(&mut self) {
        self.core.clear();
    }

    fn property_definition(&self) -> Option<&Arc<PropertyInfo>> {
        self.core.definition()
    }

    fn attach_definition(&mut self, definition: Arc<PropertyInfo>, token: AttachToken) {
        self.core.attach(definition, token);
    }
}

fn new_graph() -> WrapperRef {
    WrapperRef::new(GraphNode::default())
}

pub fn graph_node(value: Value) -> WrapperRef {
    WrapperRef::new(GraphNode {
        core: WrapperCore::with_literal(value),
    })
}

/// Holds the root of a node graph, adapted node by node into fresh nodes.
#[derive(Debug, Default)]
pub struct Diagram {
    pub root: Option<WrapperRef>,
}

impl PropertyContainer for Diagram {
    fn describe(schema: &mut ClassSchema<Self>) {
        let pass_through = ConverterSpec::from_fns(
            "PassThrough",
            TypeBound::Unbounded,
            TypeBound::Unbounded,
            Ok,
            Ok,
        );
        schema
            .wrapper_field("root", &GRAPH, |d| &d.root, |d| &mut d.root)
            .adapt_as(pass_through, &GRAPH);
    }
}
