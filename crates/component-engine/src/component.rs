use std::fmt;
use std::rc::Rc;

use crate::{EngineError, Node, Properties, Result};

/// The render contract. Implementors turn the current properties (and any
/// hook state read during the call) into a `Node`.
pub trait Renderable: 'static {
    fn render(&self, props: &Properties) -> Result<Node>;

    /// Name used in logs, errors and devtools.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A named closure acting as a component.
///
/// ```rust
/// use component_engine::*;
///
/// let greeting = FnComponent::new("Greeting", |props: &Properties| {
///     let who = props.get_str("who").unwrap_or("world");
///     Ok(Node::text(format!("hello {who}")))
/// });
/// let c = Component::with_renderer(Properties::new().with("who", "you"), greeting);
/// assert_eq!(c.render().unwrap(), Node::text("hello you"));
/// ```
pub struct FnComponent<F> {
    name: &'static str,
    f: F,
}

impl<F> FnComponent<F>
where
    F: Fn(&Properties) -> Result<Node> + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Renderable for FnComponent<F>
where
    F: Fn(&Properties) -> Result<Node> + 'static,
{
    fn render(&self, props: &Properties) -> Result<Node> {
        (self.f)(props)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Properties plus an optional renderer. Without a renderer, `render` fails
/// with `EngineError::NotImplemented`.
pub struct Component {
    properties: Properties,
    renderer: Option<Rc<dyn Renderable>>,
}

impl Component {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            renderer: None,
        }
    }

    pub fn with_renderer(properties: Properties, renderer: impl Renderable) -> Self {
        Self {
            properties,
            renderer: Some(Rc::new(renderer)),
        }
    }

    pub fn from_fn(
        name: &'static str,
        properties: Properties,
        f: impl Fn(&Properties) -> Result<Node> + 'static,
    ) -> Self {
        Self::with_renderer(properties, FnComponent::new(name, f))
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn name(&self) -> &str {
        self.renderer.as_deref().map_or("Component", |r| r.name())
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn render(&self) -> Result<Node> {
        match &self.renderer {
            Some(r) => r.render(&self.properties),
            None => Err(EngineError::NotImplemented {
                component: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("properties", &self.properties)
            .finish()
    }
}
