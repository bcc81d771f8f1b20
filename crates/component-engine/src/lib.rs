//! # Components, Hooks and the Runtime
//!
//! The engine has three layers:
//!
//! - `Properties` — the primitive attribute bag every component owns.
//! - `Component` / `Renderable` — the render contract turning properties and
//!   hook state into a `Node`.
//! - `Runtime` — owns mounted instances, their hook slots and cleanup
//!   scopes, and re-renders the ones that were updated.
//!
//! ## Hooks
//!
//! Inside a render pass hooks are bound to the rendering instance by call
//! order:
//!
//! ```rust
//! use component_engine::*;
//!
//! fn counter(_: &Properties) -> Result<Node> {
//!     let (count, set_count) = use_state(0);
//!     let clicks = use_ref(0u32);
//!
//!     use_effect(count, move || {
//!         *clicks.borrow_mut() += 1;
//!         Dispose::none()
//!     });
//!
//!     if count < 3 {
//!         set_count.update(|c| *c += 1);
//!     }
//!     Ok(Node::element("span").child(Node::text(format!("count = {count}"))))
//! }
//!
//! let rt = Runtime::new();
//! let id = rt.mount(Component::from_fn("Counter", Properties::new(), counter)).unwrap();
//! rt.flush().unwrap();
//! assert_eq!(rt.output(id).unwrap().unwrap().text_content(), "count = 3");
//! ```
//!
//! - `use_state` / `use_reducer` persist across renders; their setters mark
//!   the instance dirty.
//! - `use_ref` returns the same box on every render and never schedules.
//! - `use_context` subscribes the instance to a `Context`.
//! - `use_effect` / `use_memo` compare dependencies with the previous render.
//!
//! ## Scheduling
//!
//! Updates are batched. Nothing renders until `Runtime::flush`, which renders
//! every dirty instance once per pass, parents before children and siblings
//! in mount order, until no updates remain.

pub mod component;
pub mod config;
pub mod context;
pub mod effects;
pub mod error;
pub mod hooks;
pub mod node;
pub mod prelude;
pub mod properties;
pub mod reactive;
pub mod runtime;
pub mod scope;
pub mod state;
pub mod tests;

pub use component::*;
pub use config::*;
pub use context::*;
pub use effects::*;
pub use error::*;
pub use hooks::*;
pub use node::*;
pub use properties::*;
pub use runtime::{
    FlushReport, InstanceFlags, InstanceId, InstanceInfo, RenderStats, Runtime, current_instance,
    is_rendering,
};
pub use scope::{Scope, current_scope, scoped_effect};
pub use state::*;
