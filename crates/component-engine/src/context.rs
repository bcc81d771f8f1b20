//! # Context
//!
//! A `Context<T>` carries a value that many components read without passing
//! it through properties. Reading it with `use_context` during a render
//! records a dependency; `set` or `invalidate` then schedules exactly the
//! instances whose latest render read it.
//!
//! ```rust
//! use component_engine::*;
//!
//! let theme = create_context("dark".to_string());
//! let rt = Runtime::new();
//! let id = rt
//!     .mount(Component::from_fn("Themed", Properties::new(), {
//!         let theme = theme.clone();
//!         move |_| Ok(Node::text(use_context(&theme)))
//!     }))
//!     .unwrap();
//!
//! theme.set("light".to_string());
//! assert!(rt.is_dirty(id));
//! rt.flush().unwrap();
//! assert_eq!(rt.output(id).unwrap(), Some(Node::text("light")));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::reactive::{self, SourceId};
use crate::runtime;

pub type SubscriptionId = usize;

type Subscriber<T> = Rc<dyn Fn(&T)>;

pub struct Context<T>(Rc<ContextInner<T>>);

struct ContextInner<T> {
    source: SourceId,
    value: RefCell<T>,
    subs: RefCell<Vec<(SubscriptionId, Subscriber<T>)>>,
    next_sub: Cell<SubscriptionId>,
}

impl<T> Drop for ContextInner<T> {
    fn drop(&mut self) {
        reactive::forget_source(self.source);
    }
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + 'static> Context<T> {
    pub fn new(default: T) -> Self {
        Self(Rc::new(ContextInner {
            source: reactive::new_source(),
            value: RefCell::new(default),
            subs: RefCell::new(Vec::new()),
            next_sub: Cell::new(0),
        }))
    }

    pub fn value(&self) -> T {
        self.0.value.borrow().clone()
    }

    /// Replaces the value, then notifies subscribers and schedules dependents.
    pub fn set(&self, value: T) {
        *self.0.value.borrow_mut() = value;
        self.invalidate();
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.value.borrow_mut());
        self.invalidate();
    }

    /// Notifies subscribers and schedules every instance that read this
    /// context in its latest render. Returns the number of instances
    /// scheduled.
    pub fn invalidate(&self) -> usize {
        let value = self.value();
        let subs: Vec<Subscriber<T>> = self.0.subs.borrow().iter().map(|(_, s)| s.clone()).collect();
        for s in subs {
            s(&value);
        }
        reactive::source_changed(self.0.source)
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = self.0.next_sub.get();
        self.0.next_sub.set(id + 1);
        self.0.subs.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.0.subs.borrow_mut();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subs.borrow().len()
    }

    /// Instances whose latest render read this context.
    pub fn dependent_count(&self) -> usize {
        reactive::dependent_count(self.0.source)
    }

    pub fn ptr_eq(&self, other: &Context<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("value", &self.value())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

pub fn create_context<T: Clone + 'static>(default: T) -> Context<T> {
    Context::new(default)
}

/// Current value of `ctx`. During a render the instance becomes a dependent
/// of `ctx` until its next render or unmount.
pub fn use_context<T: Clone + 'static>(ctx: &Context<T>) -> T {
    match runtime::current_target() {
        Some(target) => reactive::register_read(ctx.0.source, &target),
        None => log::debug!("use_context called outside a render pass; no dependency recorded"),
    }
    ctx.value()
}
