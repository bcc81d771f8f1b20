//! # Hooks
//!
//! Hooks give a component instance state that survives re-renders. Inside a
//! render pass every hook call takes the instance's next slot by position,
//! so the Nth hook call always sees the Nth slot. Call hooks unconditionally
//! and in the same order on every render.
//!
//! Updates made through `StateSetter` or `Dispatch` are applied at once and
//! mark the owning instance dirty; `Runtime::flush` renders it again.
//!
//! Outside a render pass there is no instance to own the state. Hooks then
//! hand back detached values: the setter mutates a private cell that no later
//! call will observe.
//!
//! ```rust
//! use component_engine::*;
//!
//! let (value, set_value) = use_state(0);
//! set_value.set(5);
//! let (again, _) = use_state(0);
//! assert_eq!((value, again), (0, 0));
//! ```

use std::cell::{self, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::effects::Dispose;
use crate::runtime::{self, UpdateTarget};
use crate::scope::scoped_effect;

fn detached(hook: &str) {
    log::debug!("{hook} called outside a render pass; state will not persist");
}

/// Writes to a `use_state` slot.
pub struct StateSetter<T> {
    cell: Rc<RefCell<T>>,
    target: Option<UpdateTarget>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            target: self.target.clone(),
        }
    }
}

impl<T> StateSetter<T> {
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
        self.notify();
    }

    /// `f` works on a copy of the value, so it may call back into this
    /// setter; the copy is written back when `f` returns.
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        let mut value = self.cell.borrow().clone();
        f(&mut value);
        *self.cell.borrow_mut() = value;
        self.notify();
    }

    /// Latest stored value, including updates not rendered yet.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }

    pub fn is_detached(&self) -> bool {
        self.target.is_none()
    }

    fn notify(&self) {
        if let Some(t) = &self.target {
            t.schedule();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("value", &self.cell.borrow())
            .field("detached", &self.is_detached())
            .finish()
    }
}

pub fn use_state<T: Clone + 'static>(initial: T) -> (T, StateSetter<T>) {
    use_state_with(move || initial)
}

/// `use_state` with a lazily built initial value; `init` runs on the first
/// render only.
pub fn use_state_with<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, StateSetter<T>) {
    let cell = match runtime::slot("use_state", move || RefCell::new(init())) {
        Ok((cell, _)) => cell,
        Err(make) => {
            detached("use_state");
            Rc::new(make())
        }
    };
    let value = cell.borrow().clone();
    (
        value,
        StateSetter {
            cell,
            target: runtime::current_target(),
        },
    )
}

/// Sends actions to a `use_reducer` slot.
pub struct Dispatch<A> {
    apply: Rc<dyn Fn(A)>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            apply: self.apply.clone(),
        }
    }
}

impl<A> Dispatch<A> {
    pub fn dispatch(&self, action: A) {
        (self.apply)(action)
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatch(<reducer>)")
    }
}

type ReducerFn<S, A> = Rc<dyn Fn(&S, A) -> S>;

struct ReducerSlot<S, A> {
    state: RefCell<S>,
    // Replaced on every render so dispatch uses the latest closure.
    reducer: RefCell<ReducerFn<S, A>>,
}

pub fn use_reducer<S, A, R>(reducer: R, initial_state: S) -> (S, Dispatch<A>)
where
    S: Clone + 'static,
    A: 'static,
    R: Fn(&S, A) -> S + 'static,
{
    use_reducer_with_init(reducer, initial_state, |s| s)
}

/// `init(initial_arg)` builds the state on the first render only.
pub fn use_reducer_with_init<I, S, A, R>(
    reducer: R,
    initial_arg: I,
    init: impl FnOnce(I) -> S,
) -> (S, Dispatch<A>)
where
    S: Clone + 'static,
    A: 'static,
    R: Fn(&S, A) -> S + 'static,
{
    let reducer: ReducerFn<S, A> = Rc::new(reducer);
    let first = reducer.clone();
    let make = move || ReducerSlot {
        state: RefCell::new(init(initial_arg)),
        reducer: RefCell::new(first),
    };
    let slot = match runtime::slot("use_reducer", make) {
        Ok((slot, _)) => {
            *slot.reducer.borrow_mut() = reducer;
            slot
        }
        Err(make) => {
            detached("use_reducer");
            Rc::new(make())
        }
    };

    let state = slot.state.borrow().clone();
    let target = runtime::current_target();
    let apply = move |action: A| {
        let reducer = slot.reducer.borrow().clone();
        // No borrow is held while the reducer runs; a dispatch made from
        // inside it is overwritten by this one's result.
        let current = slot.state.borrow().clone();
        let next = reducer(&current, action);
        *slot.state.borrow_mut() = next;
        if let Some(t) = &target {
            t.schedule();
        }
    };
    (
        state,
        Dispatch {
            apply: Rc::new(apply),
        },
    )
}

/// Mutable box whose identity is stable for the lifetime of an instance.
/// Writing through it never schedules a re-render.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Ref<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    pub fn set_current(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn borrow(&self) -> cell::Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.0.borrow()).finish()
    }
}

pub fn use_ref<T: 'static>(initial: T) -> Ref<T> {
    match runtime::slot("use_ref", move || Ref::new(initial)) {
        Ok((r, _)) => (*r).clone(),
        Err(make) => {
            detached("use_ref");
            make()
        }
    }
}

/// Returns the cached value while `deps` compare equal to the previous
/// render's; recomputes otherwise.
pub fn use_memo<D, T>(deps: D, compute: impl FnOnce(&D) -> T) -> Rc<T>
where
    D: PartialEq + 'static,
    T: 'static,
{
    let slot = match runtime::slot("use_memo", || RefCell::new(None::<(D, Rc<T>)>)) {
        Ok((slot, _)) => slot,
        Err(_) => {
            detached("use_memo");
            return Rc::new(compute(&deps));
        }
    };

    let cached = match slot.borrow().as_ref() {
        Some((prev, value)) if *prev == deps => Some(value.clone()),
        _ => None,
    };
    if let Some(value) = cached {
        return value;
    }
    let value = Rc::new(compute(&deps));
    *slot.borrow_mut() = Some((deps, value.clone()));
    value
}

struct EffectSlot<D> {
    deps: RefCell<Option<D>>,
    cleanup: RefCell<Option<Dispose>>,
}

impl<D> EffectSlot<D> {
    fn run_cleanup(&self) {
        let prev = self.cleanup.borrow_mut().take();
        if let Some(d) = prev {
            d.run();
        }
    }
}

// A slot is dropped when its hook stops being called or another hook takes
// its position.
impl<D> Drop for EffectSlot<D> {
    fn drop(&mut self) {
        if let Some(d) = self.cleanup.get_mut().take() {
            d.run();
        }
    }
}

/// Runs `effect` after the current render completes whenever `deps` differ
/// from those of the last effect that ran. The previous cleanup runs first;
/// the last one runs when the instance unmounts or the hook is dropped.
/// A render that fails discards its effects, so the next successful render
/// runs them.
///
/// Outside a render pass the effect runs immediately and its cleanup is
/// dropped unrun.
pub fn use_effect<D, F>(deps: D, effect: F)
where
    D: PartialEq + 'static,
    F: FnOnce() -> Dispose + 'static,
{
    let make = || EffectSlot {
        deps: RefCell::new(None::<D>),
        cleanup: RefCell::new(None),
    };
    let (slot, fresh) = match runtime::slot("use_effect", make) {
        Ok(found) => found,
        Err(_) => {
            detached("use_effect");
            let _ = effect();
            return;
        }
    };

    if fresh {
        let weak: Weak<EffectSlot<D>> = Rc::downgrade(&slot);
        scoped_effect(move || -> Box<dyn FnOnce()> {
            Box::new(move || {
                if let Some(slot) = weak.upgrade() {
                    slot.run_cleanup();
                }
            })
        });
    }

    if slot.deps.borrow().as_ref() == Some(&deps) {
        return;
    }

    let run = move || {
        slot.run_cleanup();
        *slot.deps.borrow_mut() = Some(deps);
        let d = effect();
        *slot.cleanup.borrow_mut() = Some(d);
    };
    if let Err(run) = runtime::queue_effect(Box::new(run)) {
        run();
    }
}
