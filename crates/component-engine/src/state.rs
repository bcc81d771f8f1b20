use crate::{Dispatch, use_reducer_with_init};

/// State machine usable with `use_reducible`.
///
/// ```rust
/// use component_engine::*;
///
/// struct Toggle;
///
/// impl Reducible for Toggle {
///     type State = bool;
///     type Action = ();
///
///     fn initial_state() -> bool {
///         false
///     }
///
///     fn reduce(state: &bool, _: ()) -> bool {
///         !state
///     }
/// }
///
/// let (on, toggle) = use_reducible::<Toggle>();
/// assert!(!on);
/// toggle.dispatch(());
/// ```
pub trait Reducible: 'static {
    type State: Clone + 'static;
    type Action: 'static;

    fn initial_state() -> Self::State;
    fn reduce(state: &Self::State, action: Self::Action) -> Self::State;
}

pub fn use_reducible<R: Reducible>() -> (R::State, Dispatch<R::Action>) {
    use_reducer_with_init(R::reduce, (), |_| R::initial_state())
}
