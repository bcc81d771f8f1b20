pub use crate::component::{Component, FnComponent, Renderable};
pub use crate::config::EngineConfig;
pub use crate::context::{Context, create_context, use_context};
pub use crate::effects::{Dispose, on_unmount};
pub use crate::error::{EngineError, Result};
pub use crate::hooks::{
    Dispatch, Ref, StateSetter, use_effect, use_memo, use_reducer, use_reducer_with_init,
    use_ref, use_state, use_state_with,
};
pub use crate::node::Node;
pub use crate::properties::{PropValue, Properties};
pub use crate::runtime::{FlushReport, InstanceId, Runtime};
pub use crate::state::{Reducible, use_reducible};
