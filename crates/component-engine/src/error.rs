use thiserror::Error;

use crate::InstanceId;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// `render()` was called on a component that has no renderer attached.
    #[error("render() is not implemented for component `{component}`")]
    NotImplemented { component: String },

    #[error("component instance {0:?} is not mounted")]
    NotMounted(InstanceId),

    /// Only raised when `EngineConfig::strict_hooks` is set.
    #[error("hook order changed while rendering `{component}`: {detail}")]
    HookOrder { component: String, detail: String },

    #[error("updates did not settle after {passes} render passes")]
    RenderLoop { passes: usize },

    #[error("rendering `{component}` failed: {message}")]
    Render { component: String, message: String },
}

impl EngineError {
    /// Error for renderers to return from `Renderable::render`.
    pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Render {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, EngineError::NotImplemented { .. })
    }
}
