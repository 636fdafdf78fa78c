use stepflow::WorkflowError;
use stepflow_core::{EngineError, RenderError};
use thiserror::Error;

/// Errores de la CLI con su código de salida:
/// 2 uso, 4 rechazado / no encontrado, 5 backend o cómputo.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn engine_exit_code(e: &EngineError) -> i32 {
    match e {
        e if e.is_compute_failure() => 5,
        EngineError::Store(_) => 5,
        EngineError::Render(RenderError::Io(_) | RenderError::Encode(_)) => 5,
        _ => 4,
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::NotFound(_) => 4,
            CliError::Backend(_) | CliError::Io(_) => 5,
            CliError::Workflow(WorkflowError::Io { .. } | WorkflowError::Parse(_)) => 2,
            CliError::Workflow(WorkflowError::Engine(e)) => engine_exit_code(e),
            CliError::Workflow(_) => 4,
            CliError::Engine(e) => engine_exit_code(e),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Engine(EngineError::Render(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepflow_core::{ArtifactKind, ExtractError, StoreError};

    #[test]
    fn exit_codes_follow_the_error_family() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), 2);
        assert_eq!(CliError::NotFound("t".into()).exit_code(), 4);
        let rejected = EngineError::CycleRejected { tool: "t".into(),
                                                    reason: "cycle".into() };
        assert_eq!(CliError::from(rejected).exit_code(), 4);
        let compute = EngineError::ExtractionFailed { extractor: "e".into(),
                                                      source: ExtractError::Unreachable("down".into()) };
        assert_eq!(CliError::from(compute).exit_code(), 5);
        let store = EngineError::Store(StoreError::Backend("pool".into()));
        assert_eq!(CliError::Workflow(WorkflowError::Engine(store)).exit_code(), 5);
        let unsupported = RenderError::UnsupportedFormat { format: "pkl".into(),
                                                           kind: ArtifactKind::Table };
        assert_eq!(CliError::from(unsupported).exit_code(), 4);
    }
}
