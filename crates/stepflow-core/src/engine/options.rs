/// Flags de `WorkflowEngine::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Invalida el resultado cacheado antes de correr.
    pub ignore_results: bool,
    /// Persiste el nuevo estado (y el de los pasos previos que recompute).
    pub save_results: bool,
    /// `true`: recomputa todo lo que está aguas abajo; `false`: sólo lo
    /// invalida.
    pub run_subsequent: bool,
}

impl RunOptions {
    /// Re-ejecución forzada, persistida y propagada. Las cascadas parten de
    /// aquí y heredan el `save_results` de quien las dispara.
    pub fn forced() -> Self {
        Self { ignore_results: true,
               save_results: true,
               run_subsequent: true }
    }

    pub fn ignore_results(mut self, v: bool) -> Self {
        self.ignore_results = v;
        self
    }

    pub fn save_results(mut self, v: bool) -> Self {
        self.save_results = v;
        self
    }

    pub fn run_subsequent(mut self, v: bool) -> Self {
        self.run_subsequent = v;
        self
    }
}

/// Flags de `WorkflowEngine::get_data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub ignore_cache: bool,
    pub save_results: bool,
    pub run_subsequent: bool,
}

impl ExtractOptions {
    pub fn ignore_cache(mut self, v: bool) -> Self {
        self.ignore_cache = v;
        self
    }

    pub fn save_results(mut self, v: bool) -> Self {
        self.save_results = v;
        self
    }

    pub fn run_subsequent(mut self, v: bool) -> Self {
        self.run_subsequent = v;
        self
    }
}

/// Flags de `WorkflowEngine::clear_results`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearOptions {
    pub clear_next_steps: bool,
    pub save: bool,
}

impl ClearOptions {
    pub fn downstream(save: bool) -> Self {
        Self { clear_next_steps: true,
               save }
    }
}
