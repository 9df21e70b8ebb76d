//! Emulator configuration.

/// How `FunctionCall` instructions are treated by expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallInlining {
    /// Calls are lowered by inlining the callee body, renamed through the
    /// shared naming context, so the fully expanded program is purely basic.
    #[default]
    Full,
    /// Calls are kept as call boundaries: they never expand and are executed
    /// directly by running the callee.
    Boundary,
}

#[derive(Debug, Clone, Default)]
pub struct EmulatorConfig {
    pub call_inlining: CallInlining,
}

impl EmulatorConfig {
    pub fn with_call_inlining(mut self, call_inlining: CallInlining) -> Self {
        self.call_inlining = call_inlining;
        self
    }
}
