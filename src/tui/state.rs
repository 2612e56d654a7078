//! TUI focus state.

/// Which pane receives key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The prompt input bar.
    #[default]
    Input,
    /// The task list.
    List,
}

impl Focus {
    /// The other pane.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Input => Self::List,
            Self::List => Self::Input,
        }
    }
}
