use crate::error::FetchError;

/// Load lifecycle of one mirrored collection.
///
/// ```text
/// Idle ──→ Loading ──→ Loaded
///   ▲         │   ▲       │
///   │         └─→ Failed ─┘ (retry via begin)
/// ```
///
/// `begin` refuses to leave `Loading`, which is what makes a second `load()`
/// join the in-flight request instead of issuing another one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(FetchError),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// At least one load has completed successfully.
    pub fn has_fetched(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Start a load. `None` while one is already outstanding.
    pub fn begin(&self) -> Option<Self> {
        match self {
            Self::Loading => None,
            _ => Some(Self::Loading),
        }
    }

    pub fn on_loaded(self) -> Self {
        match self {
            Self::Loading => Self::Loaded,
            other => other,
        }
    }

    pub fn on_failed(self, error: FetchError) -> Self {
        match self {
            Self::Loading => Self::Failed(error),
            other => other,
        }
    }
}
