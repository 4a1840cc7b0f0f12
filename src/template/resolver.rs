//! Render strategy selection for one template unit

use std::fmt;

/// Lifecycle of one unit within a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    NotStarted,
    RegisteringBlocks,
    RenderingInPlace,
    AwaitingAncestor,
    DelegatingToSweep,
    Done,
}

/// Terminal strategy chosen for a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Body output goes straight to the caller
    InPlace,
    /// Body output is discarded, then the named ancestor renders
    Ancestor(String),
    /// No full render; the snippet sweep produces a payload instead
    Sweep,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::InPlace => write!(f, "in place"),
            Strategy::Ancestor(name) => write!(f, "ancestor '{}'", name),
            Strategy::Sweep => write!(f, "snippet sweep"),
        }
    }
}

/// Pick the strategy for a unit: an ancestor always wins, a pending partial
/// update comes next, a plain render is the fallback
pub fn select_strategy(ancestor: Option<String>, partial: bool) -> Strategy {
    match ancestor {
        Some(name) => Strategy::Ancestor(name),
        None if partial => Strategy::Sweep,
        None => Strategy::InPlace,
    }
}

/// Tracks one unit through `NotStarted -> RegisteringBlocks -> {strategy} -> Done`
///
/// The strategy is chosen exactly once; asking again returns the first answer.
#[derive(Debug)]
pub struct InheritanceResolver {
    unit: String,
    state: UnitState,
    strategy: Option<Strategy>,
}

impl InheritanceResolver {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            state: UnitState::NotStarted,
            strategy: None,
        }
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Enter block registration
    pub fn begin(&mut self) {
        if self.state == UnitState::NotStarted {
            self.state = UnitState::RegisteringBlocks;
        }
    }

    /// Decide the terminal strategy once registration is complete
    pub fn choose(&mut self, ancestor: Option<String>, partial: bool) -> Strategy {
        if let Some(strategy) = &self.strategy {
            return strategy.clone();
        }
        self.begin();

        let strategy = select_strategy(ancestor, partial);
        self.state = match strategy {
            Strategy::InPlace => UnitState::RenderingInPlace,
            Strategy::Ancestor(_) => UnitState::AwaitingAncestor,
            Strategy::Sweep => UnitState::DelegatingToSweep,
        };
        log::trace!("unit '{}' renders {}", self.unit, strategy);
        self.strategy = Some(strategy.clone());
        strategy
    }

    pub fn finish(&mut self) {
        self.state = UnitState::Done;
    }
}
