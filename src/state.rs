//! States: an ordered, auto-extending container of actions. A state with zero actions is
//! terminal; its backed-up value is defined to be 0 (see [`crate::robust::backup`]).
use crate::action::{L1OutcomeAction, RegularAction};
use crate::types::ActionId;

use serde::{Deserialize, Serialize};

/// A state of a nominal [`crate::mdp::Mdp`]: an ordered sequence of [`RegularAction`]s, action
/// id equal to position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    actions: Vec<RegularAction>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn is_terminal(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[RegularAction] {
        &self.actions
    }

    pub fn action(&self, id: ActionId) -> Option<&RegularAction> {
        self.actions.get(id as usize)
    }

    /// Mutable access to an action, auto-extending with empty actions if `id` is beyond the
    /// current end (builder semantics: freshly created slots are empty).
    pub fn action_mut(&mut self, id: ActionId) -> &mut RegularAction {
        let id = id as usize;
        if id >= self.actions.len() {
            self.actions.resize_with(id + 1, RegularAction::new);
        }
        &mut self.actions[id]
    }
}

/// A state of an [`crate::rmdp::Rmdp`]: an ordered sequence of [`L1OutcomeAction`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobustState {
    actions: Vec<L1OutcomeAction>,
}

impl RobustState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn is_terminal(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[L1OutcomeAction] {
        &self.actions
    }

    pub fn action(&self, id: ActionId) -> Option<&L1OutcomeAction> {
        self.actions.get(id as usize)
    }

    pub fn action_mut(&mut self, id: ActionId) -> &mut L1OutcomeAction {
        let id = id as usize;
        if id >= self.actions.len() {
            self.actions.resize_with(id + 1, L1OutcomeAction::new);
        }
        &mut self.actions[id]
    }
}
