use crate::state::VarBag;
use crate::state::vars::impl_var_scope;

/// Battle-wide bookkeeping: the logical turn counter, the RNG stream and
/// global variables/tags.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalState {
    /// Logical turn, incremented once per maintenance pass.
    pub turn: u64,

    /// RNG seed set at game setup and never modified.
    pub seed: u64,

    /// Rolls drawn from the global stream so far (`chance` branches).
    pub rolls: u64,

    bag: VarBag,
}

impl_var_scope!(GlobalState);

impl GlobalState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_turn(mut self, turn: u64) -> Self {
        self.turn = turn;
        self
    }

    #[must_use]
    pub fn with_rolls(mut self, rolls: u64) -> Self {
        self.rolls = rolls;
        self
    }
}
