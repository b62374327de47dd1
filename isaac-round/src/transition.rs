use isaac_types::Context;

use crate::output::Output;
use crate::state::RoundState;

/// The result of applying an [`Input`](crate::input::Input) to a
/// [`RoundState`]: the state to move to, and the side effect (if any) the
/// caller must carry out.
pub struct Transition<Ctx: Context> {
    pub next_state: RoundState<Ctx>,
    pub output: Option<Output>,
}

impl<Ctx: Context> Transition<Ctx> {
    pub fn to(next_state: RoundState<Ctx>) -> Self {
        Self {
            next_state,
            output: None,
        }
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }
}

impl<Ctx: Context> Clone for Transition<Ctx> {
    fn clone(&self) -> Self {
        Self {
            next_state: self.next_state.clone(),
            output: self.output,
        }
    }
}

impl<Ctx: Context> core::fmt::Debug for Transition<Ctx> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transition")
            .field("next_state", &self.next_state)
            .field("output", &self.output)
            .finish()
    }
}

impl<Ctx: Context> PartialEq for Transition<Ctx> {
    fn eq(&self, other: &Self) -> bool {
        self.next_state == other.next_state && self.output == other.output
    }
}

impl<Ctx: Context> Eq for Transition<Ctx> {}
