//! Finite State Machine
//!
//! A small state machine used to sequence timed behaviour. States own their
//! data and decide their own transitions; the machine runs the
//! enter/update/exit lifecycle and can be finished early from outside.
//!
//! # Example
//!
//! ```ignore
//! struct Wait { left: f32 }
//!
//! impl State<Clock> for Wait {
//!     fn name(&self) -> &'static str { "Wait" }
//!
//!     fn update(&mut self, ctx: &mut Clock) -> Transition<Clock> {
//!         self.left -= ctx.delta_time;
//!         if self.left <= 0.0 { Transition::Pop } else { Transition::None }
//!     }
//! }
//!
//! let mut fsm = StateMachine::new(Wait { left: 1.0 });
//! fsm.update(&mut clock);
//! ```

use std::fmt;

// ============================================================================
// State Trait
// ============================================================================

/// A state in the finite state machine.
///
/// The lifecycle is:
///
/// 1. `enter()` - Called once when entering this state
/// 2. `update()` - Called each tick while in this state
/// 3. `exit()` - Called once when leaving this state, including when the
///    machine is finished from outside
pub trait State<Ctx = ()>: fmt::Debug {
    /// State name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Called when entering this state.
    fn enter(&mut self, _ctx: &mut Ctx) {}

    /// Called each tick while in this state.
    fn update(&mut self, ctx: &mut Ctx) -> Transition<Ctx>;

    /// Called when exiting this state.
    fn exit(&mut self, _ctx: &mut Ctx) {}
}

// ============================================================================
// Transition
// ============================================================================

/// Represents a state transition decision.
pub enum Transition<Ctx = ()> {
    /// Stay in the current state.
    None,
    /// Transition to a new state.
    To(Box<dyn State<Ctx>>),
    /// Leave the current state and finish the machine.
    Pop,
}

impl<Ctx> Transition<Ctx> {
    /// Create a transition to a new state.
    pub fn to<S: State<Ctx> + 'static>(state: S) -> Self {
        Transition::To(Box::new(state))
    }
}

impl<Ctx> fmt::Debug for Transition<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::None => write!(f, "Transition::None"),
            Transition::To(state) => write!(f, "Transition::To({})", state.name()),
            Transition::Pop => write!(f, "Transition::Pop"),
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// A finite state machine that manages state transitions.
///
/// # Type Parameters
///
/// - `Ctx`: Context type passed to state methods
pub struct StateMachine<Ctx = ()> {
    /// Current active state
    current: Box<dyn State<Ctx>>,
    /// Whether enter() has been called on current state
    entered: bool,
    /// Set once the current state popped or the machine was finished
    finished: bool,
}

impl<Ctx> StateMachine<Ctx> {
    /// Create a new state machine with an initial state.
    ///
    /// The initial state's `enter()` will be called on the first `update()`.
    pub fn new<S: State<Ctx> + 'static>(initial: S) -> Self {
        Self {
            current: Box::new(initial),
            entered: false,
            finished: false,
        }
    }

    /// Update the state machine.
    ///
    /// Calls `enter()` on first update, then `update()` each tick. Does
    /// nothing once finished.
    pub fn update(&mut self, ctx: &mut Ctx) {
        if self.finished {
            return;
        }

        if !self.entered {
            self.current.enter(ctx);
            self.entered = true;
        }

        match self.current.update(ctx) {
            Transition::None => {}
            Transition::To(mut new_state) => {
                self.current.exit(ctx);
                new_state.enter(ctx);
                self.current = new_state;
                self.entered = true;
            }
            Transition::Pop => {
                self.current.exit(ctx);
                self.finished = true;
            }
        }
    }

    /// Force a transition to a new state.
    ///
    /// Immediately exits the current state and enters the new one.
    pub fn transition<S: State<Ctx> + 'static>(&mut self, ctx: &mut Ctx, new_state: S) {
        if self.entered && !self.finished {
            self.current.exit(ctx);
        }

        self.current = Box::new(new_state);
        self.current.enter(ctx);
        self.entered = true;
        self.finished = false;
    }

    /// Exit the current state and stop updating.
    pub fn finish(&mut self, ctx: &mut Ctx) {
        if self.finished {
            return;
        }
        if self.entered {
            self.current.exit(ctx);
        }
        self.finished = true;
    }

    /// Whether the machine has finished
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Get the name of the current (or last) state.
    #[must_use]
    pub fn current_state_name(&self) -> &'static str {
        self.current.name()
    }

    /// Check if the FSM is in a state with the given name.
    #[must_use]
    pub fn is_in_state(&self, name: &str) -> bool {
        !self.finished && self.current.name() == name
    }
}

impl<Ctx> fmt::Debug for StateMachine<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current.name())
            .field("entered", &self.entered)
            .field("finished", &self.finished)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
