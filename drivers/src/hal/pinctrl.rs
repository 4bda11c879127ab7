//! Pin multiplexing (pinctrl) Hardware Abstraction Layer.
//!
//! A consumer owns one pinctrl handle and switches between named states
//! defined by the platform description.

/// Handle for a named pin state, returned by [`PinController::lookup_state`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinStateId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinctrlError {
    /// No pinctrl description, or no state with that name.
    NotFound,
    /// Applying a state failed.
    Io,
}

pub trait PinController {
    /// Take the consumer's pinctrl handle.
    fn get(&mut self) -> Result<(), PinctrlError>;

    /// Release the handle. States looked up through it become invalid.
    fn put(&mut self);

    fn lookup_state(&mut self, name: &'static str) -> Result<PinStateId, PinctrlError>;

    fn select_state(&mut self, state: PinStateId) -> Result<(), PinctrlError>;
}
