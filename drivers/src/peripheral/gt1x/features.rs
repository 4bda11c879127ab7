//! Optional report consumers: gesture wake, cooperative sharing (stylus /
//! host-side data) and proximity.
//!
//! Features are collaborators supplied by the platform. The pipeline offers
//! them each interrupt in fixed priority, gesture first, and a feature that
//! claims a report takes it away from touch decoding.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::debug;

use crate::hal::bus::RegisterBus;
use crate::hal::input::InputSink;

/// Feature category; the declaration order is the consultation order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeatureKind {
    Gesture,
    Sharing,
    Proximity,
}

/// A feature's answer for one interrupt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Not for this feature; keep going.
    NotApplicable,
    /// Consumed; the report is acknowledged.
    Claimed,
    /// Consumed, but the feature failed; the report is left unacknowledged.
    ClaimedWithError,
}

impl Claim {
    pub const fn is_claimed(self) -> bool {
        !matches!(self, Claim::NotApplicable)
    }
}

/// What a feature may touch while it runs.
pub struct FeatureContext<'a> {
    pub bus: &'a mut dyn RegisterBus,
    pub input: &'a mut dyn InputSink,
}

pub trait FeatureHandler: Send {
    fn kind(&self) -> FeatureKind;

    fn name(&self) -> &'static str;

    /// Called before the report header is read; gesture features use this
    /// to consume wake gestures, even while the device is suspended.
    fn on_interrupt(&mut self, _ctx: &mut FeatureContext<'_>) -> Claim {
        Claim::NotApplicable
    }

    /// Called with the report header (sharing and proximity features).
    fn on_report(&mut self, _ctx: &mut FeatureContext<'_>, _header: &[u8]) -> Claim {
        Claim::NotApplicable
    }

    /// The controller raised an interrupt with an empty status byte, which
    /// is how it asks the host to service a pending feature request.
    fn on_request(&mut self, _ctx: &mut FeatureContext<'_>) {}

    /// Return `true` to keep the controller powered and its interrupt armed
    /// across suspend.
    fn arm_for_suspend(&mut self, _ctx: &mut FeatureContext<'_>) -> bool {
        false
    }

    fn disarm_on_resume(&mut self, _ctx: &mut FeatureContext<'_>) {}
}

/// Installed features, kept sorted by [`FeatureKind`].
#[derive(Default)]
pub struct FeatureSet {
    handlers: Vec<Box<dyn FeatureHandler>>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature. Features of the same kind keep insertion order.
    pub fn with(mut self, handler: Box<dyn FeatureHandler>) -> Self {
        self.insert(handler);
        self
    }

    pub fn insert(&mut self, handler: Box<dyn FeatureHandler>) {
        let at = self
            .handlers
            .partition_point(|h| h.kind() <= handler.kind());
        debug!("gt1x: feature {} ({:?}) installed", handler.name(), handler.kind());
        self.handlers.insert(at, handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Consultation order, for diagnostics.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|h| h.name())
    }

    fn of_kind(
        &mut self,
        kind: FeatureKind,
    ) -> impl Iterator<Item = &mut Box<dyn FeatureHandler>> + '_ {
        self.handlers.iter_mut().filter(move |h| h.kind() == kind)
    }

    /// Offer a fresh interrupt to gesture features.
    pub fn claim_interrupt(&mut self, ctx: &mut FeatureContext<'_>) -> Claim {
        for handler in self.of_kind(FeatureKind::Gesture) {
            let claim = handler.on_interrupt(ctx);
            if claim.is_claimed() {
                debug!("gt1x: interrupt claimed by {}: {:?}", handler.name(), claim);
                return claim;
            }
        }
        Claim::NotApplicable
    }

    /// Offer a report header to features of `kind`.
    pub fn offer_report(
        &mut self,
        kind: FeatureKind,
        ctx: &mut FeatureContext<'_>,
        header: &[u8],
    ) -> Claim {
        for handler in self.of_kind(kind) {
            let claim = handler.on_report(ctx, header);
            if claim.is_claimed() {
                debug!("gt1x: report claimed by {}: {:?}", handler.name(), claim);
                return claim;
            }
        }
        Claim::NotApplicable
    }

    pub fn request(&mut self, ctx: &mut FeatureContext<'_>) {
        for handler in self.handlers.iter_mut() {
            handler.on_request(ctx);
        }
    }

    /// Ask every gesture feature whether it wants to stay armed. All of them
    /// are asked, so each can prepare the controller.
    pub fn arm_for_suspend(&mut self, ctx: &mut FeatureContext<'_>) -> bool {
        let mut armed = false;
        for handler in self.of_kind(FeatureKind::Gesture) {
            armed |= handler.arm_for_suspend(ctx);
        }
        armed
    }

    pub fn disarm_on_resume(&mut self, ctx: &mut FeatureContext<'_>) {
        for handler in self.of_kind(FeatureKind::Gesture) {
            handler.disarm_on_resume(ctx);
        }
    }
}
