//! Voltage regulator (power rail) Hardware Abstraction Layer.

/// Handle returned by [`RegulatorProvider::get`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegulatorId(pub usize);

/// Regulator errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegulatorError {
    /// No supply with that name is wired to this consumer.
    NotFound,
    /// The supply exists but could not be switched.
    Io,
}

/// Consumer view of the platform's regulator framework.
pub trait RegulatorProvider {
    /// Look up a supply by name.
    fn get(&mut self, name: &'static str) -> Result<RegulatorId, RegulatorError>;

    /// Drop a handle obtained from `get`.
    fn put(&mut self, id: RegulatorId);

    fn enable(&mut self, id: RegulatorId) -> Result<(), RegulatorError>;

    fn disable(&mut self, id: RegulatorId) -> Result<(), RegulatorError>;

    /// Declare the expected load in microamps.
    fn set_load(&mut self, id: RegulatorId, load_ua: u32) -> Result<(), RegulatorError>;
}
