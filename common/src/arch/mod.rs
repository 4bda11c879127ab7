//! Target selection for local interrupt control.
//!
//! Drivers name [`LocalIrq`] instead of a concrete architecture type so the
//! same code runs on hardware and in host-side simulation.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm;
        pub use arm::irq::ArmIrq as LocalIrq;
    } else {
        pub mod host;
        pub use host::HostIrq as LocalIrq;
    }
}
