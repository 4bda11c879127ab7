//! Per-device context and lifecycle: attach, suspend, resume, detach.
//!
//! Locks are always taken in the order `state`, `hw`, `touch`. The
//! processing phase never takes `state`, so control paths may wait on the
//! interrupt gate while holding it, but never while holding `hw` or `touch`.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use spin::Mutex;

use crate::hal::bus::RegisterBus;
use crate::hal::gpio::GpioController;
use crate::hal::input::InputSink;
use crate::hal::interrupt::InterruptController;
use crate::hal::pinctrl::PinController;
use crate::hal::regulator::RegulatorProvider;
use crate::hal::timer::Delay;

use super::config::{Gt1xConfig, MtProtocol};
use super::decoder::TouchDecoder;
use super::error::{ResourceStep, TouchError};
use super::features::{FeatureHandler, FeatureSet};
use super::gate::InterruptGate;
use super::pipeline::{IrqWork, Notify, context};
use super::power::{Hardware, PowerState};
use super::report;
use super::resources::{PinMux, Resources};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceLifecycleState {
    Uninitialized,
    ResourcesAcquired,
    PoweredOn,
    Running,
    Suspended,
    Failed,
    Released,
}

/// Flags read by the processing phase without locking.
#[derive(Debug, Default)]
pub struct RuntimeFlags {
    halted: AtomicBool,
    update_in_progress: AtomicBool,
    esd_protect: AtomicBool,
    rawdiff_mode: AtomicBool,
}

impl RuntimeFlags {
    /// Suspended or detaching; touch reports are dropped.
    pub fn halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub(crate) fn set_halted(&self, on: bool) {
        self.halted.store(on, Ordering::Release);
    }

    /// A firmware updater owns the controller.
    pub fn update_in_progress(&self) -> bool {
        self.update_in_progress.load(Ordering::Acquire)
    }

    pub fn set_update_in_progress(&self, on: bool) {
        self.update_in_progress.store(on, Ordering::Release);
    }

    /// An external ESD watchdog handles recovery; the pipeline must not
    /// power-cycle the chip on its own.
    pub fn esd_protect(&self) -> bool {
        self.esd_protect.load(Ordering::Acquire)
    }

    pub fn set_esd_protect(&self, on: bool) {
        self.esd_protect.store(on, Ordering::Release);
    }

    /// Raw diagnostic data mode; reports are read but not acknowledged.
    pub fn rawdiff_mode(&self) -> bool {
        self.rawdiff_mode.load(Ordering::Acquire)
    }

    pub fn set_rawdiff_mode(&self, on: bool) {
        self.rawdiff_mode.store(on, Ordering::Release);
    }
}

/// Collaborators a platform hands to [`Gt1x::attach`].
pub struct Platform {
    pub bus: Box<dyn RegisterBus + Send>,
    pub gpio: Box<dyn GpioController + Send>,
    pub regulators: Box<dyn RegulatorProvider + Send>,
    pub pinctrl: Box<dyn PinController + Send>,
    pub irq: Box<dyn InterruptController + Send>,
    pub input: Box<dyn InputSink + Send>,
    pub delay: Box<dyn Delay + Send + Sync>,
    pub features: FeatureSet,
    pub notify: Option<Box<dyn Notify + Send + Sync>>,
}

impl Platform {
    pub fn new(
        bus: Box<dyn RegisterBus + Send>,
        gpio: Box<dyn GpioController + Send>,
        regulators: Box<dyn RegulatorProvider + Send>,
        pinctrl: Box<dyn PinController + Send>,
        irq: Box<dyn InterruptController + Send>,
        input: Box<dyn InputSink + Send>,
        delay: Box<dyn Delay + Send + Sync>,
    ) -> Self {
        Self {
            bus,
            gpio,
            regulators,
            pinctrl,
            irq,
            input,
            delay,
            features: FeatureSet::new(),
            notify: None,
        }
    }

    pub fn with_feature(mut self, handler: Box<dyn FeatureHandler>) -> Self {
        self.features.insert(handler);
        self
    }

    pub fn with_notify(mut self, notify: Box<dyn Notify + Send + Sync>) -> Self {
        self.notify = Some(notify);
        self
    }
}

/// Everything the processing phase needs besides the chip itself.
pub(crate) struct TouchPath {
    pub(crate) decoder: TouchDecoder,
    pub(crate) input: Box<dyn InputSink + Send>,
    pub(crate) features: FeatureSet,
    pub(crate) protocol: MtProtocol,
    registered: bool,
}

/// One attached GT1x.
pub struct Gt1x {
    config: Gt1xConfig,
    state: Mutex<DeviceLifecycleState>,
    pub(super) hw: Mutex<Hardware>,
    pub(super) touch: Mutex<TouchPath>,
    pub(super) gate: InterruptGate,
    pub(super) flags: RuntimeFlags,
    pub(super) work: IrqWork,
    pub(super) notify: Option<Box<dyn Notify + Send + Sync>>,
}

impl Gt1x {
    /// Acquire resources, power up and verify the chip, register the input
    /// device and the interrupt line. On failure everything is released
    /// before the error is returned.
    pub fn attach(config: Gt1xConfig, platform: Platform) -> Result<Arc<Self>, TouchError> {
        config.validate()?;
        let Platform {
            bus,
            gpio,
            regulators,
            pinctrl,
            irq,
            input,
            delay,
            features,
            notify,
        } = platform;

        let res = Resources::acquire(&config, gpio, regulators, pinctrl)?;
        let dev = Self {
            config,
            state: Mutex::new(DeviceLifecycleState::ResourcesAcquired),
            hw: Mutex::new(Hardware::new(config, bus, res, delay)),
            touch: Mutex::new(TouchPath {
                decoder: TouchDecoder::new(&config),
                input,
                features,
                protocol: config.protocol,
                registered: false,
            }),
            gate: InterruptGate::new(irq),
            flags: RuntimeFlags::default(),
            work: IrqWork::new(),
            notify,
        };

        if let Err(e) = dev.start() {
            error!("gt1x: attach failed: {}", e);
            dev.teardown();
            return Err(e);
        }
        info!("gt1x: attached");
        Ok(Arc::new(dev))
    }

    fn start(&self) -> Result<(), TouchError> {
        let mut state = self.state.lock();
        let irq = {
            let mut hw = self.hw.lock();
            hw.select_pins(PinMux::PowerOff)?;
            hw.power_on()?;
            *state = DeviceLifecycleState::PoweredOn;
            let id = hw.bring_up()?;
            info!("gt1x: product id {}", id);
            hw.resources()
                .irq()
                .ok_or(TouchError::ResourceUnavailable(ResourceStep::InterruptGpio))?
        };

        {
            let mut touch = self.touch.lock();
            let info = report::device_info(&self.config);
            touch.input.register(&info).map_err(|e| {
                error!("gt1x: input registration failed: {:?}", e);
                TouchError::ResourceUnavailable(ResourceStep::InputDevice)
            })?;
            touch.registered = true;
        }

        self.gate.request(irq, self.config.trigger, "gt1x")?;
        self.gate.enable();
        *state = DeviceLifecycleState::Running;
        Ok(())
    }

    /// Undo whatever [`start`](Self::start) and acquisition did. Safe to
    /// call more than once.
    fn teardown(&self) {
        self.flags.set_halted(true);
        self.gate.release();
        {
            let mut touch = self.touch.lock();
            let touch = &mut *touch;
            if touch.registered {
                let events = touch.decoder.release_all();
                self.deliver(touch, &events);
                touch.input.unregister();
                touch.registered = false;
            }
        }
        let mut hw = self.hw.lock();
        if hw.is_powered() {
            hw.power_off();
        }
        if hw.power_state() != PowerState::Released {
            hw.release();
        }
    }

    /// Release everything. Idempotent.
    pub fn detach(&self) {
        let mut state = self.state.lock();
        if *state == DeviceLifecycleState::Released {
            return;
        }
        self.teardown();
        *state = DeviceLifecycleState::Released;
        info!("gt1x: detached");
    }

    pub fn suspend(&self) -> Result<(), TouchError> {
        let mut state = self.state.lock();
        match *state {
            DeviceLifecycleState::Suspended => return Ok(()),
            DeviceLifecycleState::Running => {}
            other => return Err(TouchError::InvalidState(other)),
        }
        if self.flags.update_in_progress() {
            warn!("gt1x: suspend refused during firmware update");
            return Err(TouchError::Busy);
        }
        self.flags.set_halted(true);

        let armed = {
            let mut hw = self.hw.lock();
            let mut touch = self.touch.lock();
            let touch = &mut *touch;
            let events = touch.decoder.release_all();
            self.deliver(touch, &events);

            let (mut ctx, features) = context(&mut hw, touch);
            if features.arm_for_suspend(&mut ctx) {
                match hw.enter_wakeup_mode() {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("gt1x: gesture wake unavailable: {}", e);
                        false
                    }
                }
            } else {
                false
            }
        };

        if !armed {
            self.gate.disable();
            self.hw.lock().enter_sleep();
        }
        *state = DeviceLifecycleState::Suspended;
        info!("gt1x: suspended{}", if armed { " (gesture wake)" } else { "" });
        Ok(())
    }

    pub fn resume(&self) -> Result<(), TouchError> {
        let mut state = self.state.lock();
        match *state {
            DeviceLifecycleState::Running => return Ok(()),
            DeviceLifecycleState::Suspended => {}
            other => return Err(TouchError::InvalidState(other)),
        }

        let woke = {
            let mut hw = self.hw.lock();
            if let Err(e) = hw.select_pins(PinMux::Normal) {
                warn!("gt1x: normal pins: {}", e);
            }
            {
                let mut touch = self.touch.lock();
                let (mut ctx, features) = context(&mut hw, &mut touch);
                features.disarm_on_resume(&mut ctx);
            }
            hw.wake()
        };

        match woke {
            Ok(id) => debug!("gt1x: awake, product id {}", id),
            Err(e) => {
                error!("gt1x: resume failed: {}", e);
                self.gate.disable();
                *state = DeviceLifecycleState::Failed;
                return Err(TouchError::DeviceUnresponsive);
            }
        }

        self.flags.set_halted(false);
        self.gate.enable();
        *state = DeviceLifecycleState::Running;
        info!("gt1x: resumed");
        Ok(())
    }

    pub fn state(&self) -> DeviceLifecycleState {
        *self.state.lock()
    }

    pub fn flags(&self) -> &RuntimeFlags {
        &self.flags
    }

    pub fn config(&self) -> &Gt1xConfig {
        &self.config
    }

    pub fn power_state(&self) -> PowerState {
        self.hw.lock().power_state()
    }

    /// Whether the touch interrupt line is currently unmasked.
    pub fn irq_enabled(&self) -> bool {
        self.gate.is_enabled()
    }
}
