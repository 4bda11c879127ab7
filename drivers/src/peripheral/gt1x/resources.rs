//! Acquisition and release of the GT1x hardware resources.
//!
//! Resources are taken in a fixed order: pin-mux (and its states), interrupt
//! GPIO, reset GPIO, the two power GPIOs, then the analog and bus rails.
//! Every handle is held in an `Option`, and release walks them in exact
//! reverse order, so a failed acquisition and a normal detach share one
//! rollback path.

use alloc::boxed::Box;

use log::{debug, error, warn};

use crate::hal::gpio::{GpioController, GpioNum, PinLevel};
use crate::hal::interrupt::IrqNumber;
use crate::hal::pinctrl::{PinController, PinStateId};
use crate::hal::regulator::{RegulatorError, RegulatorId, RegulatorProvider};

use super::config::{Gt1xConfig, PinStateNames};
use super::error::{ResourceStep, TouchError};

/// Pin-mux configurations of the touch pins.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinMux {
    Wakeup,
    Normal,
    PowerOff,
    Sleep,
}

#[derive(Debug, Copy, Clone)]
struct PinStates {
    wakeup: PinStateId,
    /// Optional in board descriptions; selecting it is then a no-op.
    normal: Option<PinStateId>,
    poweroff: PinStateId,
    sleep: PinStateId,
}

impl PinStates {
    fn id(&self, which: PinMux) -> Option<PinStateId> {
        match which {
            PinMux::Wakeup => Some(self.wakeup),
            PinMux::Normal => self.normal,
            PinMux::PowerOff => Some(self.poweroff),
            PinMux::Sleep => Some(self.sleep),
        }
    }
}

/// GPIO lines and rails owned by the driver. `None` means the line or rail
/// is not controlled by this driver (absent from the board, or not acquired).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PowerRailSet {
    pub int_gpio: Option<GpioNum>,
    pub rst_gpio: Option<GpioNum>,
    pub pwr_gpio: Option<GpioNum>,
    pub pwr_io_gpio: Option<GpioNum>,
    pub vdd_ana: Option<RegulatorId>,
    pub vcc_i2c: Option<RegulatorId>,
}

pub struct Resources {
    gpio: Box<dyn GpioController + Send>,
    regulators: Box<dyn RegulatorProvider + Send>,
    pinctrl: Box<dyn PinController + Send>,
    pinctrl_held: bool,
    pins: Option<PinStates>,
    active: Option<PinMux>,
    rails: PowerRailSet,
    irq: Option<IrqNumber>,
}

impl Resources {
    /// Take every resource the configuration names. On failure everything
    /// already taken is released again, newest first.
    pub fn acquire(
        config: &Gt1xConfig,
        gpio: Box<dyn GpioController + Send>,
        regulators: Box<dyn RegulatorProvider + Send>,
        pinctrl: Box<dyn PinController + Send>,
    ) -> Result<Self, TouchError> {
        let mut res = Self {
            gpio,
            regulators,
            pinctrl,
            pinctrl_held: false,
            pins: None,
            active: None,
            rails: PowerRailSet::default(),
            irq: None,
        };
        match res.acquire_all(config) {
            Ok(()) => Ok(res),
            Err(e) => {
                error!("gt1x: resource acquisition failed: {}", e);
                res.release();
                Err(e)
            }
        }
    }

    fn acquire_all(&mut self, config: &Gt1xConfig) -> Result<(), TouchError> {
        let int = config
            .int_gpio
            .ok_or(TouchError::InvalidConfig("interrupt line is required"))?;
        let rst = config
            .rst_gpio
            .ok_or(TouchError::InvalidConfig("reset line is required"))?;

        self.acquire_pinctrl(&config.pin_states)?;

        self.claim_line(int, "gt1x_int", ResourceStep::InterruptGpio, None)?;
        self.rails.int_gpio = Some(int);
        match self.gpio.to_irq(int) {
            Ok(irq) => self.irq = Some(irq),
            Err(e) => {
                error!("gt1x: gpio {} has no interrupt: {:?}", int, e);
                return Err(TouchError::ResourceUnavailable(ResourceStep::InterruptGpio));
            }
        }

        self.claim_line(rst, "gt1x_rst", ResourceStep::ResetGpio, Some(PinLevel::Low))?;
        self.rails.rst_gpio = Some(rst);

        if let Some(pwr) = config.pwr_gpio {
            self.claim_line(pwr, "gt1x_pwr", ResourceStep::PowerGpio, Some(PinLevel::Low))?;
            self.rails.pwr_gpio = Some(pwr);
        }
        if let Some(pwr_io) = config.pwr_io_gpio {
            self.claim_line(
                pwr_io,
                "gt1x_pwr_io",
                ResourceStep::PowerIoGpio,
                Some(PinLevel::Low),
            )?;
            self.rails.pwr_io_gpio = Some(pwr_io);
        }

        self.rails.vdd_ana = self.get_rail(config.vdd_ana, ResourceStep::AnalogRail)?;
        if let Some(ana) = self.rails.vdd_ana {
            // Start from a known-off analog rail.
            if let Err(e) = self.regulators.disable(ana) {
                warn!("gt1x: {} disable failed: {:?}", config.vdd_ana, e);
            }
            if let Err(e) = self.regulators.set_load(ana, 0) {
                warn!("gt1x: {} load reset failed: {:?}", config.vdd_ana, e);
            }
        }
        self.rails.vcc_i2c = self.get_rail(config.vcc_i2c, ResourceStep::BusRail)?;

        debug!("gt1x: resources acquired: {:?}", self.rails);
        Ok(())
    }

    fn acquire_pinctrl(&mut self, names: &PinStateNames) -> Result<(), TouchError> {
        self.pinctrl.get().map_err(|e| {
            error!("gt1x: no pin controller: {:?}", e);
            TouchError::ResourceUnavailable(ResourceStep::PinMux)
        })?;
        self.pinctrl_held = true;

        let wakeup = required_state(&mut *self.pinctrl, names.wakeup)?;
        let normal = match self.pinctrl.lookup_state(names.normal) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("gt1x: running without a {} pin state", names.normal);
                None
            }
        };
        let poweroff = required_state(&mut *self.pinctrl, names.poweroff)?;
        let sleep = required_state(&mut *self.pinctrl, names.sleep)?;

        self.pins = Some(PinStates {
            wakeup,
            normal,
            poweroff,
            sleep,
        });
        Ok(())
    }

    /// Request `pin` and set its direction: input for `None`, output at the
    /// given level otherwise. A direction failure frees the line again.
    fn claim_line(
        &mut self,
        pin: GpioNum,
        label: &'static str,
        step: ResourceStep,
        output: Option<PinLevel>,
    ) -> Result<(), TouchError> {
        if let Err(e) = self.gpio.request(pin, label) {
            error!("gt1x: {} (gpio {}) request failed: {:?}", step, pin, e);
            return Err(TouchError::ResourceUnavailable(step));
        }
        let dir = match output {
            None => self.gpio.set_input(pin),
            Some(level) => self.gpio.set_output(pin, level),
        };
        if let Err(e) = dir {
            error!("gt1x: {} (gpio {}) direction failed: {:?}", step, pin, e);
            self.gpio.free(pin);
            return Err(TouchError::ResourceUnavailable(step));
        }
        Ok(())
    }

    fn get_rail(
        &mut self,
        name: &'static str,
        step: ResourceStep,
    ) -> Result<Option<RegulatorId>, TouchError> {
        match self.regulators.get(name) {
            Ok(id) => Ok(Some(id)),
            Err(RegulatorError::NotFound) => {
                warn!("gt1x: regulator {} not found, not controlled here", name);
                Ok(None)
            }
            Err(e) => {
                error!("gt1x: regulator {} failed: {:?}", name, e);
                Err(TouchError::ResourceUnavailable(step))
            }
        }
    }

    /// Give everything back, newest first. Idempotent.
    pub fn release(&mut self) {
        if let Some(id) = self.rails.vcc_i2c.take() {
            self.regulators.put(id);
        }
        if let Some(id) = self.rails.vdd_ana.take() {
            self.regulators.put(id);
        }
        for pin in [self.rails.pwr_io_gpio.take(), self.rails.pwr_gpio.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = self.gpio.set_level(pin, PinLevel::Low) {
                warn!("gt1x: gpio {} low on release: {:?}", pin, e);
            }
            self.gpio.free(pin);
        }
        if let Some(rst) = self.rails.rst_gpio.take() {
            if let Err(e) = self.gpio.set_output(rst, PinLevel::Low) {
                warn!("gt1x: reset gpio {} low on release: {:?}", rst, e);
            }
            self.gpio.free(rst);
        }
        self.irq = None;
        if let Some(int) = self.rails.int_gpio.take() {
            if let Err(e) = self.gpio.set_input(int) {
                warn!("gt1x: int gpio {} input on release: {:?}", int, e);
            }
            self.gpio.free(int);
        }
        self.pins = None;
        self.active = None;
        if core::mem::take(&mut self.pinctrl_held) {
            self.pinctrl.put();
        }
    }

    pub fn is_released(&self) -> bool {
        !self.pinctrl_held && self.rails == PowerRailSet::default()
    }

    pub fn rails(&self) -> &PowerRailSet {
        &self.rails
    }

    /// Interrupt number behind the interrupt GPIO.
    pub fn irq(&self) -> Option<IrqNumber> {
        self.irq
    }

    pub fn active_pins(&self) -> Option<PinMux> {
        self.active
    }

    /// Switch the touch pins to `which`. Selecting a state the board does
    /// not describe is a no-op.
    pub fn select_pins(&mut self, which: PinMux) -> Result<(), TouchError> {
        let Some(pins) = self.pins else {
            return Err(TouchError::ResourceUnavailable(ResourceStep::PinMux));
        };
        let Some(id) = pins.id(which) else {
            debug!("gt1x: no {:?} pin state, skipped", which);
            return Ok(());
        };
        self.pinctrl.select_state(id).map_err(|e| {
            error!("gt1x: selecting {:?} pins failed: {:?}", which, e);
            TouchError::ResourceUnavailable(ResourceStep::PinMux)
        })?;
        self.active = Some(which);
        Ok(())
    }

    /// Drive both power-enable lines, where present.
    pub fn set_power_gpios(&mut self, level: PinLevel) -> Result<(), TouchError> {
        if let Some(pwr) = self.rails.pwr_gpio {
            self.drive(pwr, level, ResourceStep::PowerGpio)?;
        }
        if let Some(pwr_io) = self.rails.pwr_io_gpio {
            self.drive(pwr_io, level, ResourceStep::PowerIoGpio)?;
        }
        Ok(())
    }

    /// Enable the analog rail, then the bus rail. If the bus rail fails the
    /// analog rail is switched back off.
    pub fn rails_on(&mut self) -> Result<(), TouchError> {
        if let Some(ana) = self.rails.vdd_ana {
            self.regulators.enable(ana).map_err(|e| {
                error!("gt1x: analog rail enable failed: {:?}", e);
                TouchError::ResourceUnavailable(ResourceStep::AnalogRail)
            })?;
        }
        if let Some(bus) = self.rails.vcc_i2c {
            if let Err(e) = self.regulators.enable(bus) {
                error!("gt1x: bus rail enable failed: {:?}", e);
                if let Some(ana) = self.rails.vdd_ana {
                    if let Err(e) = self.regulators.disable(ana) {
                        warn!("gt1x: analog rail disable failed: {:?}", e);
                    }
                }
                return Err(TouchError::ResourceUnavailable(ResourceStep::BusRail));
            }
        }
        Ok(())
    }

    /// Disable the bus rail, then the analog rail and drop its load.
    /// Failures are logged; switching off always runs to the end.
    pub fn rails_off(&mut self) {
        if let Some(bus) = self.rails.vcc_i2c {
            if let Err(e) = self.regulators.disable(bus) {
                warn!("gt1x: bus rail disable failed: {:?}", e);
            }
        }
        if let Some(ana) = self.rails.vdd_ana {
            if let Err(e) = self.regulators.disable(ana) {
                warn!("gt1x: analog rail disable failed: {:?}", e);
            }
            if let Err(e) = self.regulators.set_load(ana, 0) {
                warn!("gt1x: analog rail load reset failed: {:?}", e);
            }
        }
    }

    pub fn set_reset(&mut self, level: PinLevel) -> Result<(), TouchError> {
        let rst = self.line(self.rails.rst_gpio, ResourceStep::ResetGpio)?;
        self.gpio
            .set_output(rst, level)
            .map_err(|_| TouchError::ResourceUnavailable(ResourceStep::ResetGpio))
    }

    /// Drive the interrupt line as an output (address select, wake pulse).
    pub fn drive_int(&mut self, level: PinLevel) -> Result<(), TouchError> {
        let int = self.line(self.rails.int_gpio, ResourceStep::InterruptGpio)?;
        self.gpio
            .set_output(int, level)
            .map_err(|_| TouchError::ResourceUnavailable(ResourceStep::InterruptGpio))
    }

    /// Hand the interrupt line back to the controller.
    pub fn float_int(&mut self) -> Result<(), TouchError> {
        let int = self.line(self.rails.int_gpio, ResourceStep::InterruptGpio)?;
        self.gpio
            .set_input(int)
            .map_err(|_| TouchError::ResourceUnavailable(ResourceStep::InterruptGpio))
    }

    fn line(&self, pin: Option<GpioNum>, step: ResourceStep) -> Result<GpioNum, TouchError> {
        pin.ok_or(TouchError::ResourceUnavailable(step))
    }

    fn drive(&mut self, pin: GpioNum, level: PinLevel, step: ResourceStep) -> Result<(), TouchError> {
        self.gpio.set_level(pin, level).map_err(|e| {
            error!("gt1x: {} (gpio {}) set failed: {:?}", step, pin, e);
            TouchError::ResourceUnavailable(step)
        })
    }
}

fn required_state(
    pinctrl: &mut dyn PinController,
    name: &'static str,
) -> Result<PinStateId, TouchError> {
    pinctrl.lookup_state(name).map_err(|e| {
        error!("gt1x: pin state {} missing: {:?}", name, e);
        TouchError::ResourceUnavailable(ResourceStep::PinMux)
    })
}
