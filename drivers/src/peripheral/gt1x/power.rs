//! Power sequencing for the GT1x: rails, reset and address selection,
//! product-id verification, sleep and wake.
//!
//! [`Hardware`] owns everything that talks to the chip: the register bus,
//! the acquired [`Resources`] and a delay source. It lives behind the
//! device's `hw` lock; every method here expects to be called with that
//! lock held and never touches the interrupt gate.

use alloc::boxed::Box;
use core::fmt;

use log::{debug, info, warn};

use crate::hal::bus::RegisterBus;
use crate::hal::gpio::PinLevel;
use crate::hal::timer::Delay;

use super::config::Gt1xConfig;
use super::error::TouchError;
use super::regs::{
    ADDR_14, CMD_SLEEP, PRODUCT_ID_LEN, REG_CMD, REG_COOR, REG_PRODUCT_ID, command_tail,
};
use super::resources::{PinMux, Resources};

/// What the rails and pins are currently set up for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerState {
    /// Never powered.
    Off,
    /// Rails off, pins in the poweroff state.
    PoweredOff,
    /// Rails on, pins normal.
    On,
    /// Rails on, chip told to sleep, pins in the sleep state.
    Sleep,
    /// Rails on, pins in the wakeup state; the chip watches for gestures.
    Wakeup,
    /// Resources handed back.
    Released,
}

/// Four ASCII bytes read from the product-id register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProductId(pub [u8; PRODUCT_ID_LEN]);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '?' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

pub struct Hardware {
    bus: Box<dyn RegisterBus + Send>,
    res: Resources,
    delay: Box<dyn Delay + Send + Sync>,
    config: Gt1xConfig,
    power: PowerState,
}

impl Hardware {
    pub fn new(
        config: Gt1xConfig,
        bus: Box<dyn RegisterBus + Send>,
        res: Resources,
        delay: Box<dyn Delay + Send + Sync>,
    ) -> Self {
        Self {
            bus,
            res,
            delay,
            config,
            power: PowerState::Off,
        }
    }

    pub fn power_state(&self) -> PowerState {
        self.power
    }

    pub fn resources(&self) -> &Resources {
        &self.res
    }

    pub fn bus(&mut self) -> &mut dyn RegisterBus {
        &mut *self.bus
    }

    pub fn is_powered(&self) -> bool {
        matches!(
            self.power,
            PowerState::On | PowerState::Sleep | PowerState::Wakeup
        )
    }

    pub fn select_pins(&mut self, which: PinMux) -> Result<(), TouchError> {
        self.res.select_pins(which)
    }

    /// Pins normal, power lines high, rails up, then let the chip settle.
    /// A failure switches the lines already raised back off and parks the
    /// pins; rails are never left half on.
    pub fn power_on(&mut self) -> Result<(), TouchError> {
        self.res.select_pins(PinMux::Normal)?;
        let switched = self
            .res
            .set_power_gpios(PinLevel::High)
            .and_then(|()| self.res.rails_on());
        if let Err(e) = switched {
            if let Err(e) = self.res.set_power_gpios(PinLevel::Low) {
                warn!("gt1x: power gpios: {}", e);
            }
            if let Err(e) = self.res.select_pins(PinMux::PowerOff) {
                warn!("gt1x: poweroff pins: {}", e);
            }
            self.power = PowerState::PoweredOff;
            return Err(e);
        }
        self.delay.delay_ms(self.config.timing.settle_ms);
        self.power = PowerState::On;
        debug!("gt1x: powered on");
        Ok(())
    }

    /// Power lines low, rails down, pins poweroff. Runs to the end even when
    /// single steps fail.
    pub fn power_off(&mut self) {
        if let Err(e) = self.res.set_power_gpios(PinLevel::Low) {
            warn!("gt1x: power gpios: {}", e);
        }
        self.res.rails_off();
        if let Err(e) = self.res.select_pins(PinMux::PowerOff) {
            warn!("gt1x: poweroff pins: {}", e);
        }
        self.delay.delay_ms(self.config.timing.settle_ms);
        self.power = PowerState::PoweredOff;
        debug!("gt1x: powered off");
    }

    /// Reset the chip, latch its bus address through INT and check that it
    /// answers with a product id.
    pub fn reset_and_verify(&mut self) -> Result<ProductId, TouchError> {
        let t = self.config.timing;
        let select = if self.config.bus_addr == ADDR_14 {
            PinLevel::High
        } else {
            PinLevel::Low
        };

        self.res.set_reset(PinLevel::Low)?;
        self.res.drive_int(select)?;
        self.delay.delay_ms(t.reset_select_ms);
        self.res.set_reset(PinLevel::High)?;
        self.delay.delay_ms(t.reset_release_ms);
        self.res.drive_int(PinLevel::Low)?;
        self.delay.delay_ms(t.int_sync_ms);
        self.res.float_int()?;

        self.verify()
    }

    fn verify(&mut self) -> Result<ProductId, TouchError> {
        let attempts = self.config.verify_attempts;
        let mut id = [0u8; PRODUCT_ID_LEN];
        for attempt in 1..=attempts {
            match self.bus.read(REG_PRODUCT_ID, &mut id) {
                Ok(()) => return Ok(ProductId(id)),
                Err(e) => {
                    warn!("gt1x: product id read {}/{} failed: {:?}", attempt, attempts, e);
                    if attempt < attempts {
                        self.delay.delay_ms(self.config.timing.verify_interval_ms);
                    }
                }
            }
        }
        Err(TouchError::DeviceUnresponsive)
    }

    /// Reset and verify; on failure power-cycle and try exactly once more.
    pub fn bring_up(&mut self) -> Result<ProductId, TouchError> {
        match self.reset_and_verify() {
            Ok(id) => Ok(id),
            Err(e) => {
                warn!("gt1x: first reset failed ({}), power cycling", e);
                self.power_off();
                self.power_on()?;
                self.reset_and_verify()
                    .map_err(|_| TouchError::DeviceUnresponsive)
            }
        }
    }

    /// Write a command with its data byte and checksum.
    pub fn send_command(&mut self, cmd: u8, data: u8) -> Result<(), TouchError> {
        self.bus.write(REG_CMD + 1, &command_tail(cmd, data))?;
        self.bus.write(REG_CMD, &[cmd])?;
        Ok(())
    }

    /// Park the pins and put the chip to sleep. Failures are logged; the
    /// chip is treated as asleep either way.
    pub fn enter_sleep(&mut self) {
        if let Err(e) = self.res.select_pins(PinMux::Sleep) {
            warn!("gt1x: sleep pins: {}", e);
        }
        if let Err(e) = self.send_command(CMD_SLEEP, 0) {
            warn!("gt1x: sleep command failed: {}", e);
        }
        self.power = PowerState::Sleep;
        info!("gt1x: sleeping");
    }

    /// Keep the chip powered for gesture wake.
    pub fn enter_wakeup_mode(&mut self) -> Result<(), TouchError> {
        self.res.select_pins(PinMux::Wakeup)?;
        self.power = PowerState::Wakeup;
        info!("gt1x: armed for gesture wake");
        Ok(())
    }

    /// Wake from sleep with an INT pulse. Falls back to a full reset when
    /// the chip does not answer.
    pub fn wake(&mut self) -> Result<ProductId, TouchError> {
        let id = match self.pulse_and_verify() {
            Ok(id) => id,
            Err(e) => {
                warn!("gt1x: wake pulse not answered ({}), resetting", e);
                self.reset_and_verify()?
            }
        };
        self.power = PowerState::On;
        Ok(id)
    }

    fn pulse_and_verify(&mut self) -> Result<ProductId, TouchError> {
        self.res.drive_int(PinLevel::High)?;
        self.delay.delay_ms(self.config.timing.wake_pulse_ms);
        self.res.float_int()?;
        self.verify()
    }

    /// Full power cycle and reset after the chip stopped answering.
    pub fn recover(&mut self) -> Result<ProductId, TouchError> {
        warn!("gt1x: resetting unresponsive controller");
        self.power_off();
        self.power_on()?;
        self.reset_and_verify()
    }

    /// Read `buf.len()` report bytes starting `offset` bytes into the
    /// coordinate area.
    pub fn read_report(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), TouchError> {
        self.bus.read(REG_COOR + offset, buf)?;
        Ok(())
    }

    /// Tell the controller the report buffer may be refilled.
    pub fn ack(&mut self) -> Result<(), TouchError> {
        self.bus.write(REG_COOR, &[0])?;
        Ok(())
    }

    pub fn release(&mut self) {
        self.res.release();
        self.power = PowerState::Released;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::bus::BusError;
    use crate::peripheral::gt1x::error::ResourceStep;
    use crate::peripheral::gt1x::mock::{
        BusScript, FakeBus, FakeDelay, FakeGpio, FakePinctrl, FakeRegulators, INT_GPIO, Op,
        OpLog, PWR_GPIO, PWR_IO_GPIO, RST_GPIO, test_config,
    };

    fn hardware(config: Gt1xConfig) -> (Hardware, OpLog, BusScript) {
        hardware_refusing(config, Vec::new())
    }

    fn hardware_refusing(
        config: Gt1xConfig,
        refused: Vec<&'static str>,
    ) -> (Hardware, OpLog, BusScript) {
        let log = OpLog::default();
        let script = BusScript::default();
        let res = Resources::acquire(
            &config,
            Box::new(FakeGpio::new(log.clone(), Vec::new())),
            Box::new(
                FakeRegulators::new(log.clone(), Vec::new(), Vec::new()).refusing_enable(refused),
            ),
            Box::new(FakePinctrl::new(log.clone(), false, Vec::new())),
        )
        .unwrap();
        let hw = Hardware::new(
            config,
            Box::new(FakeBus::new(log.clone(), script.clone())),
            res,
            Box::new(FakeDelay::new(log.clone())),
        );
        log.clear();
        (hw, log, script)
    }

    fn reset_sequence(select: PinLevel) -> Vec<Op> {
        vec![
            Op::GpioOutput(RST_GPIO, PinLevel::Low),
            Op::GpioOutput(INT_GPIO, select),
            Op::DelayUs(2_000),
            Op::GpioOutput(RST_GPIO, PinLevel::High),
            Op::DelayUs(6_000),
            Op::GpioOutput(INT_GPIO, PinLevel::Low),
            Op::DelayUs(50_000),
            Op::GpioInput(INT_GPIO),
            Op::BusRead(REG_PRODUCT_ID, PRODUCT_ID_LEN),
        ]
    }

    #[test]
    fn power_on_then_off() {
        let (mut hw, log, _) = hardware(test_config());
        hw.power_on().unwrap();
        assert_eq!(
            log.take(),
            vec![
                Op::PinSelect("pmx_ts_normal"),
                Op::GpioSet(PWR_GPIO, PinLevel::High),
                Op::GpioSet(PWR_IO_GPIO, PinLevel::High),
                Op::RegEnable("vdd_ana"),
                Op::RegEnable("vcc_i2c"),
                Op::DelayUs(10_000),
            ]
        );
        assert_eq!(hw.power_state(), PowerState::On);

        hw.power_off();
        assert_eq!(
            log.take(),
            vec![
                Op::GpioSet(PWR_GPIO, PinLevel::Low),
                Op::GpioSet(PWR_IO_GPIO, PinLevel::Low),
                Op::RegDisable("vcc_i2c"),
                Op::RegDisable("vdd_ana"),
                Op::RegLoad("vdd_ana", 0),
                Op::PinSelect("pmx_ts_poweroff"),
                Op::DelayUs(10_000),
            ]
        );
        assert_eq!(hw.power_state(), PowerState::PoweredOff);
    }

    #[test]
    fn reset_selects_address_through_int() {
        let (mut hw, log, _) = hardware(test_config());
        let id = hw.reset_and_verify().unwrap();
        assert_eq!(id, ProductId(*b"1158"));
        assert_eq!(log.take(), reset_sequence(PinLevel::Low));

        let (mut hw, log, _) = hardware(test_config().bus_addr(ADDR_14));
        hw.reset_and_verify().unwrap();
        assert_eq!(log.take(), reset_sequence(PinLevel::High));
    }

    #[test]
    fn verify_retries_then_gives_up() {
        let (mut hw, log, script) = hardware(test_config());
        script.fail_product_id(3);
        assert_eq!(hw.reset_and_verify(), Err(TouchError::DeviceUnresponsive));
        let ops = log.take();
        let reads = ops
            .iter()
            .filter(|op| **op == Op::BusRead(REG_PRODUCT_ID, PRODUCT_ID_LEN))
            .count();
        assert_eq!(reads, 3);
        // Two gaps between three probes.
        assert_eq!(ops.iter().filter(|op| **op == Op::DelayUs(10_000)).count(), 2);
    }

    #[test]
    fn bring_up_second_attempt_ends_like_first() {
        let (mut first, _, _) = hardware(test_config());
        first.power_on().unwrap();
        first.bring_up().unwrap();

        let (mut second, log, script) = hardware(test_config());
        second.power_on().unwrap();
        script.fail_product_id(3);
        second.bring_up().unwrap();

        assert_eq!(first.power_state(), second.power_state());
        assert_eq!(first.resources().active_pins(), second.resources().active_pins());
        assert_eq!(second.resources().active_pins(), Some(PinMux::Normal));
        // The retry went through a full power cycle.
        let ops = log.take();
        assert_eq!(ops.iter().filter(|op| **op == Op::RegDisable("vdd_ana")).count(), 1);
        assert_eq!(ops.last(), Some(&Op::BusRead(REG_PRODUCT_ID, PRODUCT_ID_LEN)));
    }

    #[test]
    fn bring_up_fails_after_second_attempt() {
        let (mut hw, _, script) = hardware(test_config());
        hw.power_on().unwrap();
        script.fail_product_id(6);
        assert_eq!(hw.bring_up(), Err(TouchError::DeviceUnresponsive));
    }

    #[test]
    fn failed_bus_rail_switches_everything_back_off() {
        let (mut hw, log, _) = hardware_refusing(test_config(), vec!["vcc_i2c"]);
        assert_eq!(
            hw.power_on(),
            Err(TouchError::ResourceUnavailable(ResourceStep::BusRail))
        );
        assert_eq!(
            log.take(),
            vec![
                Op::PinSelect("pmx_ts_normal"),
                Op::GpioSet(PWR_GPIO, PinLevel::High),
                Op::GpioSet(PWR_IO_GPIO, PinLevel::High),
                Op::RegEnable("vdd_ana"),
                Op::RegDisable("vdd_ana"),
                Op::GpioSet(PWR_GPIO, PinLevel::Low),
                Op::GpioSet(PWR_IO_GPIO, PinLevel::Low),
                Op::PinSelect("pmx_ts_poweroff"),
            ]
        );
        assert_eq!(hw.power_state(), PowerState::PoweredOff);
        assert!(!hw.is_powered());
    }

    #[test]
    fn sleep_command_carries_checksum() {
        let (mut hw, log, _) = hardware(test_config());
        hw.power_on().unwrap();
        log.clear();
        hw.enter_sleep();
        assert_eq!(
            log.take(),
            vec![
                Op::PinSelect("pmx_ts_sleep"),
                Op::BusWrite(REG_CMD + 1, vec![0x00, 0xFB]),
                Op::BusWrite(REG_CMD, vec![CMD_SLEEP]),
            ]
        );
        assert_eq!(hw.power_state(), PowerState::Sleep);
    }

    #[test]
    fn sleep_command_failure_is_not_fatal() {
        let (mut hw, _, script) = hardware(test_config());
        script.fail_writes(true);
        hw.enter_sleep();
        assert_eq!(hw.power_state(), PowerState::Sleep);
    }

    #[test]
    fn wake_falls_back_to_reset() {
        let (mut hw, log, script) = hardware(test_config());
        hw.enter_sleep();
        log.clear();
        script.fail_product_id(3);
        hw.wake().unwrap();
        let ops = log.take();
        assert_eq!(ops[0], Op::GpioOutput(INT_GPIO, PinLevel::High));
        assert!(ops.ends_with(&reset_sequence(PinLevel::Low)));
        assert_eq!(hw.power_state(), PowerState::On);
    }

    #[test]
    fn transport_errors_convert() {
        let (mut hw, _, script) = hardware(test_config());
        script.push_read_error(REG_COOR, BusError::Timeout);
        let mut buf = [0u8; 11];
        assert_eq!(
            hw.read_report(0, &mut buf),
            Err(TouchError::Transport(BusError::Timeout))
        );
    }
}
