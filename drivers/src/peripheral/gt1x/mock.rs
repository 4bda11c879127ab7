//! Fake platform for tests.
//!
//! Every fake appends what it was asked to do to one shared [`OpLog`], so
//! tests can check the exact order of hardware operations across GPIO,
//! regulators, pin-mux, interrupt controller, bus and input sink.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::hal::bus::{BusError, RegisterBus};
use crate::hal::gpio::{GpioController, GpioError, GpioNum, PinLevel};
use crate::hal::input::{InputDeviceInfo, InputError, InputEvent, InputSink};
use crate::hal::interrupt::{InterruptController, IrqError, IrqNumber, TriggerMode};
use crate::hal::pinctrl::{PinController, PinStateId, PinctrlError};
use crate::hal::regulator::{RegulatorError, RegulatorId, RegulatorProvider};
use crate::hal::timer::Delay;

use super::config::Gt1xConfig;
use super::device::{Gt1x, Platform};
use super::regs::{REG_PRODUCT_ID, RECORD_LEN};

pub const INT_GPIO: GpioNum = 5;
pub const RST_GPIO: GpioNum = 6;
pub const PWR_GPIO: GpioNum = 7;
pub const PWR_IO_GPIO: GpioNum = 8;
pub const IRQ_BASE: IrqNumber = 100;
pub const TOUCH_IRQ: IrqNumber = IRQ_BASE + INT_GPIO;

pub fn test_config() -> Gt1xConfig {
    Gt1xConfig::new(INT_GPIO, RST_GPIO).power_gpios(PWR_GPIO, PWR_IO_GPIO)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    GpioRequest(GpioNum),
    GpioFree(GpioNum),
    GpioInput(GpioNum),
    GpioOutput(GpioNum, PinLevel),
    GpioSet(GpioNum, PinLevel),
    RegGet(&'static str),
    RegPut(&'static str),
    RegEnable(&'static str),
    RegDisable(&'static str),
    RegLoad(&'static str, u32),
    PinctrlGet,
    PinctrlPut,
    PinLookup(&'static str),
    PinSelect(&'static str),
    IrqRequest(IrqNumber),
    IrqFree(IrqNumber),
    IrqEnable(IrqNumber),
    IrqDisable(IrqNumber),
    BusRead(u16, usize),
    BusWrite(u16, Vec<u8>),
    InputRegister,
    InputUnregister,
    DelayUs(u32),
}

impl Op {
    pub fn is_delay(&self) -> bool {
        matches!(self, Op::DelayUs(_))
    }
}

#[derive(Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<Op>>>);

impl OpLog {
    pub fn push(&self, op: Op) {
        self.0.lock().unwrap().push(op);
    }

    pub fn take(&self) -> Vec<Op> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn snapshot(&self) -> Vec<Op> {
        self.0.lock().unwrap().clone()
    }

    /// Everything except delays.
    pub fn hardware(&self) -> Vec<Op> {
        self.snapshot().into_iter().filter(|op| !op.is_delay()).collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn count(&self, op: &Op) -> usize {
        self.0.lock().unwrap().iter().filter(|o| *o == op).count()
    }
}

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<InputEvent>>>);

impl EventLog {
    pub fn take(&self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

#[derive(Default)]
struct Script {
    queues: HashMap<u16, VecDeque<Result<Vec<u8>, BusError>>>,
    product_id_failures: usize,
    read_delay: Option<Duration>,
    fail_writes: bool,
}

/// Scripted register contents shared between a test and its [`FakeBus`].
#[derive(Clone, Default)]
pub struct BusScript(Arc<Mutex<Script>>);

impl BusScript {
    /// Queue one response for the next read of `reg`.
    pub fn push_read(&self, reg: u16, bytes: &[u8]) {
        let mut script = self.0.lock().unwrap();
        script.queues.entry(reg).or_default().push_back(Ok(bytes.to_vec()));
    }

    pub fn push_read_error(&self, reg: u16, err: BusError) {
        let mut script = self.0.lock().unwrap();
        script.queues.entry(reg).or_default().push_back(Err(err));
    }

    /// Fail the next `n` product-id probes.
    pub fn fail_product_id(&self, n: usize) {
        self.0.lock().unwrap().product_id_failures = n;
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.0.lock().unwrap().read_delay = Some(delay);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.lock().unwrap().fail_writes = fail;
    }
}

pub struct FakeBus {
    log: OpLog,
    script: BusScript,
}

impl FakeBus {
    pub fn new(log: OpLog, script: BusScript) -> Self {
        Self { log, script }
    }
}

impl RegisterBus for FakeBus {
    fn read(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), BusError> {
        self.log.push(Op::BusRead(reg, buf.len()));
        let (delay, response) = {
            let mut script = self.script.0.lock().unwrap();
            let response = if reg == REG_PRODUCT_ID && script.product_id_failures > 0 {
                script.product_id_failures -= 1;
                Err(BusError::Nack)
            } else if let Some(queued) = script.queues.get_mut(&reg).and_then(|q| q.pop_front()) {
                queued
            } else if reg == REG_PRODUCT_ID {
                Ok(b"1158".to_vec())
            } else {
                Ok(Vec::new())
            };
            (script.read_delay, response)
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        let bytes = response?;
        buf.fill(0);
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(())
    }

    fn write(&mut self, reg: u16, data: &[u8]) -> Result<(), BusError> {
        self.log.push(Op::BusWrite(reg, data.to_vec()));
        if self.script.0.lock().unwrap().fail_writes {
            return Err(BusError::Nack);
        }
        Ok(())
    }
}

pub struct FakeGpio {
    log: OpLog,
    fail_request: Vec<GpioNum>,
}

impl FakeGpio {
    pub fn new(log: OpLog, fail_request: Vec<GpioNum>) -> Self {
        Self { log, fail_request }
    }
}

impl GpioController for FakeGpio {
    fn request(&mut self, pin: GpioNum, _label: &'static str) -> Result<(), GpioError> {
        if self.fail_request.contains(&pin) {
            return Err(GpioError::Busy);
        }
        self.log.push(Op::GpioRequest(pin));
        Ok(())
    }

    fn free(&mut self, pin: GpioNum) {
        self.log.push(Op::GpioFree(pin));
    }

    fn set_input(&mut self, pin: GpioNum) -> Result<(), GpioError> {
        self.log.push(Op::GpioInput(pin));
        Ok(())
    }

    fn set_output(&mut self, pin: GpioNum, level: PinLevel) -> Result<(), GpioError> {
        self.log.push(Op::GpioOutput(pin, level));
        Ok(())
    }

    fn set_level(&mut self, pin: GpioNum, level: PinLevel) -> Result<(), GpioError> {
        self.log.push(Op::GpioSet(pin, level));
        Ok(())
    }

    fn to_irq(&self, pin: GpioNum) -> Result<IrqNumber, GpioError> {
        Ok(IRQ_BASE + pin)
    }
}

pub struct FakeRegulators {
    log: OpLog,
    names: Vec<&'static str>,
    missing: Vec<&'static str>,
    broken: Vec<&'static str>,
    refuse_enable: Vec<&'static str>,
}

impl FakeRegulators {
    pub fn new(log: OpLog, missing: Vec<&'static str>, broken: Vec<&'static str>) -> Self {
        Self {
            log,
            names: Vec::new(),
            missing,
            broken,
            refuse_enable: Vec::new(),
        }
    }

    /// Rails that are found but fail to switch on.
    pub fn refusing_enable(mut self, names: Vec<&'static str>) -> Self {
        self.refuse_enable = names;
        self
    }
}

impl RegulatorProvider for FakeRegulators {
    fn get(&mut self, name: &'static str) -> Result<RegulatorId, RegulatorError> {
        if self.missing.contains(&name) {
            return Err(RegulatorError::NotFound);
        }
        if self.broken.contains(&name) {
            return Err(RegulatorError::Io);
        }
        self.log.push(Op::RegGet(name));
        self.names.push(name);
        Ok(RegulatorId(self.names.len() - 1))
    }

    fn put(&mut self, id: RegulatorId) {
        self.log.push(Op::RegPut(self.names[id.0]));
    }

    fn enable(&mut self, id: RegulatorId) -> Result<(), RegulatorError> {
        let name = self.names[id.0];
        if self.refuse_enable.contains(&name) {
            return Err(RegulatorError::Io);
        }
        self.log.push(Op::RegEnable(name));
        Ok(())
    }

    fn disable(&mut self, id: RegulatorId) -> Result<(), RegulatorError> {
        self.log.push(Op::RegDisable(self.names[id.0]));
        Ok(())
    }

    fn set_load(&mut self, id: RegulatorId, load_ua: u32) -> Result<(), RegulatorError> {
        self.log.push(Op::RegLoad(self.names[id.0], load_ua));
        Ok(())
    }
}

pub struct FakePinctrl {
    log: OpLog,
    names: Vec<&'static str>,
    fail_get: bool,
    missing: Vec<&'static str>,
}

impl FakePinctrl {
    pub fn new(log: OpLog, fail_get: bool, missing: Vec<&'static str>) -> Self {
        Self {
            log,
            names: Vec::new(),
            fail_get,
            missing,
        }
    }
}

impl PinController for FakePinctrl {
    fn get(&mut self) -> Result<(), PinctrlError> {
        if self.fail_get {
            return Err(PinctrlError::NotFound);
        }
        self.log.push(Op::PinctrlGet);
        Ok(())
    }

    fn put(&mut self) {
        self.log.push(Op::PinctrlPut);
    }

    fn lookup_state(&mut self, name: &'static str) -> Result<PinStateId, PinctrlError> {
        self.log.push(Op::PinLookup(name));
        if self.missing.contains(&name) {
            return Err(PinctrlError::NotFound);
        }
        self.names.push(name);
        Ok(PinStateId(self.names.len() - 1))
    }

    fn select_state(&mut self, state: PinStateId) -> Result<(), PinctrlError> {
        self.log.push(Op::PinSelect(self.names[state.0]));
        Ok(())
    }
}

pub struct FakeIrq {
    log: OpLog,
    fail_request: bool,
}

impl FakeIrq {
    pub fn new(log: OpLog) -> Self {
        Self {
            log,
            fail_request: false,
        }
    }
}

impl InterruptController for FakeIrq {
    fn request(
        &mut self,
        irq: IrqNumber,
        _trigger: TriggerMode,
        _name: &'static str,
    ) -> Result<(), IrqError> {
        if self.fail_request {
            return Err(IrqError::Busy);
        }
        self.log.push(Op::IrqRequest(irq));
        Ok(())
    }

    fn free(&mut self, irq: IrqNumber) {
        self.log.push(Op::IrqFree(irq));
    }

    fn enable(&mut self, irq: IrqNumber) -> Result<(), IrqError> {
        self.log.push(Op::IrqEnable(irq));
        Ok(())
    }

    fn disable(&mut self, irq: IrqNumber) -> Result<(), IrqError> {
        self.log.push(Op::IrqDisable(irq));
        Ok(())
    }
}

pub struct FakeInput {
    log: OpLog,
    events: EventLog,
    fail_register: bool,
}

impl FakeInput {
    pub fn new(log: OpLog, events: EventLog, fail_register: bool) -> Self {
        Self {
            log,
            events,
            fail_register,
        }
    }
}

impl InputSink for FakeInput {
    fn register(&mut self, _info: &InputDeviceInfo) -> Result<(), InputError> {
        if self.fail_register {
            return Err(InputError::Rejected);
        }
        self.log.push(Op::InputRegister);
        Ok(())
    }

    fn unregister(&mut self) {
        self.log.push(Op::InputUnregister);
    }

    fn report(&mut self, event: InputEvent) {
        self.events.0.lock().unwrap().push(event);
    }
}

/// Records requested delays without sleeping.
pub struct FakeDelay {
    log: OpLog,
}

impl FakeDelay {
    pub fn new(log: OpLog) -> Self {
        Self { log }
    }
}

impl Delay for FakeDelay {
    fn delay_us(&self, us: u32) {
        self.log.push(Op::DelayUs(us));
    }
}

/// A complete fake platform plus fault-injection knobs. Set the knobs, then
/// call [`Rig::platform`].
#[derive(Default)]
pub struct Rig {
    pub log: OpLog,
    pub bus: BusScript,
    pub events: EventLog,
    pub gpio_fail_request: Vec<GpioNum>,
    pub missing_regulators: Vec<&'static str>,
    pub broken_regulators: Vec<&'static str>,
    pub refused_rails: Vec<&'static str>,
    pub pinctrl_fail_get: bool,
    pub missing_pin_states: Vec<&'static str>,
    pub irq_fail_request: bool,
    pub input_fail_register: bool,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(&self) -> Platform {
        Platform::new(
            Box::new(FakeBus::new(self.log.clone(), self.bus.clone())),
            Box::new(FakeGpio::new(self.log.clone(), self.gpio_fail_request.clone())),
            Box::new(FakeRegulators::new(
                self.log.clone(),
                self.missing_regulators.clone(),
                self.broken_regulators.clone(),
            )
            .refusing_enable(self.refused_rails.clone())),
            Box::new(FakePinctrl::new(
                self.log.clone(),
                self.pinctrl_fail_get,
                self.missing_pin_states.clone(),
            )),
            Box::new(FakeIrq {
                log: self.log.clone(),
                fail_request: self.irq_fail_request,
            }),
            Box::new(FakeInput::new(
                self.log.clone(),
                self.events.clone(),
                self.input_fail_register,
            )),
            Box::new(FakeDelay::new(self.log.clone())),
        )
    }
}

/// Attach with the default test configuration, then clear the logs.
pub fn attached(rig: &Rig) -> Arc<Gt1x> {
    attach_with(rig, test_config(), |p| p)
}

pub fn attach_with(
    rig: &Rig,
    config: Gt1xConfig,
    customize: impl FnOnce(Platform) -> Platform,
) -> Arc<Gt1x> {
    let dev = Gt1x::attach(config, customize(rig.platform())).unwrap();
    rig.log.clear();
    rig.events.take();
    dev
}

/// One contact record as the controller sends it.
pub fn record(id: u8, x: u16, y: u16, size: u16) -> [u8; RECORD_LEN] {
    let [x_lo, x_hi] = x.to_le_bytes();
    let [y_lo, y_hi] = y.to_le_bytes();
    let [s_lo, s_hi] = size.to_le_bytes();
    [id, x_lo, x_hi, y_lo, y_hi, s_lo, s_hi, 0]
}

/// Status byte followed by the given records, zero-padded to `len`.
pub fn frame(status: u8, records: &[[u8; RECORD_LEN]], len: usize) -> Vec<u8> {
    let mut out = vec![status];
    for r in records {
        out.extend_from_slice(r);
    }
    if out.len() < len {
        out.resize(len, 0);
    }
    out
}
