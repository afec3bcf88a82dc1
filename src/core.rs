use std::convert::TryFrom;
use std::fmt::Write as _;
use std::io::{self, Write};

use tracing::{debug, info};

use crate::alu::AluOp;
use crate::error::{Error, Result};
use crate::isa::Opcode;
use crate::mem::Mem;

pub const REGISTER_COUNT: usize = 8;

/// Initial stack pointer. Popping while SP sits here means the stack is empty.
pub const SP_START: u8 = 0xF4;

pub struct Core<W: Write = io::Stdout> {
    pub mem: Mem,
    reg: [u8; REGISTER_COUNT],
    sp: u8,
    pc: u8,
    running: bool,
    cycle_count: usize,
    trace: bool,
    out: W,
}

impl Core<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Core<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Core<W> {
    /// Builds a machine whose PRN output goes to `out`.
    pub fn with_output(out: W) -> Self {
        Core {
            mem: Default::default(),
            reg: [0; REGISTER_COUNT],
            sp: SP_START,
            pc: 0,
            running: true,
            cycle_count: 0,
            trace: false,
            out,
        }
    }

    pub fn reset(&mut self) {
        self.reg = [0; REGISTER_COUNT];
        self.sp = SP_START;
        self.pc = 0;
        self.running = true;
        self.cycle_count = 0;
    }

    pub fn load_image(&mut self, image: &[u8]) -> Result<()> {
        self.reset();
        self.mem.load_image(image)?;
        info!("loaded {} byte program", image.len());
        Ok(())
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.reg
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn cycle_count(&self) -> usize {
        self.cycle_count
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn reg(&self, index: u8) -> Result<u8> {
        self.reg
            .get(index as usize)
            .copied()
            .ok_or(Error::InvalidRegister { index, pc: self.pc })
    }

    pub fn set_reg(&mut self, index: u8, val: u8) -> Result<()> {
        let pc = self.pc;
        let slot = self
            .reg
            .get_mut(index as usize)
            .ok_or(Error::InvalidRegister { index, pc })?;
        *slot = val;
        Ok(())
    }

    /// Runs `op` on registers `reg_a` and `reg_b`, leaving the result in `reg_a`.
    pub fn alu(&mut self, op: AluOp, reg_a: u8, reg_b: u8) -> Result<()> {
        let a = self.reg(reg_a)?;
        let b = self.reg(reg_b)?;
        self.set_reg(reg_a, op.apply(a, b))
    }

    /// Stores `val` at SP, then moves SP down. SP wraps below address 0.
    pub fn push(&mut self, val: u8) {
        self.mem.write(self.sp, val);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub fn pop(&mut self) -> Result<u8> {
        if self.sp == SP_START {
            return Err(Error::StackEmpty);
        }
        self.sp = self.sp.wrapping_add(1);
        Ok(self.mem.read(self.sp))
    }

    pub fn run(&mut self) -> Result<()> {
        while self.running {
            self.step()?;
        }
        info!("halted after {} cycles", self.cycle_count);
        Ok(())
    }

    pub fn step(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        if self.trace {
            debug!("{}", self.trace());
        }

        let pc = self.pc;
        let ir = self.mem.read(pc);
        let opcode =
            Opcode::try_from(ir).map_err(|_| Error::UnknownOpcode { opcode: ir, pc })?;
        let operand_a = self.mem.read(pc.wrapping_add(1));
        let operand_b = self.mem.read(pc.wrapping_add(2));

        match opcode {
            Opcode::Ldi => self.set_reg(operand_a, operand_b)?,
            Opcode::Prn => {
                let val = self.reg(operand_a)?;
                writeln!(self.out, "{}", val)?;
            }
            Opcode::Mul => self.alu(AluOp::Mul, operand_a, operand_b)?,
            Opcode::Hlt => self.running = false,
            Opcode::Pop => {
                let val = self.pop()?;
                self.set_reg(operand_a, val)?;
            }
            Opcode::Push => {
                let val = self.reg(operand_a)?;
                self.push(val);
            }
        }

        // HLT leaves PC on itself
        if self.running {
            self.pc = pc.wrapping_add(opcode.size());
        }
        self.cycle_count += 1;
        Ok(())
    }

    /// One-line dump of PC, the next three bytes and every register, in hex,
    /// followed by the mnemonic when the byte at PC decodes.
    pub fn trace(&self) -> String {
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            self.mem.read(self.pc),
            self.mem.read(self.pc.wrapping_add(1)),
            self.mem.read(self.pc.wrapping_add(2)),
        );
        for val in self.reg.iter() {
            let _ = write!(line, " {:02X}", val);
        }
        if let Ok(opcode) = Opcode::try_from(self.mem.read(self.pc)) {
            let _ = write!(line, " | {}", opcode);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LDI: u8 = Opcode::Ldi as u8;
    const PRN: u8 = Opcode::Prn as u8;
    const MUL: u8 = Opcode::Mul as u8;
    const HLT: u8 = Opcode::Hlt as u8;
    const POP: u8 = Opcode::Pop as u8;
    const PUSH: u8 = Opcode::Push as u8;

    fn core_with(image: &[u8]) -> Core<Vec<u8>> {
        let mut core = Core::with_output(Vec::<u8>::new());
        core.load_image(image).unwrap();
        core
    }

    fn printed(core: &Core<Vec<u8>>) -> String {
        String::from_utf8(core.output().clone()).unwrap()
    }

    #[test]
    fn initial_state() {
        let core = Core::with_output(Vec::<u8>::new());
        assert_eq!(core.registers(), &[0; REGISTER_COUNT]);
        assert_eq!(core.sp(), 0xF4);
        assert_eq!(core.pc(), 0);
        assert!(core.is_running());
    }

    #[test]
    fn ldi_sets_every_register() {
        for i in 0..REGISTER_COUNT as u8 {
            let mut core = core_with(&[LDI, i, 0x80 + i]);
            core.step().unwrap();
            assert_eq!(core.reg(i).unwrap(), 0x80 + i);
            assert_eq!(core.pc(), 3);
        }
    }

    #[test]
    fn ldi_rejects_out_of_range_register() {
        let mut core = core_with(&[LDI, 8, 1]);
        let err = core.step().unwrap_err();
        assert!(matches!(err, Error::InvalidRegister { index: 8, pc: 0 }));
    }

    #[test]
    fn multiply_and_print() {
        let mut core = core_with(&[LDI, 0, 8, LDI, 1, 9, MUL, 0, 1, PRN, 0, HLT]);
        core.run().unwrap();
        assert_eq!(printed(&core), "72\n");
        assert_eq!(core.pc(), 11);
        assert_eq!(core.cycle_count(), 5);
        assert!(!core.is_running());
    }

    #[test]
    fn mul_wraps() {
        let mut core = core_with(&[LDI, 0, 20, LDI, 1, 20, MUL, 0, 1, HLT]);
        core.run().unwrap();
        assert_eq!(core.reg(0).unwrap(), (400 % 256) as u8);
        assert_eq!(core.reg(1).unwrap(), 20);
    }

    #[test]
    fn add_is_reachable_through_alu() {
        let mut core = Core::with_output(Vec::<u8>::new());
        core.set_reg(2, 250).unwrap();
        core.set_reg(3, 10).unwrap();
        core.alu(AluOp::Add, 2, 3).unwrap();
        assert_eq!(core.reg(2).unwrap(), 4);
        assert_eq!(core.reg(3).unwrap(), 10);
    }

    #[test]
    fn push_then_pop_round_trips() {
        let mut core = core_with(&[PUSH, 0, POP, 1, HLT]);
        core.set_reg(0, 5).unwrap();
        core.step().unwrap();
        assert_eq!(core.sp(), 0xF3);
        assert_eq!(core.mem.read(0xF4), 5);
        core.run().unwrap();
        assert_eq!(core.reg(1).unwrap(), 5);
        assert_eq!(core.sp(), SP_START);
    }

    #[test]
    fn stack_is_lifo() {
        let mut core = Core::with_output(Vec::<u8>::new());
        core.push(1);
        core.push(2);
        core.push(3);
        assert_eq!(core.pop().unwrap(), 3);
        assert_eq!(core.pop().unwrap(), 2);
        assert_eq!(core.pop().unwrap(), 1);
        assert!(matches!(core.pop(), Err(Error::StackEmpty)));
    }

    #[test]
    fn pop_on_empty_stack_fails() {
        let mut core = core_with(&[POP, 0, HLT]);
        let err = core.run().unwrap_err();
        assert!(matches!(err, Error::StackEmpty));
        assert_eq!(err.to_string(), "stack is empty");
        assert_eq!(core.sp(), SP_START);
        assert_eq!(core.pc(), 0);
    }

    #[test]
    fn push_wraps_sp_below_zero() {
        let mut core = Core::with_output(Vec::<u8>::new());
        for _ in 0..=SP_START {
            core.push(0xEE);
        }
        assert_eq!(core.sp(), 0xFF);
        assert_eq!(core.mem.read(0), 0xEE);
    }

    #[test]
    fn unknown_opcode_reports_address() {
        let mut core = core_with(&[LDI, 0, 1, 0xFF]);
        let err = core.run().unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { opcode: 0xFF, pc: 3 }));
    }

    #[test]
    fn empty_image_fails_on_zero_opcode() {
        let mut core = core_with(&[]);
        let err = core.run().unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { opcode: 0, pc: 0 }));
    }

    #[test]
    fn running_past_image_fails_on_zero_opcode() {
        let mut core = core_with(&[LDI, 0, 1]);
        let err = core.run().unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { opcode: 0, pc: 3 }));
    }

    #[test]
    fn halt_keeps_pc_and_step_is_idle_afterwards() {
        let mut core = core_with(&[HLT]);
        core.step().unwrap();
        core.step().unwrap();
        assert_eq!(core.pc(), 0);
        assert_eq!(core.cycle_count(), 1);
    }

    #[test]
    fn load_image_resets_state() {
        let mut core = core_with(&[LDI, 0, 9, PUSH, 0, HLT]);
        core.run().unwrap();
        core.load_image(&[HLT]).unwrap();
        assert_eq!(core.registers(), &[0; REGISTER_COUNT]);
        assert_eq!(core.sp(), SP_START);
        assert_eq!(core.pc(), 0);
        assert!(core.is_running());
        // old pushed value survives in memory
        assert_eq!(core.mem.read(0xF4), 9);
    }

    #[test]
    fn trace_line_format() {
        let mut core = core_with(&[LDI, 0, 8, HLT]);
        assert_eq!(
            core.trace(),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 00 | LDI"
        );
        core.step().unwrap();
        assert_eq!(
            core.trace(),
            "TRACE: 03 | 01 00 00 | 08 00 00 00 00 00 00 00 | HLT"
        );
    }

    #[test]
    fn trace_line_without_mnemonic_for_unbound_byte() {
        let core = core_with(&[0xFF, 1, 2]);
        assert_eq!(
            core.trace(),
            "TRACE: 00 | FF 01 02 | 00 00 00 00 00 00 00 00"
        );
    }

    #[test]
    fn print_writes_decimal_lines_in_order() {
        let mut core = core_with(&[LDI, 3, 255, PRN, 3, LDI, 3, 0, PRN, 3, HLT]);
        core.run().unwrap();
        assert_eq!(printed(&core), "255\n0\n");
    }
}
