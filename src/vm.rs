use std::fmt;
use std::io::{self, Write};

use crate::alu::{self, AluOp, Flags, Outcome};
use crate::opcode::Opcode;
use crate::region::Region;

/// Number of addressable bytes of memory
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Register holding the stack pointer
pub const SP: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
  Running,
  Halted,
}

/// An LS-8 machine: 256 bytes of memory shared by program and stack, eight
/// 8-bit registers with `r7` as the stack pointer, a program counter and the
/// compare flags.
///
/// Addresses and register values are all `u8`, so arithmetic on them wraps
/// instead of leaving the address space. The stack grows down from the
/// initial stack pointer, which is `0` unless chosen with
/// [`Machine::with_stack_pointer`]; the first push from `0` lands on `0xFF`.
/// Nothing keeps the stack from running into the program.
#[derive(Debug, Clone)]
pub struct Machine {
  pc: u8,
  memory: [u8; MEMORY_SIZE],
  registers: [u8; REGISTER_COUNT],
  flags: Flags,
  state: State,
  initial_sp: u8,
}

impl Machine {
  /// Create a new, zeroed machine
  pub fn new() -> Self {
    Self::with_stack_pointer(0)
  }

  /// Create a zeroed machine whose stack starts below `sp`
  pub fn with_stack_pointer(sp: u8) -> Self {
    let mut registers = [0; REGISTER_COUNT];
    registers[SP] = sp;
    Self {
      pc: 0,
      memory: [0; MEMORY_SIZE],
      registers,
      flags: Flags::default(),
      state: State::Running,
      initial_sp: sp,
    }
  }

  /// Put the machine back in the state it was created in
  pub fn reset(&mut self) {
    *self = Self::with_stack_pointer(self.initial_sp);
  }

  /// Copy a program into memory starting at address 0.
  ///
  /// Memory past the end of the program is left alone.
  pub fn load<R>(&mut self, region: &R) -> Result<(), Error>
  where
    R: Region + ?Sized,
  {
    let bytes = region.bytes();
    if bytes.len() > MEMORY_SIZE {
      return Err(Error::ProgramTooLarge { len: bytes.len() });
    }
    self.memory[..bytes.len()].copy_from_slice(bytes);
    log::info!("loaded {} byte program", bytes.len());
    Ok(())
  }

  /// Execute the instruction at the program counter, writing anything it
  /// prints to `out`
  pub fn step<W>(&mut self, out: &mut W) -> Result<(), Error>
  where
    W: Write + ?Sized,
  {
    if self.is_halted() {
      return Err(Error::MachineHalted);
    }
    log::trace!(target: "ls8::trace", "{}", self.trace());
    let mut task = Task::new(self, out);
    task.run()
  }

  /// Step until the machine halts. A program without `HLT` never returns.
  pub fn run<W>(&mut self, out: &mut W) -> Result<(), Error>
  where
    W: Write + ?Sized,
  {
    while !self.is_halted() {
      self.step(out)?;
    }
    Ok(())
  }

  /// Step until the machine halts or `limit` instructions have executed,
  /// returning how many ran
  pub fn run_bounded<W>(&mut self, out: &mut W, limit: usize) -> Result<usize, Error>
  where
    W: Write + ?Sized,
  {
    let mut steps = 0;
    while !self.is_halted() {
      if steps == limit {
        return Err(Error::StepLimit(limit));
      }
      self.step(out)?;
      steps += 1;
    }
    Ok(steps)
  }

  /// Apply an ALU operation to registers `a` and `b`.
  ///
  /// Arithmetic stores its result in `a`; compare only touches the flags.
  pub fn alu(&mut self, op: AluOp, a: u8, b: u8) -> Result<(), Error> {
    let (a, b) = (register_index(a), register_index(b));
    match alu::apply(op, self.registers[a], self.registers[b])? {
      Outcome::Value(value) => self.registers[a] = value,
      Outcome::Flags(flags) => self.flags = flags,
    }
    Ok(())
  }

  pub fn ram_read(&self, address: u8) -> u8 {
    self.memory[address as usize]
  }

  pub fn ram_write(&mut self, address: u8, value: u8) {
    self.memory[address as usize] = value;
  }

  pub fn pc(&self) -> u8 {
    self.pc
  }

  pub fn sp(&self) -> u8 {
    self.registers[SP]
  }

  pub fn flags(&self) -> Flags {
    self.flags
  }

  /// Value of register `index`, taken modulo the register count
  pub fn register(&self, index: u8) -> u8 {
    self.registers[register_index(index)]
  }

  pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
    &self.registers
  }

  pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
    &self.memory
  }

  pub fn is_halted(&self) -> bool {
    self.state == State::Halted
  }

  /// A one line dump of the program counter, the three bytes at it and all
  /// registers
  pub fn trace(&self) -> Trace<'_> {
    Trace { vm: self }
  }

  fn push(&mut self, value: u8) {
    let sp = self.sp().wrapping_sub(1);
    self.registers[SP] = sp;
    self.ram_write(sp, value);
  }

  fn pop(&mut self) -> u8 {
    let sp = self.sp();
    let value = self.ram_read(sp);
    self.registers[SP] = sp.wrapping_add(1);
    value
  }
}

impl Default for Machine {
  fn default() -> Self {
    Self::new()
  }
}

// register operands only use their low three bits
fn register_index(operand: u8) -> usize {
  operand as usize % REGISTER_COUNT
}

/// Per-step machine state in the layout
/// `TRACE: PC | M[PC] M[PC+1] M[PC+2] | R0 R1 R2 R3 R4 R5 R6 R7`
pub struct Trace<'vm> {
  vm: &'vm Machine,
}

impl fmt::Display for Trace<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let pc = self.vm.pc;
    write!(
      f,
      "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
      pc,
      self.vm.ram_read(pc),
      self.vm.ram_read(pc.wrapping_add(1)),
      self.vm.ram_read(pc.wrapping_add(2)),
    )?;
    for register in self.vm.registers {
      write!(f, " {:02X}", register)?;
    }
    Ok(())
  }
}

/// An error that occurred while loading or executing a program
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("machine is halted")]
  MachineHalted,

  #[error("unsupported ALU operation `{0}`")]
  UnsupportedOperation(String),

  #[error("division by zero")]
  DivideByZero,

  #[error("program of {len} bytes does not fit in 256 bytes of memory")]
  ProgramTooLarge { len: usize },

  #[error("program did not halt within {0} steps")]
  StepLimit(usize),

  #[error("failed to write output")]
  Output(#[from] io::Error),
}

struct Task<'vm, 'out, W: ?Sized> {
  vm: &'vm mut Machine,
  out: &'out mut W,
  // address of the instruction being executed
  pc: u8,
}

impl<'vm, 'out, W> Task<'vm, 'out, W>
where
  W: Write + ?Sized,
{
  fn new(vm: &'vm mut Machine, out: &'out mut W) -> Self {
    let pc = vm.pc;
    Self { vm, out, pc }
  }

  /// The `n`th byte after the opcode
  #[inline]
  fn operand(&self, n: u8) -> u8 {
    self.vm.ram_read(self.pc.wrapping_add(n))
  }

  /// Register index named by the `n`th operand
  #[inline]
  fn register(&self, n: u8) -> usize {
    register_index(self.operand(n))
  }

  fn advance(&mut self, op: Opcode) {
    self.vm.pc = self.pc.wrapping_add(op.size());
  }

  fn jump(&mut self, target: u8) {
    self.vm.pc = target;
  }

  fn run(&mut self) -> Result<(), Error> {
    let byte = self.vm.ram_read(self.pc);
    let Some(op) = Opcode::decode(byte) else {
      log::debug!("skipping unknown opcode {:#010b} at {:#04x}", byte, self.pc);
      self.vm.pc = self.pc.wrapping_add(1);
      return Ok(());
    };
    match op {
      Opcode::LoadImmediate => load_immediate(self),
      Opcode::Print => print(self)?,
      Opcode::Halt => halt(self),
      Opcode::Add => arithmetic(self, op, AluOp::Add)?,
      Opcode::Multiply => arithmetic(self, op, AluOp::Multiply)?,
      Opcode::Compare => arithmetic(self, op, AluOp::Compare)?,
      Opcode::Push => push(self),
      Opcode::Pop => pop(self),
      Opcode::Call => call(self),
      Opcode::Return => ret(self),
      Opcode::Jump => jump(self),
      Opcode::JumpIfEqual => jump_if(self, op, true),
      Opcode::JumpIfNotEqual => jump_if(self, op, false),
    }
    Ok(())
  }
}

// r[a] ← vv
fn load_immediate<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  let a = task.register(1);
  task.vm.registers[a] = task.operand(2);
  task.advance(Opcode::LoadImmediate);
}

// out ← r[a]
fn print<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: Write + ?Sized,
{
  let value = task.vm.registers[task.register(1)];
  writeln!(task.out, "{}", value)?;
  task.advance(Opcode::Print);
  Ok(())
}

// (stop execution)
fn halt<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  log::debug!("halted at {:#04x}", task.pc);
  task.vm.state = State::Halted;
}

// r[a] ← r[a] op r[b], or fl ← r[a] <=> r[b]
fn arithmetic<W>(task: &mut Task<'_, '_, W>, opcode: Opcode, op: AluOp) -> Result<(), Error>
where
  W: Write + ?Sized,
{
  let (a, b) = (task.operand(1), task.operand(2));
  task.vm.alu(op, a, b)?;
  task.advance(opcode);
  Ok(())
}

// r[7] ← r[7] − 1; m[r[7]] ← r[a]
fn push<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  let value = task.vm.registers[task.register(1)];
  task.vm.push(value);
  task.advance(Opcode::Push);
}

// r[a] ← m[r[7]]; r[7] ← r[7] + 1
// popping into r7 leaves the popped value in the stack pointer
fn pop<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  let a = task.register(1);
  let value = task.vm.pop();
  task.vm.registers[a] = value;
  task.advance(Opcode::Pop);
}

// r[7] ← r[7] − 1; m[r[7]] ← pc + 2; pc ← r[a]
fn call<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  // the target is read before the push so `CALL r7` jumps to the old SP
  let target = task.vm.registers[task.register(1)];
  let resume = task.pc.wrapping_add(Opcode::Call.size());
  task.vm.push(resume);
  task.jump(target);
}

// pc ← m[r[7]]; r[7] ← r[7] + 1
fn ret<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  let target = task.vm.pop();
  task.jump(target);
}

// pc ← r[a]
fn jump<W>(task: &mut Task<'_, '_, W>)
where
  W: Write + ?Sized,
{
  let target = task.vm.registers[task.register(1)];
  task.jump(target);
}

// if E == equal : pc ← r[a]
fn jump_if<W>(task: &mut Task<'_, '_, W>, op: Opcode, equal: bool)
where
  W: Write + ?Sized,
{
  if task.vm.flags.equal() == equal {
    let target = task.vm.registers[task.register(1)];
    task.jump(target);
  } else {
    task.advance(op);
  }
}
