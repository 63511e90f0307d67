use std::fmt;

/// Every instruction the machine understands, keyed by its byte in memory.
///
/// The byte values are the program file format, so they must never change.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// Stops the fetch-decode-execute loop.
  ///
  /// | Operation | Semantics/RTL      | Assembly |
  /// |-----------|--------------------|----------|
  /// | Halt      | `(stop execution)` | `HLT`    |
  Halt = 0b0000_0001,

  /// Returns from a subroutine.
  ///
  /// | Operation | Semantics/RTL                   | Assembly |
  /// |-----------|---------------------------------|----------|
  /// | Return    | `pc ← m[r[7]]; r[7] ← r[7] + 1` | `RET`    |
  Return = 0b0001_0001,

  /// Pushes a register onto the stack.
  ///
  /// | Operation | Semantics/RTL                     | Assembly  |
  /// |-----------|-----------------------------------|-----------|
  /// | Push      | `r[7] ← r[7] − 1; m[r[7]] ← r[a]` | `PUSH ra` |
  Push = 0b0100_0101,

  /// Pops the top of the stack into a register.
  ///
  /// | Operation | Semantics/RTL                     | Assembly |
  /// |-----------|-----------------------------------|----------|
  /// | Pop       | `r[a] ← m[r[7]]; r[7] ← r[7] + 1` | `POP ra` |
  Pop = 0b0100_0110,

  /// Prints the decimal value of a register on its own line.
  ///
  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Print     | `out ← r[a]`  | `PRN ra` |
  Print = 0b0100_0111,

  /// Calls the subroutine whose address is held in a register.
  ///
  /// | Operation | Semantics/RTL                                  | Assembly  |
  /// |-----------|------------------------------------------------|-----------|
  /// | Call      | `r[7] ← r[7] − 1; m[r[7]] ← pc + 2; pc ← r[a]` | `CALL ra` |
  Call = 0b0101_0000,

  /// Jumps to the address held in a register.
  ///
  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Jump      | `pc ← r[a]`   | `JMP ra` |
  Jump = 0b0101_0100,

  /// Jumps if the last comparison found its operands equal.
  ///
  /// | Operation     | Semantics/RTL                         | Assembly |
  /// |---------------|---------------------------------------|----------|
  /// | Jump If Equal | `if E : pc ← r[a]` else `pc ← pc + 2` | `JEQ ra` |
  JumpIfEqual = 0b0101_0101,

  /// Jumps if the last comparison found its operands different.
  ///
  /// | Operation         | Semantics/RTL                          | Assembly |
  /// |-------------------|----------------------------------------|----------|
  /// | Jump If Not Equal | `if !E : pc ← r[a]` else `pc ← pc + 2` | `JNE ra` |
  JumpIfNotEqual = 0b0101_0110,

  /// Loads an immediate value into a register.
  ///
  /// | Operation      | Semantics/RTL | Assembly     |
  /// |----------------|---------------|--------------|
  /// | Load Immediate | `r[a] ← vv`   | `LDI ra, vv` |
  LoadImmediate = 0b1000_0010,

  /// Adds two registers.
  ///
  /// | Operation | Semantics/RTL        | Assembly     |
  /// |-----------|----------------------|--------------|
  /// | Add       | `r[a] ← r[a] + r[b]` | `ADD ra, rb` |
  Add = 0b1010_0000,

  /// Multiplies two registers.
  ///
  /// | Operation | Semantics/RTL        | Assembly     |
  /// |-----------|----------------------|--------------|
  /// | Multiply  | `r[a] ← r[a] × r[b]` | `MUL ra, rb` |
  Multiply = 0b1010_0010,

  /// Compares two registers and records the outcome in the flags.
  ///
  /// | Operation | Semantics/RTL          | Assembly     |
  /// |-----------|------------------------|--------------|
  /// | Compare   | `fl ← (r[a] <=> r[b])` | `CMP ra, rb` |
  Compare = 0b1010_0111,
}

impl Opcode {
  /// Decodes an instruction byte, yielding `None` for bytes that are not
  /// instructions.
  pub fn decode(byte: u8) -> Option<Self> {
    let op = match byte {
      0b0000_0001 => Self::Halt,
      0b0001_0001 => Self::Return,
      0b0100_0101 => Self::Push,
      0b0100_0110 => Self::Pop,
      0b0100_0111 => Self::Print,
      0b0101_0000 => Self::Call,
      0b0101_0100 => Self::Jump,
      0b0101_0101 => Self::JumpIfEqual,
      0b0101_0110 => Self::JumpIfNotEqual,
      0b1000_0010 => Self::LoadImmediate,
      0b1010_0000 => Self::Add,
      0b1010_0010 => Self::Multiply,
      0b1010_0111 => Self::Compare,
      _ => return None,
    };
    Some(op)
  }

  /// Number of operand bytes following the opcode byte.
  pub fn operands(self) -> u8 {
    match self {
      Self::Halt | Self::Return => 0,
      Self::Push
      | Self::Pop
      | Self::Print
      | Self::Call
      | Self::Jump
      | Self::JumpIfEqual
      | Self::JumpIfNotEqual => 1,
      Self::LoadImmediate | Self::Add | Self::Multiply | Self::Compare => 2,
    }
  }

  /// Total size of the instruction in memory, opcode included.
  pub fn size(self) -> u8 {
    self.operands() + 1
  }

  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Halt => "HLT",
      Self::Return => "RET",
      Self::Push => "PUSH",
      Self::Pop => "POP",
      Self::Print => "PRN",
      Self::Call => "CALL",
      Self::Jump => "JMP",
      Self::JumpIfEqual => "JEQ",
      Self::JumpIfNotEqual => "JNE",
      Self::LoadImmediate => "LDI",
      Self::Add => "ADD",
      Self::Multiply => "MUL",
      Self::Compare => "CMP",
    }
  }
}

impl From<Opcode> for u8 {
  fn from(op: Opcode) -> Self {
    op as u8
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}
