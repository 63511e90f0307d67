use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::vm::Error;

/// Operations the arithmetic/logic unit can carry out on two registers.
///
/// Only `Add`, `Multiply` and `Compare` are reachable from an instruction,
/// `Subtract` and `Divide` can only be driven through [`Machine::alu`].
///
/// [`Machine::alu`]: crate::vm::Machine::alu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
  Add,
  Subtract,
  Multiply,
  Divide,
  Compare,
}

impl AluOp {
  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Add => "ADD",
      Self::Subtract => "SUB",
      Self::Multiply => "MUL",
      Self::Divide => "DIV",
      Self::Compare => "CMP",
    }
  }
}

impl FromStr for AluOp {
  type Err = Error;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    match name {
      "ADD" => Ok(Self::Add),
      "SUB" => Ok(Self::Subtract),
      "MUL" => Ok(Self::Multiply),
      "DIV" => Ok(Self::Divide),
      "CMP" => Ok(Self::Compare),
      _ => Err(Error::UnsupportedOperation(name.to_owned())),
    }
  }
}

impl fmt::Display for AluOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

/// Outcome of the most recent compare, `00000LGE`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
  pub const EQUAL: u8 = 0b0000_0001;
  pub const GREATER: u8 = 0b0000_0010;
  pub const LESS: u8 = 0b0000_0100;

  /// Flags with exactly one bit describing `a` relative to `b`.
  pub fn compare(a: u8, b: u8) -> Self {
    match a.cmp(&b) {
      Ordering::Less => Self(Self::LESS),
      Ordering::Greater => Self(Self::GREATER),
      Ordering::Equal => Self(Self::EQUAL),
    }
  }

  pub fn bits(self) -> u8 {
    self.0
  }

  pub fn equal(self) -> bool {
    self.0 & Self::EQUAL != 0
  }

  pub fn greater(self) -> bool {
    self.0 & Self::GREATER != 0
  }

  pub fn less(self) -> bool {
    self.0 & Self::LESS != 0
  }
}

/// What an ALU operation produces: a value for the first register, or new
/// flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
  Value(u8),
  Flags(Flags),
}

/// Applies `op` to the register values `a` and `b`.
///
/// Values stay in the 8-bit domain, so arithmetic wraps.
pub(crate) fn apply(op: AluOp, a: u8, b: u8) -> Result<Outcome, Error> {
  let value = match op {
    AluOp::Add => a.wrapping_add(b),
    AluOp::Subtract => a.wrapping_sub(b),
    AluOp::Multiply => a.wrapping_mul(b),
    AluOp::Divide => a.checked_div(b).ok_or(Error::DivideByZero)?,
    AluOp::Compare => return Ok(Outcome::Flags(Flags::compare(a, b))),
  };
  Ok(Outcome::Value(value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_supported() {
    assert_eq!("ADD".parse::<AluOp>().unwrap(), AluOp::Add);
    assert_eq!("SUB".parse::<AluOp>().unwrap(), AluOp::Subtract);
    assert_eq!("MUL".parse::<AluOp>().unwrap(), AluOp::Multiply);
    assert_eq!("DIV".parse::<AluOp>().unwrap(), AluOp::Divide);
    assert_eq!("CMP".parse::<AluOp>().unwrap(), AluOp::Compare);
  }

  #[test]
  fn parse_unsupported() {
    let err = "XOR".parse::<AluOp>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(ref name) if name == "XOR"));
    assert_eq!(err.to_string(), "unsupported ALU operation `XOR`");
    // mnemonics are case sensitive
    assert!("add".parse::<AluOp>().is_err());
  }

  #[test]
  fn compare_sets_one_bit() {
    for (a, b) in [(0, 0), (1, 2), (2, 1), (255, 0), (0, 255), (7, 7)] {
      let flags = Flags::compare(a, b);
      assert_eq!(flags.bits().count_ones(), 1);
      assert_eq!(flags.equal(), a == b);
      assert_eq!(flags.greater(), a > b);
      assert_eq!(flags.less(), a < b);
    }
  }

  #[test]
  fn flag_bits() {
    assert_eq!(Flags::compare(3, 3).bits(), 0b001);
    assert_eq!(Flags::compare(4, 3).bits(), 0b010);
    assert_eq!(Flags::compare(3, 4).bits(), 0b100);
    assert_eq!(Flags::default().bits(), 0);
  }

  fn value(op: AluOp, a: u8, b: u8) -> u8 {
    match apply(op, a, b).unwrap() {
      Outcome::Value(value) => value,
      Outcome::Flags(flags) => panic!("{op} produced flags {flags:?}"),
    }
  }

  #[test]
  fn display_mnemonic() {
    for name in ["ADD", "SUB", "MUL", "DIV", "CMP"] {
      assert_eq!(name.parse::<AluOp>().unwrap().to_string(), name);
    }
  }

  #[test]
  fn arithmetic_wraps() {
    assert_eq!(value(AluOp::Add, 250, 10), 4);
    assert_eq!(value(AluOp::Subtract, 3, 5), 254);
    assert_eq!(value(AluOp::Multiply, 16, 17), 16);
    assert_eq!(value(AluOp::Divide, 17, 5), 3);
  }

  #[test]
  fn divide_by_zero() {
    assert!(matches!(apply(AluOp::Divide, 17, 0), Err(Error::DivideByZero)));
  }

  #[test]
  fn compare_produces_flags() {
    assert_eq!(
      apply(AluOp::Compare, 1, 2).unwrap(),
      Outcome::Flags(Flags::compare(1, 2))
    );
  }

  #[test]
  fn add_and_multiply_commute() {
    for a in (0..=u8::MAX).step_by(7) {
      for b in (0..=u8::MAX).step_by(11) {
        assert_eq!(value(AluOp::Add, a, b), value(AluOp::Add, b, a));
        assert_eq!(value(AluOp::Multiply, a, b), value(AluOp::Multiply, b, a));
        assert_eq!(value(AluOp::Add, a, b), ((a as u16 + b as u16) % 256) as u8);
        assert_eq!(
          value(AluOp::Multiply, a, b),
          ((a as u16 * b as u16) % 256) as u8
        );
      }
    }
  }
}
