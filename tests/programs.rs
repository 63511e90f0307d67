use std::path::PathBuf;

use ls8::loader;
use ls8::vm::{Error, Machine};

fn program(name: &str) -> PathBuf {
  [env!("CARGO_MANIFEST_DIR"), loader::PROGRAMS_DIR, name]
    .iter()
    .collect()
}

fn run(name: &str, machine: &mut Machine) -> String {
  let chunk = loader::load_file(program(name)).unwrap();
  machine.load(&chunk).unwrap();
  let mut out = Vec::new();
  // every sample program that halts does so well within this many steps
  machine.run_bounded(&mut out, 10_000).unwrap();
  String::from_utf8(out).unwrap()
}

#[test]
fn print8() {
  let mut machine = Machine::new();
  assert_eq!(run("print8.ls8", &mut machine), "8\n");
  assert!(machine.is_halted());
  assert_eq!(machine.pc(), 5);
}

#[test]
fn mult() {
  assert_eq!(run("mult.ls8", &mut Machine::new()), "72\n");
}

#[test]
fn stack() {
  let mut machine = Machine::new();
  assert_eq!(run("stack.ls8", &mut machine), "2\n4\n1\n");
  assert_eq!(machine.sp(), 0);
  assert_eq!(machine.registers(), &[4, 1, 4, 0, 0, 0, 0, 0]);
  // popped values stay behind at the top of memory
  assert_eq!(&machine.memory()[0xFE..], &[4, 1]);
}

#[test]
fn stack_with_conventional_base() {
  let mut machine = Machine::with_stack_pointer(0xF4);
  assert_eq!(run("stack.ls8", &mut machine), "2\n4\n1\n");
  assert_eq!(machine.sp(), 0xF4);
}

#[test]
fn call() {
  let mut machine = Machine::new();
  assert_eq!(run("call.ls8", &mut machine), "20\n30\n36\n60\n");
  assert_eq!(machine.sp(), 0);
  assert_eq!(machine.pc(), 23);
}

#[test]
fn branch() {
  let mut machine = Machine::new();
  assert_eq!(run("branch.ls8", &mut machine), "1\n2\n");
  assert_eq!(machine.pc(), 40);
  assert!(!machine.flags().equal());
  assert!(machine.flags().less());
}

#[test]
fn forever() {
  let chunk = loader::load_file(program("forever.ls8")).unwrap();
  let mut machine = Machine::new();
  machine.load(&chunk).unwrap();
  let err = machine.run_bounded(&mut Vec::new(), 5_000).unwrap_err();
  assert!(matches!(err, Error::StepLimit(5_000)));
  assert!(!machine.is_halted());
}

#[test]
fn resolve_by_name() {
  let path = loader::resolve(program("mult.ls8")).unwrap();
  assert_eq!(path, program("mult.ls8"));
}
