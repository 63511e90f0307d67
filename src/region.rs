/// A region of program bytes, copied verbatim into memory from address 0
pub trait Region {
  fn bytes(&self) -> &[u8];
}

/// A `Chunk` is a single program image that our machine may load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
  bytes: Vec<u8>,
}

impl Chunk {
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

impl From<Vec<u8>> for Chunk {
  fn from(bytes: Vec<u8>) -> Self {
    Self { bytes }
  }
}

impl FromIterator<u8> for Chunk {
  fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
    Self {
      bytes: iter.into_iter().collect(),
    }
  }
}

impl Region for Chunk {
  fn bytes(&self) -> &[u8] {
    &self.bytes
  }
}

impl Region for [u8] {
  fn bytes(&self) -> &[u8] {
    self
  }
}

impl Region for Vec<u8> {
  fn bytes(&self) -> &[u8] {
    self
  }
}
