use std::fmt;

/// Ordered `key=value` tokens handed to the build-file generator as
/// `GYP_DEFINES`.
///
/// Setting a key that is already present replaces its value in place, so a
/// key never occurs twice in the rendered string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defines {
  entries: Vec<(String, Option<String>)>,
}

impl Defines {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a space-separated define string. Tokens without `=` are kept as
  /// bare flags.
  pub fn parse(s: &str) -> Self {
    let mut defines = Self::new();
    for token in s.split_whitespace() {
      match token.split_once('=') {
        Some((key, value)) => defines.set(key, value),
        None => defines.set_flag(token),
      }
    }
    defines
  }

  pub fn set(&mut self, key: &str, value: impl Into<String>) {
    self.insert(key, Some(value.into()));
  }

  pub fn set_bool(&mut self, key: &str, value: bool) {
    self.set(key, if value { "1" } else { "0" });
  }

  fn set_flag(&mut self, key: &str) {
    self.insert(key, None);
  }

  fn insert(&mut self, key: &str, value: Option<String>) {
    match self.entries.iter_mut().find(|(k, _)| k == key) {
      Some(entry) => entry.1 = value,
      None => self.entries.push((key.to_string(), value)),
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(k, _)| k == key)
      .and_then(|(_, v)| v.as_deref())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn render(&self) -> String {
    self
      .entries
      .iter()
      .map(|(key, value)| match value {
        Some(value) => format!("{}={}", key, value),
        None => key.clone(),
      })
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl fmt::Display for Defines {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}
