//! Command template parsing and rendering.
//!
//! Toolchain commands are configured as shell command templates. Values known
//! only when a stage runs are referenced with placeholders.
//!
//! # Placeholder Format
//!
//! - `$${name}` - substituted with the stage variable `name`
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$CC` work without escaping. Use `$$$` before `{` to produce a literal
//! `$${` sequence.
//!
//! # Example
//!
//! ```
//! use grist_lib::toolchain::template::{Vars, render};
//!
//! let vars = Vars::new().set("out", "lib.a").list("objects", ["a.o", "b.o"]);
//! let cmd = render("ar rcs $${out} $${objects}", &vars).unwrap();
//! assert_eq!(cmd, "ar rcs lib.a a.o b.o");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

/// A segment of parsed template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be substituted
  Var(String),
}

/// Errors that can occur during template parsing or rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unknown placeholder: {0}")]
  Unknown(String),
}

/// Parse a template into literal and placeholder segments.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();

        match chars.peek() {
          Some((_, '$')) => {
            chars.next();
            if let Some((_, '{')) = chars.peek() {
              // $$${ -> literal $${
              literal.push_str("$${");
              chars.next();
            } else {
              literal.push_str("$$$");
            }
          }
          Some((_, '{')) => {
            chars.next();

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut name = String::new();
            let mut found_close = false;
            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              name.push(c);
            }

            if !found_close {
              return Err(TemplateError::Unclosed(pos));
            }

            segments.push(Segment::Var(validate_name(name)?));
          }
          _ => literal.push_str("$$"),
        }
      }
      // Lone $, shell variables pass through
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

fn validate_name(name: String) -> Result<String, TemplateError> {
  if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
    return Err(TemplateError::Malformed(name));
  }
  Ok(name)
}

/// Stage variables available to a template. Values are stored shell-ready.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Vars(BTreeMap<&'static str, String>);

impl Vars {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a single value, quoting it for the shell if needed.
  pub fn set(mut self, name: &'static str, value: impl AsRef<str>) -> Self {
    self.0.insert(name, quote(value.as_ref()));
    self
  }

  /// Set a value that is already shell-ready.
  pub fn raw(mut self, name: &'static str, value: impl Into<String>) -> Self {
    self.0.insert(name, value.into());
    self
  }

  pub fn path(self, name: &'static str, path: &Path) -> Self {
    let value = path.to_string_lossy().to_string();
    self.set(name, value)
  }

  /// Set a list, quoting each item and joining with spaces.
  pub fn list<I, S>(mut self, name: &'static str, items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let joined = items
      .into_iter()
      .map(|item| quote(item.as_ref()))
      .collect::<Vec<_>>()
      .join(" ");
    self.0.insert(name, joined);
    self
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str)
  }
}

/// Render `template`, substituting every placeholder from `vars`.
pub fn render(template: &str, vars: &Vars) -> Result<String, TemplateError> {
  let mut out = String::with_capacity(template.len());
  for segment in parse(template)? {
    match segment {
      Segment::Literal(text) => out.push_str(&text),
      Segment::Var(name) => {
        let value = vars.get(&name).ok_or_else(|| TemplateError::Unknown(name.clone()))?;
        out.push_str(value);
      }
    }
  }
  Ok(out)
}

/// Quote `value` for `/bin/sh` unless it only contains safe characters.
pub fn quote(value: &str) -> String {
  let safe = !value.is_empty()
    && value
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | '+' | ':' | '=' | ','));
  if safe {
    value.to_string()
  } else {
    format!("'{}'", value.replace('\'', "'\\''"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_literal_only() {
    assert_eq!(
      parse("cc -c main.c").unwrap(),
      vec![Segment::Literal("cc -c main.c".to_string())]
    );
  }

  #[test]
  fn parse_placeholders_between_literals() {
    assert_eq!(
      parse("cc -o $${out} $${files}").unwrap(),
      vec![
        Segment::Literal("cc -o ".to_string()),
        Segment::Var("out".to_string()),
        Segment::Literal(" ".to_string()),
        Segment::Var("files".to_string()),
      ]
    );
  }

  #[test]
  fn shell_variables_pass_through() {
    let rendered = render("$CC $$HOME $${out}", &Vars::new().set("out", "a.o")).unwrap();
    assert_eq!(rendered, "$CC $$HOME a.o");
  }

  #[test]
  fn escaped_placeholder_is_literal() {
    let rendered = render("echo $$${out}", &Vars::new()).unwrap();
    assert_eq!(rendered, "echo $${out}");
  }

  #[test]
  fn unclosed_placeholder_errors() {
    assert_eq!(parse("cc $${out").unwrap_err(), TemplateError::Unclosed(3));
  }

  #[test]
  fn malformed_placeholder_errors() {
    assert_eq!(
      parse("cc $${out dir}").unwrap_err(),
      TemplateError::Malformed("out dir".to_string())
    );
    assert_eq!(parse("$${}").unwrap_err(), TemplateError::Malformed(String::new()));
  }

  #[test]
  fn unknown_placeholder_errors_on_render() {
    assert_eq!(
      render("cc $${nope}", &Vars::new()).unwrap_err(),
      TemplateError::Unknown("nope".to_string())
    );
  }

  #[test]
  fn values_are_quoted_when_needed() {
    let vars = Vars::new()
      .path("out", Path::new("/tmp/my dir/a.o"))
      .list("files", ["a.c", "it's.c"]);
    assert_eq!(vars.get("out"), Some("'/tmp/my dir/a.o'"));
    assert_eq!(vars.get("files"), Some("a.c 'it'\\''s.c'"));
  }

  #[test]
  fn raw_values_are_not_quoted() {
    let vars = Vars::new().raw("includes", "-I /a -I /b");
    assert_eq!(render("$${includes}", &vars).unwrap(), "-I /a -I /b");
  }

  #[test]
  fn empty_value_renders_as_empty_quotes() {
    assert_eq!(quote(""), "''");
  }
}
