use core::fmt::{self, Write};

use heapless::{String, Vec};

use super::{MAX_MESSAGES_PER_MAPPING, MAX_TEXT_LEN};

/// Text value type (rig names, amp names, ...).
pub type TextValue = String<MAX_TEXT_LEN>;

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterValue {
    /// Numeric parameter (14-bit NRPN values, CC values, ...).
    Number(i32),
    /// Text parameter, truncated to [`MAX_TEXT_LEN`] bytes.
    Text(TextValue),
    /// One value per message of a multi-message set template.
    Numbers(Vec<i32, MAX_MESSAGES_PER_MAPPING>),
}

impl ParameterValue {
    /// Build a text value, truncating on a character boundary if needed.
    pub fn text(s: &str) -> Self {
        let mut out = TextValue::new();
        for c in s.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        ParameterValue::Text(out)
    }

    /// Build a list value. Extra entries beyond the capacity are dropped.
    pub fn numbers(values: &[i32]) -> Self {
        ParameterValue::Numbers(
            values
                .iter()
                .copied()
                .take(MAX_MESSAGES_PER_MAPPING)
                .collect(),
        )
    }

    pub fn as_number(&self) -> Option<i32> {
        match self {
            ParameterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// The value for the `index`-th message of a set template.
    ///
    /// Scalars apply to every message.
    pub fn number_at(&self, index: usize) -> Option<i32> {
        match self {
            ParameterValue::Number(n) => Some(*n),
            ParameterValue::Numbers(list) => list.get(index).copied(),
            ParameterValue::Text(_) => None,
        }
    }

    /// Render the value for a display label.
    pub fn to_text(&self) -> TextValue {
        let mut out = TextValue::new();
        // Overflow only truncates the label.
        let _ = write!(out, "{}", self);
        out
    }
}

impl From<i32> for ParameterValue {
    fn from(n: i32) -> Self {
        ParameterValue::Number(n)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(n) => write!(f, "{}", n),
            ParameterValue::Text(t) => f.write_str(t),
            ParameterValue::Numbers(list) => {
                for (i, n) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", n)?;
                }
                Ok(())
            }
        }
    }
}
