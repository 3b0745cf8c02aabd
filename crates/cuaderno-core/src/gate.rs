//! Static shared-secret gate checked before any data is loaded.

use crate::error::{CuadernoError, Result};

#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    code: Option<String>,
}

impl AccessGate {
    /// A gate requiring `code`; `None` or a blank code leaves it open.
    pub fn new(code: Option<String>) -> Self {
        Self {
            code: code.filter(|c| !c.is_empty()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.code.is_none()
    }

    pub fn check(&self, input: &str) -> Result<()> {
        match &self.code {
            None => Ok(()),
            Some(code) if same_bytes(code.as_bytes(), input.as_bytes()) => Ok(()),
            Some(_) => Err(CuadernoError::AccessDenied),
        }
    }
}

/// Equality without an early exit on the first differing byte.
fn same_bytes(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
