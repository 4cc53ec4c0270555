use std::{borrow::Cow, fmt};

use log::warn;
use thiserror::Error;

pub const ID_SIZE: usize = std::mem::size_of::<u32>();
pub const USERNAME_SIZE: usize = 32;
pub const EMAIL_SIZE: usize = 255;
pub const ROW_SIZE: usize = std::mem::size_of::<Row>();

/// A fixed-layout record. Both text fields live in zero-padded byte buffers,
/// so every row has the same size.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

/// NUL terminates a stored field, so a value containing one could not be
/// read back as written.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field} contains a NUL byte")]
pub struct EmbeddedNul {
    pub field: &'static str,
}

impl Row {
    /// Builds a row, truncating text that does not fit its buffer.
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, EmbeddedNul> {
        Ok(Row {
            id,
            username: fill("username", username)?,
            email: fill("email", email)?,
        })
    }

    pub fn username(&self) -> Cow<'_, str> {
        text(&self.username)
    }

    pub fn email(&self) -> Cow<'_, str> {
        text(&self.email)
    }
}

impl Default for Row {
    fn default() -> Self {
        Row {
            id: 0,
            username: [0; USERNAME_SIZE],
            email: [0; EMAIL_SIZE],
        }
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("username", &self.username())
            .field("email", &self.email())
            .finish()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

fn fill<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N], EmbeddedNul> {
    if value.contains('\0') {
        return Err(EmbeddedNul { field });
    }
    let mut end = value.len().min(N);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    if end < value.len() {
        warn!("truncating {} from {} to {} bytes", field, value.len(), end);
    }
    let mut buffer = [0; N];
    buffer[..end].copy_from_slice(&value.as_bytes()[..end]);
    Ok(buffer)
}

// the buffer is zero padded, anything after the first nul is unused
fn text(buffer: &[u8]) -> Cow<'_, str> {
    let end = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end])
}
