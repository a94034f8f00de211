//! Self-wiping holders for sensitive buffers.
//!
//! [`SensitiveValue`] owns one buffer and overwrites it with zeros exactly
//! once, either through [`SensitiveValue::dispose`] or when it is dropped.
//! The zeroing strategy is picked per element type through the [`Wipe`]
//! trait, so bytes and UTF-16 code units share one container.

use std::fmt;
use std::io;

use zeroize::{DefaultIsZeroes, Zeroize};

/// A buffer that can overwrite itself with its zero value.
pub trait Wipe {
    /// Overwrite every element with zero.
    fn wipe(&mut self);
}

/// Zeroes the spare capacity too, keeping the length.
impl<Z: DefaultIsZeroes> Wipe for Vec<Z> {
    fn wipe(&mut self) {
        self.as_mut_slice().zeroize();
        self.spare_capacity_mut().zeroize();
    }
}

impl<Z: DefaultIsZeroes> Wipe for Box<[Z]> {
    fn wipe(&mut self) {
        (**self).zeroize();
    }
}

impl<Z: DefaultIsZeroes, const N: usize> Wipe for [Z; N] {
    fn wipe(&mut self) {
        self.as_mut_slice().zeroize();
    }
}

/// Borrowed buffers are wiped in place, so the owner observes the zeros.
impl<Z: DefaultIsZeroes> Wipe for &mut [Z] {
    fn wipe(&mut self) {
        (**self).zeroize();
    }
}

/// Owning wrapper that zeroes its buffer when disposed or dropped.
///
/// The buffer is only reachable inside the closures passed to
/// [`with_value`](Self::with_value) and [`map`](Self::map); no reference to
/// it can outlive the call. Disposal consumes the wrapper, so use after
/// disposal does not compile.
pub struct SensitiveValue<T: Wipe> {
    value: T,
    disposed: bool,
}

/// A byte based secret (e.g. a security token).
pub type ByteSecret = SensitiveValue<Vec<u8>>;

/// A UTF-16 code unit based secret (e.g. a password).
pub type CharSecret = SensitiveValue<Vec<u16>>;

impl<T: Wipe> SensitiveValue<T> {
    /// Take ownership of `value`.
    pub fn wrap(value: T) -> Self {
        Self {
            value,
            disposed: false,
        }
    }

    /// Run `f` with the guarded buffer and return whatever it returns.
    ///
    /// Fallible closures propagate their `Result` unchanged.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value)
    }

    /// Derive a new sensitive value from the guarded buffer.
    pub fn map<U: Wipe>(&self, f: impl FnOnce(&T) -> U) -> SensitiveValue<U> {
        SensitiveValue::wrap(f(&self.value))
    }

    /// Fallible variant of [`map`](Self::map).
    pub fn try_map<U: Wipe, E>(
        &self,
        f: impl FnOnce(&T) -> Result<U, E>,
    ) -> Result<SensitiveValue<U>, E> {
        f(&self.value).map(SensitiveValue::wrap)
    }

    /// Zero the buffer now.
    pub fn dispose(mut self) {
        self.wipe_once();
    }

    fn wipe_once(&mut self) {
        if !self.disposed {
            self.value.wipe();
            self.disposed = true;
        }
    }
}

impl<T: Wipe> Drop for SensitiveValue<T> {
    fn drop(&mut self) {
        self.wipe_once();
    }
}

impl<T: Wipe> fmt::Debug for SensitiveValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SensitiveValue([REDACTED])")
    }
}

impl From<&str> for CharSecret {
    /// Encode `text` as UTF-16 code units.
    fn from(text: &str) -> Self {
        Self::wrap(text.encode_utf16().collect())
    }
}

/// Growable byte sink that never leaves stale copies behind.
///
/// Whenever the buffer has to grow, the old allocation is zeroed before it
/// is released. The contents are zeroed on drop unless handed over via
/// [`into_secret`](Self::into_secret).
#[derive(Default)]
pub struct SafeBuffer {
    buf: Vec<u8>,
}

impl SafeBuffer {
    /// Create an empty buffer able to hold `capacity` bytes without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Hand the written bytes over to a [`ByteSecret`].
    pub fn into_secret(mut self) -> ByteSecret {
        SensitiveValue::wrap(std::mem::take(&mut self.buf))
    }

    fn reserve_wiping(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        if needed <= self.buf.capacity() {
            return;
        }
        let mut grown = Vec::with_capacity(needed.max(self.buf.capacity() * 2));
        grown.extend_from_slice(&self.buf);
        // Zeroes the full old allocation, including spare capacity.
        self.buf.zeroize();
        self.buf = grown;
    }
}

impl io::Write for SafeBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.reserve_wiping(data.len());
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SafeBuffer {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

impl fmt::Debug for SafeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeBuffer")
            .field("len", &self.buf.len())
            .finish_non_exhaustive()
    }
}
