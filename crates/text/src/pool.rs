// Chunk: docs/chunks/buffer_pools - Shared scratch buffers

//! Process-wide free lists for scratch buffers.
//!
//! A [`Pool`] lives in a `static`. [`Pool::acquire`] hands out a [`Pooled`]
//! guard; dropping the guard resets the value and puts it back, so release
//! happens on every exit path, including unwinding.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

/// Size of the scratch buffers used for bulk copies, checksums and comparisons.
pub const CHAR_BUFFER_SIZE: usize = 2048;

static CHAR_BUFFERS: Pool<Vec<char>> = Pool::new(16, new_char_buffer, reset_char_buffer);

fn new_char_buffer() -> Vec<char> {
    vec!['\0'; CHAR_BUFFER_SIZE]
}

fn reset_char_buffer(buffer: &mut Vec<char>) {
    buffer.truncate(CHAR_BUFFER_SIZE);
    buffer.resize(CHAR_BUFFER_SIZE, '\0');
}

/// Borrows a `CHAR_BUFFER_SIZE`-long scratch buffer from the shared pool.
pub fn char_buffer() -> Pooled<Vec<char>> {
    CHAR_BUFFERS.acquire()
}

/// A thread-safe free list of reusable values.
#[derive(Debug)]
pub struct Pool<T: 'static> {
    free: Mutex<Vec<T>>,
    max_retained: usize,
    create: fn() -> T,
    reset: fn(&mut T),
}

impl<T: Default + 'static> Pool<T> {
    /// Creates a pool that keeps at most `max_retained` idle values.
    ///
    /// `create` builds a fresh value when the pool is empty; `reset` runs on
    /// every value as it is released.
    pub const fn new(max_retained: usize, create: fn() -> T, reset: fn(&mut T)) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
            create,
            reset,
        }
    }

    /// Takes an idle value, or creates one.
    pub fn acquire(&'static self) -> Pooled<T> {
        let idle = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        Pooled {
            value: idle.unwrap_or_else(self.create),
            pool: self,
        }
    }

    /// Number of idle values currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, mut value: T) {
        (self.reset)(&mut value);
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_retained {
            free.push(value);
        }
    }
}

/// A value on loan from a [`Pool`]; returned when dropped.
#[derive(Debug)]
pub struct Pooled<T: Default + 'static> {
    value: T,
    pool: &'static Pool<T>,
}

impl<T: Default> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Default> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Default> Drop for Pooled<T> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.value));
    }
}
