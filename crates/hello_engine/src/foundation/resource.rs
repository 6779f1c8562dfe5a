//! Scoped single-owner resources
//!
//! A [`ResourceSlot`] owns at most one resource at a time. The resource is
//! acquired on demand, can be discarded and re-acquired (for example after a
//! device loss or resize), and is released exactly once: either explicitly
//! or when the slot is dropped.

use std::fmt;
use std::io::{self, BufWriter, Write};

/// A resource with an explicit, possibly failing, release step
pub trait Release {
    /// Release the resource, consuming it
    fn release(self) -> io::Result<()>;
}

impl<W: Write> Release for BufWriter<W> {
    fn release(mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Holder for an optional, lazily acquired resource
pub struct ResourceSlot<T: Release> {
    label: &'static str,
    resource: Option<T>,
    acquisitions: u32,
}

impl<T: Release> ResourceSlot<T> {
    /// Create an empty slot; `label` names the resource in logs
    pub const fn empty(label: &'static str) -> Self {
        Self {
            label,
            resource: None,
            acquisitions: 0,
        }
    }

    /// Whether a resource is currently held
    pub const fn is_acquired(&self) -> bool {
        self.resource.is_some()
    }

    /// Number of successful acquisitions over the slot's life
    pub const fn acquisitions(&self) -> u32 {
        self.acquisitions
    }

    /// Shared access to the held resource
    pub const fn get(&self) -> Option<&T> {
        self.resource.as_ref()
    }

    /// Mutable access to the held resource
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.resource.as_mut()
    }

    /// Acquire a new resource, releasing any previous one first
    pub fn acquire<E>(&mut self, create: impl FnOnce() -> Result<T, E>) -> Result<&mut T, E> {
        self.discard();
        let resource = create()?;
        self.acquisitions += 1;
        log::trace!("Acquired resource '{}'", self.label);
        Ok(self.resource.insert(resource))
    }

    /// Return the held resource, acquiring it first if the slot is empty
    pub fn get_or_acquire<E>(&mut self, create: impl FnOnce() -> Result<T, E>) -> Result<&mut T, E> {
        match self.resource {
            Some(ref mut resource) => Ok(resource),
            None => self.acquire(create),
        }
    }

    /// Release the held resource
    ///
    /// Returns `Ok(false)` if the slot was already empty, so repeated calls
    /// never release twice.
    pub fn release(&mut self) -> io::Result<bool> {
        match self.resource.take() {
            Some(resource) => {
                log::trace!("Releasing resource '{}'", self.label);
                resource.release()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release the held resource, logging instead of returning failures
    pub fn discard(&mut self) {
        if let Err(err) = self.release() {
            log::warn!("Failed to release resource '{}': {}", self.label, err);
        }
    }
}

impl<T: Release> Drop for ResourceSlot<T> {
    fn drop(&mut self) {
        self.discard();
    }
}

impl<T: Release> fmt::Debug for ResourceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSlot")
            .field("label", &self.label)
            .field("acquired", &self.is_acquired())
            .field("acquisitions", &self.acquisitions)
            .finish()
    }
}
