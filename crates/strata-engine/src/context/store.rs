use std::collections::HashMap;

use crate::backend::GpuHandle;
use crate::error::{CoreError, Result};

use super::handle::{ContextId, NativeContext, VSyncMode};

/// Per-context graphics state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ContextRecord {
    /// Backend context bound to the window.
    pub native: Option<NativeContext>,
    /// Context this one shares objects with.
    pub shared_parent: Option<NativeContext>,
    /// Program most recently bound on this context.
    pub last_program: Option<GpuHandle>,
    pub vsync: VSyncMode,
}

/// One [`ContextRecord`] per registered context.
///
/// Strict: records only come into existence through [`register`](Self::register),
/// and every accessor on an unregistered identifier fails and logs. A missing
/// record is never confused with a zero handle.
#[derive(Debug, Default)]
pub struct ContextStore {
    records: HashMap<ContextId, ContextRecord>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: ContextId) -> Result<()> {
        if self.records.contains_key(&id) {
            log::error!(
                target: "context",
                "cannot register context '{id}' because the ID is already assigned"
            );
            return Err(CoreError::ContextAlreadyRegistered(id));
        }
        self.records.insert(id, ContextRecord::default());
        log::debug!(target: "context", "registered context '{id}'");
        Ok(())
    }

    /// Drops the record for a torn-down window or surface.
    pub fn unregister(&mut self, id: ContextId) -> Result<ContextRecord> {
        let record = self.records.remove(&id).ok_or_else(|| unregistered(id, "unregister"))?;
        log::debug!(target: "context", "unregistered context '{id}'");
        Ok(record)
    }

    #[inline]
    pub fn contains(&self, id: ContextId) -> bool {
        self.records.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.records.keys().copied()
    }

    pub fn record(&self, id: ContextId) -> Result<&ContextRecord> {
        self.records.get(&id).ok_or_else(|| unregistered(id, "read"))
    }

    fn record_mut(&mut self, id: ContextId, op: &str) -> Result<&mut ContextRecord> {
        self.records.get_mut(&id).ok_or_else(|| unregistered(id, op))
    }

    pub fn set_native(&mut self, id: ContextId, native: NativeContext) -> Result<()> {
        self.record_mut(id, "set native context of")?.native = Some(native);
        Ok(())
    }

    /// Fails if the context is unregistered or has no native handle yet.
    pub fn native(&self, id: ContextId) -> Result<NativeContext> {
        let record = self.records.get(&id).ok_or_else(|| unregistered(id, "get native context of"))?;
        record.native.ok_or_else(|| {
            log::error!(
                target: "context",
                "cannot get native context of '{id}' because it is unassigned"
            );
            CoreError::ContextHandleUnassigned(id)
        })
    }

    pub fn set_shared_parent(&mut self, id: ContextId, parent: NativeContext) -> Result<()> {
        self.record_mut(id, "set shared parent of")?.shared_parent = Some(parent);
        Ok(())
    }

    pub fn shared_parent(&self, id: ContextId) -> Result<NativeContext> {
        let record = self
            .records
            .get(&id)
            .ok_or_else(|| unregistered(id, "get shared parent of"))?;
        record.shared_parent.ok_or_else(|| {
            log::error!(
                target: "context",
                "cannot get shared parent of '{id}' because it is unassigned"
            );
            CoreError::SharedContextUnassigned(id)
        })
    }

    pub fn set_last_program(&mut self, id: ContextId, program: Option<GpuHandle>) -> Result<()> {
        self.record_mut(id, "set last program of")?.last_program = program;
        Ok(())
    }

    /// `Ok(None)` means nothing has been bound on this context yet.
    pub fn last_program(&self, id: ContextId) -> Result<Option<GpuHandle>> {
        Ok(self.record(id)?.last_program)
    }

    /// Clears `program` from every context that has it cached as bound.
    pub fn forget_program(&mut self, program: GpuHandle) {
        for record in self.records.values_mut() {
            if record.last_program == Some(program) {
                record.last_program = None;
            }
        }
    }

    /// Records the mode only. Use [`Graphics::set_vsync`] to apply it.
    ///
    /// [`Graphics::set_vsync`]: crate::graphics::Graphics::set_vsync
    pub fn set_vsync_mode(&mut self, id: ContextId, mode: VSyncMode) -> Result<()> {
        self.record_mut(id, "set vsync mode of")?.vsync = mode;
        Ok(())
    }

    pub fn vsync_mode(&self, id: ContextId) -> Result<VSyncMode> {
        Ok(self.record(id)?.vsync)
    }
}

fn unregistered(id: ContextId, op: &str) -> CoreError {
    log::error!(
        target: "context",
        "cannot {op} context '{id}' because the ID is unassigned"
    );
    CoreError::ContextNotRegistered(id)
}
