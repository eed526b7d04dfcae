use std::fmt;

use super::audio_models::SessionKind;

/// Opaque caller-held reference to a live session.
///
/// A handle names the registry that issued it, the session slot, and the
/// slot generation at issuance. It stays valid only while that generation is
/// current and the session is not closed. Generations start at 1 and are
/// never reused for a slot, so [`Handle::NULL`] is never valid anywhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) registry: u64,
    pub(crate) kind: SessionKind,
    pub(crate) generation: u64,
}

impl Handle {
    pub const NULL: Handle = Handle {
        registry: 0,
        kind: SessionKind::Primary,
        generation: 0,
    };

    pub fn is_null(&self) -> bool {
        self.generation == 0
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Handle(null)");
        }
        write!(f, "Handle({}#{}@{})", self.kind, self.generation, self.registry)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
