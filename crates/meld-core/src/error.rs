use thiserror::Error as ThisError;

///
/// MergeError
///
/// Terminal failures for one merge request. Recoverable conditions (absent
/// source/target, unmapped fields, unresolved schemas) are policy branches
/// in the engines and never surface here. A failed merge leaves the target
/// potentially partially mutated; callers must discard it.
///

#[derive(Debug, ThisError)]
pub enum MergeError {
    /// Malformed document or decode failure anywhere in the merge pipeline.
    #[error("could not read payload: {source}")]
    PayloadUnreadable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Reflection-level failure to read an identifier/version field slot.
    /// A programming/configuration fault, not a user input error.
    #[error("field access failed on '{entity}.{field}': {message}")]
    FieldAccess {
        entity: String,
        field: String,
        message: String,
    },

    #[error("merge failed at {path}: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<Self>,
    },
}

impl MergeError {
    /// Wrap the originating cause of an unreadable payload.
    pub fn payload(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::PayloadUnreadable {
            source: Box::new(source),
        }
    }

    pub fn field_access(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::FieldAccess {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prepend a field segment to the merge error path.
    #[must_use]
    pub fn with_field(self, field: impl AsRef<str>) -> Self {
        self.with_path_segment(field.as_ref())
    }

    /// Prepend an index segment to the merge error path.
    #[must_use]
    pub fn with_index(self, index: usize) -> Self {
        self.with_path_segment(format!("[{index}]"))
    }

    /// Return the full contextual path, if available.
    #[must_use]
    pub const fn path(&self) -> Option<&str> {
        match self {
            Self::Context { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Return the innermost, non-context merge error variant.
    #[must_use]
    pub fn leaf(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.leaf(),
            _ => self,
        }
    }

    #[must_use]
    pub fn is_payload_unreadable(&self) -> bool {
        matches!(self.leaf(), Self::PayloadUnreadable { .. })
    }

    #[must_use]
    fn with_path_segment(self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        match self {
            Self::Context { path, source } => Self::Context {
                path: Self::join_segments(segment.as_str(), path.as_str()),
                source,
            },
            source => Self::Context {
                path: segment,
                source: Box::new(source),
            },
        }
    }

    #[must_use]
    fn join_segments(prefix: &str, suffix: &str) -> String {
        if suffix.starts_with('[') {
            format!("{prefix}{suffix}")
        } else {
            format!("{prefix}.{suffix}")
        }
    }
}

impl From<serde_json::Error> for MergeError {
    fn from(err: serde_json::Error) -> Self {
        Self::payload(err)
    }
}
