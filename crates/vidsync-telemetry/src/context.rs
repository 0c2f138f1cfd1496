//! Root span carrying the running command and build identifier.

use tracing::span::EnteredSpan;

use crate::init::build_sha;

/// Keeps the `vidsync` root span entered until dropped.
pub struct GlobalContextGuard {
    _span: EnteredSpan,
}

impl GlobalContextGuard {
    /// Enter a root span tagged with `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let span = tracing::info_span!("vidsync", command = %command, build_sha = %build_sha());
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_enters_and_leaves_the_root_span() {
        let before = tracing::Span::current().id();
        {
            let _guard = GlobalContextGuard::new("list");
        }
        assert_eq!(tracing::Span::current().id(), before);
    }
}
