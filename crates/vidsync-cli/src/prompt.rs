//! Line-based prompts backing the permission gate and the consent flow.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;
use vidsync_core::{
    Capability, ConsentDecision, ConsentError, ConsentFlow, ConsentResult, ConsentToken,
    PermissionGate, PermissionGrants,
};

type SharedInput = Arc<Mutex<Box<dyn BufRead + Send>>>;

/// Asks yes/no questions on stderr and reads answers line by line.
///
/// With `assume_yes` every question is answered affirmatively without
/// touching the input.
pub(crate) struct TerminalPrompt {
    assume_yes: bool,
    input: SharedInput,
}

impl TerminalPrompt {
    pub(crate) fn stdin(assume_yes: bool) -> Self {
        Self::with_input(io::BufReader::new(io::stdin()), assume_yes)
    }

    pub(crate) fn with_input(input: impl BufRead + Send + 'static, assume_yes: bool) -> Self {
        Self {
            assume_yes,
            input: Arc::new(Mutex::new(Box::new(input))),
        }
    }

    /// `Ok(None)` when the input closed before an answer arrived.
    async fn ask(&self, question: String) -> io::Result<Option<bool>> {
        if self.assume_yes {
            return Ok(Some(true));
        }
        let input = Arc::clone(&self.input);
        tokio::task::spawn_blocking(move || {
            let mut stderr = io::stderr().lock();
            write!(stderr, "{question} [y/N] ")?;
            stderr.flush()?;

            let mut input = input
                .lock()
                .map_err(|_| io::Error::other("prompt input lock poisoned"))?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            Ok(Some(is_affirmative(&line)))
        })
        .await
        .map_err(io::Error::other)?
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn capability_question(capability: Capability) -> String {
    match capability {
        Capability::ReadSharedMedia => "Allow vidsync to read videos in shared storage?".into(),
    }
}

#[async_trait]
impl PermissionGate for TerminalPrompt {
    async fn request(&self, capabilities: &[Capability]) -> PermissionGrants {
        let mut grants = PermissionGrants::default();
        for &capability in capabilities {
            let granted = match self.ask(capability_question(capability)).await {
                Ok(answer) => answer.unwrap_or(false),
                Err(err) => {
                    warn!(
                        capability = capability.label(),
                        error = %err,
                        "permission prompt failed; treating as denied"
                    );
                    false
                }
            };
            grants.set(capability, granted);
        }
        grants
    }
}

#[async_trait]
impl ConsentFlow for TerminalPrompt {
    async fn resolve(&self, token: &ConsentToken) -> ConsentResult<ConsentDecision> {
        if !self.assume_yes {
            let mut stderr = io::stderr().lock();
            for location in &token.locations {
                let _ = writeln!(stderr, "  {location}");
            }
        }
        let question = format!(
            "Delete {} videos from shared storage?",
            token.locations.len()
        );
        match self.ask(question).await {
            Ok(Some(true)) => Ok(ConsentDecision::Confirmed),
            Ok(Some(false)) => Ok(ConsentDecision::Denied),
            Ok(None) => Err(ConsentError::Dismissed),
            Err(source) => Err(ConsentError::Io { source }),
        }
    }
}
