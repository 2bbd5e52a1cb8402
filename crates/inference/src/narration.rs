use std::fmt;
use std::io::{self, Stdout, Write};
use thiserror::Error;

/// Speaks a finished message to the user.
pub trait Narrator {
    fn initialize(&mut self) -> anyhow::Result<()>;
    fn speak(&mut self, text: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    Uninitialized,
    Ready,
    Failed,
}

impl fmt::Display for NarrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NarrationState::Uninitialized => "uninitialized",
            NarrationState::Ready => "ready",
            NarrationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Narrator is not ready (state: {0})")]
    NotReady(NarrationState),

    #[error("Narrator failed to initialize: {0}")]
    Initialize(#[source] anyhow::Error),

    #[error("Narrator failed to speak: {0}")]
    Speak(#[source] anyhow::Error),
}

/// Tracks whether the wrapped narrator may be asked to speak.
///
/// Messages are only forwarded in [`NarrationState::Ready`]. Any failure of
/// the underlying narrator parks the context in [`NarrationState::Failed`]
/// until [`NarrationContext::initialize`] succeeds again.
pub struct NarrationContext<N> {
    narrator: N,
    state: NarrationState,
}

impl<N: Narrator> NarrationContext<N> {
    pub fn new(narrator: N) -> Self {
        Self {
            narrator,
            state: NarrationState::Uninitialized,
        }
    }

    pub fn initialize(&mut self) -> Result<(), NarrationError> {
        match self.narrator.initialize() {
            Ok(()) => {
                self.state = NarrationState::Ready;
                tracing::debug!("Narrator ready");
                Ok(())
            }
            Err(e) => {
                self.state = NarrationState::Failed;
                tracing::warn!(error = %e, "Narrator initialization failed");
                Err(NarrationError::Initialize(e))
            }
        }
    }

    pub fn speak(&mut self, text: &str) -> Result<(), NarrationError> {
        if self.state != NarrationState::Ready {
            return Err(NarrationError::NotReady(self.state));
        }

        self.narrator.speak(text).map_err(|e| {
            self.state = NarrationState::Failed;
            NarrationError::Speak(e)
        })
    }

    pub fn state(&self) -> NarrationState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == NarrationState::Ready
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }
}

/// Writes each message as one line. Stands in for a speech engine.
pub struct ConsoleNarrator<W> {
    out: W,
}

impl ConsoleNarrator<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleNarrator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Narrator for ConsoleNarrator<W> {
    fn initialize(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}
