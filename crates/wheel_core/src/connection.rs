#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

// Pausing is not a phase; the paused flag lives with the controller.
#[derive(Debug)]
pub struct ConnectionMachine {
    phase: LinkPhase,
    error_pending: bool,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self {
            phase: LinkPhase::Disconnected,
            error_pending: false,
        }
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    pub fn begin_connect(&mut self) {
        self.error_pending = false;
        self.phase = LinkPhase::Connecting;
    }

    pub fn construction_failed(&mut self) {
        self.phase = LinkPhase::Error;
    }

    pub fn opened(&mut self) {
        self.phase = LinkPhase::Connected;
    }

    pub fn errored(&mut self) {
        self.error_pending = true;
        self.phase = LinkPhase::Error;
    }

    /// Returns true when the close counts as a clean disconnect. After an
    /// error the phase keeps showing Error, but only for one close.
    pub fn closed(&mut self) -> bool {
        let clean = !self.error_pending;
        if clean {
            self.phase = LinkPhase::Disconnected;
        }
        self.error_pending = false;
        clean
    }

    pub fn reset(&mut self) {
        self.phase = LinkPhase::Disconnected;
        self.error_pending = false;
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}
