use std::sync::Arc;
use tokio::sync::watch;

/// Raised once to tear a connection down; observed by every pending step.
#[derive(Clone)]
pub struct CloseSignal {
    tx: Arc<watch::Sender<bool>>,
}

#[derive(Clone)]
pub struct CloseListener {
    rx: watch::Receiver<bool>,
}

impl CloseSignal {
    pub fn new() -> (Self, CloseListener) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, CloseListener { rx })
    }

    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

impl CloseListener {
    pub fn is_closed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once close was requested or every [`CloseSignal`] is gone.
    pub async fn closed(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
