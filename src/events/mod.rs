use std::path::PathBuf;

/// Notifications sent from the conversion worker to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// Whole-batch percentage in `0..=100`.
    Progress(u8),
    FileStarted {
        index: usize,
        total: usize,
        input: PathBuf,
    },
    FileFinished {
        input: PathBuf,
        output: PathBuf,
    },
    FileSkipped {
        input: PathBuf,
        output: PathBuf,
    },
    FileError {
        input: PathBuf,
        message: String,
    },
    Cancelled,
    Completed,
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<ConversionEvent>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<ConversionEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Sends `event`, logging instead of failing when the UI side is gone.
pub fn emit(sender: &EventSender, event: ConversionEvent) {
    if let Err(e) = sender.send(event) {
        tracing::debug!("Dropped conversion event, receiver closed: {:?}", e.0);
    }
}
