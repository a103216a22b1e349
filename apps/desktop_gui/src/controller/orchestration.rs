//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};

/// Queues `cmd` without blocking the frame. A full or closed queue is
/// reported back as a banner-worthy error.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), UiError> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            Err(UiError::from_message(
                UiErrorContext::General,
                "UI command queue is full; retry in a moment",
            ))
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
            Err(UiError::from_message(
                UiErrorContext::BackendStartup,
                "Backend worker disconnected (possible startup failure); restart the app",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossbeam_channel::bounded;

    use crate::controller::events::UiErrorCategory;

    #[test]
    fn queues_commands_while_there_is_room() {
        let (tx, rx) = bounded(1);
        dispatch_backend_command(&tx, BackendCommand::CheckHealth).expect("queued");
        assert!(matches!(rx.try_recv(), Ok(BackendCommand::CheckHealth)));
    }

    #[test]
    fn full_queue_is_reported() {
        let (tx, _rx) = bounded(1);
        dispatch_backend_command(&tx, BackendCommand::CheckHealth).expect("queued");
        let err = dispatch_backend_command(&tx, BackendCommand::CancelImageLoads)
            .expect_err("full");
        assert_eq!(err.context(), UiErrorContext::General);
    }

    #[test]
    fn closed_queue_is_a_transport_failure() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let err = dispatch_backend_command(&tx, BackendCommand::CheckHealth)
            .expect_err("disconnected");
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::BackendStartup);
    }
}
