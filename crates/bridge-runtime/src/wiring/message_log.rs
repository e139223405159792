//! Logs what the wallet says.

use shared_bus::{EventFilter, HandlerId};
use tracing::{info, warn};
use wb_05_session::{Session, SessionEvent, SessionTopic};

/// Log every wallet message and notice as display lines.
///
/// Signing outcomes of `signTx` responses come out as
/// `Transaction SIGNED!` / `Transaction REJECTED: <error>`.
pub fn log_wallet_messages(session: &Session) -> HandlerId {
    session.subscribe(
        EventFilter::topics(vec![
            SessionTopic::Message,
            SessionTopic::Notice,
            SessionTopic::Error,
        ]),
        |event| match event {
            SessionEvent::Message(envelope) => {
                for line in envelope.display_lines() {
                    info!(kind = envelope.kind_label(), "Wallet: {line}");
                }
            }
            SessionEvent::Notice(notice) => info!("System: {notice}"),
            SessionEvent::Error(error) => warn!("Error: {error}"),
            _ => {}
        },
    )
}
