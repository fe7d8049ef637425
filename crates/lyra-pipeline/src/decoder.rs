use tracing::trace;

use crate::stage::{StageMsg, StageRx, StageTx};

/// Placeholder decode stage: forwards tokens in order.
///
/// Always ends its output with `End`, even if the input closes without one.
pub(crate) async fn run_decoder(input: StageRx, output: StageTx) {
    trace!("decoder started");
    let mut decoded = 0_usize;
    loop {
        match input.recv().await {
            Ok(StageMsg::Segment(token)) => {
                trace!(segment = token.segment_index, "decoded");
                decoded += 1;
                if output.send(StageMsg::Segment(token)).await.is_err() {
                    trace!("player gone, decoder stopping");
                    return;
                }
            }
            Ok(StageMsg::End) | Err(_) => break,
        }
    }
    if output.send(StageMsg::End).await.is_err() {
        trace!("player gone before end marker");
    }
    trace!(decoded, "decoder stopped");
}
