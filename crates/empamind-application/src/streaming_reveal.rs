//! Streaming reveal of an already-known reply.
//!
//! The full text is in hand before the reveal starts; the reveal only paces
//! how fast it appears. Each step exposes one more character, and the step
//! that reaches the full length also ends the streaming state.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One write performed by a reveal.
#[derive(Debug)]
pub struct RevealStep<'a> {
    /// Conversation epoch the reveal was started under.
    pub epoch: u64,
    pub message_id: &'a str,
    /// Prefix of the full text to show.
    pub text: &'a str,
    /// True on the final step.
    pub done: bool,
    /// Cancellation token of the owning reveal; check it under the same lock
    /// that guards the write.
    pub token: &'a CancellationToken,
}

/// Where a reveal writes its steps.
#[async_trait]
pub trait RevealTarget: Send + Sync + 'static {
    /// Applies one step.
    ///
    /// Returns `false` when the step could not be applied (reveal cancelled,
    /// conversation replaced, message gone), which ends the reveal.
    async fn apply_step(&self, step: RevealStep<'_>) -> bool;
}

/// Handle to a running reveal, keyed by the message it writes to.
///
/// Cancellation is idempotent and takes effect before the next step.
#[derive(Debug)]
pub struct RevealHandle {
    message_id: String,
    full_text: String,
    token: CancellationToken,
    finished: CancellationToken,
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// The complete reply text being revealed.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_cancelled() || self.task.is_finished()
    }

    /// A token that fires once the reveal task has exited for any reason.
    pub fn finished_signal(&self) -> CancellationToken {
        self.finished.clone()
    }
}

/// Spawns reveal tasks at a fixed pace.
#[derive(Debug, Clone, Copy)]
pub struct StreamingReveal {
    interval: Duration,
}

impl StreamingReveal {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Starts revealing `full_text` into `message_id`.
    ///
    /// A text of N characters produces exactly N steps; an empty text
    /// produces a single final step.
    pub fn start(
        &self,
        target: Arc<dyn RevealTarget>,
        epoch: u64,
        message_id: impl Into<String>,
        full_text: impl Into<String>,
    ) -> RevealHandle {
        let message_id = message_id.into();
        let full_text = full_text.into();
        let token = CancellationToken::new();
        let finished = CancellationToken::new();
        let interval = self.interval;

        let task = tokio::spawn({
            let message_id = message_id.clone();
            let full_text = full_text.clone();
            let token = token.clone();
            let finished = finished.clone();
            async move {
                let _finished = finished.drop_guard();
                run_reveal(target, epoch, &message_id, &full_text, interval, &token).await;
            }
        });

        RevealHandle {
            message_id,
            full_text,
            token,
            finished,
            task,
        }
    }
}

/// Byte offsets at which each successive prefix ends.
fn prefix_ends(text: &str) -> Vec<usize> {
    if text.is_empty() {
        return vec![0];
    }
    text.char_indices()
        .skip(1)
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .collect()
}

async fn run_reveal(
    target: Arc<dyn RevealTarget>,
    epoch: u64,
    message_id: &str,
    full_text: &str,
    interval: Duration,
    token: &CancellationToken,
) {
    let ends = prefix_ends(full_text);
    let last = ends.len() - 1;

    for (step, end) in ends.into_iter().enumerate() {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("[StreamingReveal] Cancelled reveal of {} at step {}", message_id, step);
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let applied = target
            .apply_step(RevealStep {
                epoch,
                message_id,
                text: &full_text[..end],
                done: step == last,
                token,
            })
            .await;

        if !applied {
            tracing::debug!("[StreamingReveal] Reveal of {} stopped at step {}", message_id, step);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTarget {
        steps: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait]
    impl RevealTarget for RecordingTarget {
        async fn apply_step(&self, step: RevealStep<'_>) -> bool {
            if step.token.is_cancelled() {
                return false;
            }
            self.steps
                .lock()
                .unwrap()
                .push((step.text.to_string(), step.done));
            true
        }
    }

    #[test]
    fn test_prefix_ends_follow_char_boundaries() {
        assert_eq!(prefix_ends("abc"), vec![1, 2, 3]);
        assert_eq!(prefix_ends("héllo").len(), 5);
        assert_eq!(prefix_ends("🙂ok"), vec![4, 5, 6]);
        assert_eq!(prefix_ends(""), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_emits_one_step_per_char() {
        let target = Arc::new(RecordingTarget::default());
        let reveal = StreamingReveal::new(Duration::from_millis(20));

        let handle = reveal.start(target.clone(), 0, "m1", "héy");
        handle.finished_signal().cancelled().await;

        let steps = target.steps.lock().unwrap().clone();
        assert_eq!(
            steps,
            vec![
                ("h".to_string(), false),
                ("hé".to_string(), false),
                ("héy".to_string(), true),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_further_steps() {
        let target = Arc::new(RecordingTarget::default());
        let reveal = StreamingReveal::new(Duration::from_millis(20));

        let handle = reveal.start(target.clone(), 0, "m1", "a long reply");
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
        handle.cancel();
        handle.finished_signal().cancelled().await;

        let steps = target.steps.lock().unwrap().clone();
        assert!(steps.len() < "a long reply".len());
        assert!(steps.iter().all(|(_, done)| !done));
        assert!(handle.is_cancelled());
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_finishes_in_one_step() {
        let target = Arc::new(RecordingTarget::default());
        let handle = StreamingReveal::new(Duration::from_millis(5)).start(target.clone(), 0, "m1", "");
        handle.finished_signal().cancelled().await;

        assert_eq!(*target.steps.lock().unwrap(), vec![(String::new(), true)]);
    }
}
