//! Session handle — owns the compiler subprocess and its drain loop.
//!
//! One session per document. Starting a session spawns the compiler with
//! all three pipes and immediately starts the background read loop: OS
//! pipe buffers are bounded, so a session whose stdout is not being
//! drained would eventually block the compiler's own writes and stall
//! every future interaction.
//!
//! Commands are fire-and-forget. The wire carries no request ids, so a
//! sent command is never paired with a specific reply; callers correlate
//! by response content (e.g. the interaction id inside a `GiveAction`).
//! There are no timeouts and no retries anywhere in this layer.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command as Subprocess};
use tokio::sync::mpsc;

use crate::command::Command;
use crate::config::AgdaConfig;
use crate::response::{Response, decode_line};

const WRITER_CHANNEL_CAPACITY: usize = 64;

/// Why the read loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The compiler closed its stdout (clean exit or kill).
    Exited,
    /// Reading the stdout pipe failed.
    ReadFailed(String),
}

/// One delivery from the read loop to the consumer.
///
/// Events travel over an unbounded single-producer/single-consumer
/// channel: strict FIFO, nothing dropped, and the decode loop is never
/// blocked by a slow consumer. `Ended` is always the final event.
#[derive(Debug)]
pub enum SessionEvent {
    Response(Response),
    Ended(SessionEndReason),
}

/// A live compiler subprocess bound to one document.
pub struct AgdaSession {
    file: String,
    child: Child,
    writer_tx: mpsc::Sender<String>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    #[allow(dead_code)]
    reader_handle: tokio::task::JoinHandle<()>,
    #[allow(dead_code)]
    writer_handle: tokio::task::JoinHandle<()>,
    #[allow(dead_code)]
    stderr_handle: tokio::task::JoinHandle<()>,
}

impl AgdaSession {
    /// Spawn the compiler against `file` and start the drain loops.
    ///
    /// Fails if the executable cannot be resolved or spawned, or a pipe
    /// cannot be opened. There is no retry; a failed start is surfaced
    /// to the caller as-is.
    pub async fn start(config: &AgdaConfig, file: impl Into<String>) -> Result<Self> {
        let file = file.into();
        let resolved = which::which(&config.command)
            .with_context(|| format!("{} not found in PATH", config.command))?;

        let mut child = Subprocess::new(&resolved)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning {}", config.command))?;

        let mut stdin = child.stdin.take().context("no stdin from child")?;
        let stdout = child.stdout.take().context("no stdout from child")?;
        let stderr = child.stderr.take().context("no stderr from child")?;

        let (writer_tx, mut writer_rx) = mpsc::channel::<String>(WRITER_CHANNEL_CAPACITY);
        let writer_handle = tokio::spawn(async move {
            while let Some(wire) = writer_rx.recv().await {
                if let Err(e) = stdin.write_all(wire.as_bytes()).await {
                    tracing::warn!("agda write error: {e}");
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::warn!("agda flush error: {e}");
                    break;
                }
            }
        });

        let (event_tx, events) = mpsc::unbounded_channel();
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match decode_line(&line) {
                        Ok(response) => {
                            if event_tx.send(SessionEvent::Response(response)).is_err() {
                                // Consumer gone; nothing left to deliver to.
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("dropping undecodable line: {e}");
                        }
                    },
                    Ok(None) => {
                        tracing::info!("agda closed stdout");
                        let _ = event_tx.send(SessionEvent::Ended(SessionEndReason::Exited));
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("agda read error: {e}");
                        let _ = event_tx.send(SessionEvent::Ended(SessionEndReason::ReadFailed(
                            e.to_string(),
                        )));
                        break;
                    }
                }
            }
        });

        // Agda writes progress chatter to stderr; an undrained pipe could
        // wedge it just like stdout, so this is drained for the session's
        // whole lifetime too.
        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "agda::stderr", "{line}");
            }
        });

        Ok(Self {
            file,
            child,
            writer_tx,
            events,
            reader_handle,
            writer_handle,
            stderr_handle,
        })
    }

    /// The document this session was started against.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Encode `command` against the session file and queue it for stdin.
    ///
    /// Returns once the command is queued, not once the compiler has
    /// processed it; the only acknowledgement is a semantically matching
    /// response arriving later.
    pub async fn send(&self, command: &Command) -> Result<()> {
        let wire = command.encode(&self.file);
        tracing::debug!(command = ?command, "sending");
        self.writer_tx
            .send(wire)
            .await
            .map_err(|_| anyhow::anyhow!("writer channel closed"))
    }

    /// Next event from the read loop, in arrival order.
    ///
    /// `None` only after an `Ended` event has been consumed and the loop
    /// has exited.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Terminate the subprocess. Idempotent: repeated calls are no-ops.
    ///
    /// The read loop observes the resulting EOF and emits its final
    /// `Ended` event; `kill_on_drop` backstops sessions never killed
    /// explicitly.
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            // Already exited or already killed.
            tracing::debug!("kill: {e}");
        }
        let _ = self.child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn sh(script: &str) -> AgdaConfig {
        AgdaConfig {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
        }
    }

    async fn next(session: &mut AgdaSession) -> SessionEvent {
        timeout(Duration::from_secs(5), session.next_event())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed early")
    }

    fn expect_response(event: SessionEvent) -> Response {
        match event {
            SessionEvent::Response(response) => response,
            SessionEvent::Ended(reason) => panic!("expected response, session ended: {reason:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_fails_for_missing_executable() {
        let config = AgdaConfig {
            command: "definitely-not-an-agda-binary".into(),
            args: vec![],
        };
        let err = AgdaSession::start(&config, "Foo.agda")
            .await
            .err()
            .expect("start must fail for a missing executable");
        assert!(err.to_string().contains("not found in PATH"));
    }

    #[tokio::test]
    async fn test_events_arrive_in_emission_order() {
        let script = concat!(
            r#"printf 'JSON> {"kind":"ClearHighlighting"}\n'; "#,
            r#"printf 'JSON> {"kind":"DoneAborting"}\n'; "#,
            r#"printf 'JSON> {"kind":"DoneExiting"}\n'"#,
        );
        let mut session = AgdaSession::start(&sh(script), "Foo.agda").await.unwrap();

        assert_eq!(expect_response(next(&mut session).await), Response::ClearHighlighting);
        assert_eq!(expect_response(next(&mut session).await), Response::DoneAborting);
        assert_eq!(expect_response(next(&mut session).await), Response::DoneExiting);
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_stop_the_loop() {
        let script = concat!(
            r#"printf 'JSON> {"kind":"ClearHighlighting"}\n'; "#,
            r#"printf 'JSON> {truncated\n'; "#,
            r#"printf 'JSON> {"kind":"DoneExiting"}\n'"#,
        );
        let mut session = AgdaSession::start(&sh(script), "Foo.agda").await.unwrap();

        // Both valid neighbours of the bad line are still delivered.
        assert_eq!(expect_response(next(&mut session).await), Response::ClearHighlighting);
        assert_eq!(expect_response(next(&mut session).await), Response::DoneExiting);
    }

    #[tokio::test]
    async fn test_unrecognized_kind_is_forwarded() {
        let script = r#"printf 'JSON> {"kind":"Bogus"}\n'"#;
        let mut session = AgdaSession::start(&sh(script), "Foo.agda").await.unwrap();
        assert_eq!(
            expect_response(next(&mut session).await),
            Response::Unrecognized { kind: "Bogus".into() }
        );
    }

    #[tokio::test]
    async fn test_stdout_close_emits_ended_event() {
        let mut session = AgdaSession::start(&sh("true"), "Foo.agda").await.unwrap();
        match next(&mut session).await {
            SessionEvent::Ended(SessionEndReason::Exited) => {}
            other => panic!("expected Ended(Exited), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_reaches_stdin_newline_framed() {
        // `read` only returns once a full newline-terminated line arrives,
        // so the reply proves both delivery and framing.
        let script = r#"read line; printf 'JSON> {"kind":"DoneAborting"}\n'"#;
        let mut session = AgdaSession::start(&sh(script), "Foo.agda").await.unwrap();

        session.send(&Command::Metas).await.unwrap();

        assert_eq!(expect_response(next(&mut session).await), Response::DoneAborting);
    }

    #[tokio::test]
    async fn test_kill_is_idempotent_and_ends_session() {
        let mut session = AgdaSession::start(&sh("sleep 30"), "Foo.agda").await.unwrap();
        session.kill().await;
        session.kill().await;

        match next(&mut session).await {
            SessionEvent::Ended(_) => {}
            other => panic!("expected Ended, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_identity() {
        let session = AgdaSession::start(&sh("true"), "Bar.agda").await.unwrap();
        assert_eq!(session.file(), "Bar.agda");
    }
}
