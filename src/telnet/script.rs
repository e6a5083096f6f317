// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prompt-driven shell automaton and its stream driver.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{EOT, PASSWORD, USERNAME};
use crate::error::ExtractionError;

const READ_BUFFER: usize = 4096;

/// What the automaton wants done after a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    /// Transmit this text.
    Send(String),
    /// The marker was seen; the chunk holding it is the result.
    Finish(String),
}

/// Reads one file over a remote shell.
///
/// Every received chunk is checked for, in order: a login prompt, a
/// password prompt, a shell prompt (`#`) and the search marker. Matching is
/// by substring within the chunk; prompts are case-insensitive. No check
/// depends on an earlier one, so every prompt is answered each time it
/// appears. The echoed `cat` line is left out of the marker search. A chunk
/// holding the marker ends the session and sends nothing else.
///
/// # Examples
///
/// ```
/// use dlink_dsp::telnet::{ShellAction, ShellScript};
///
/// let mut script = ShellScript::new("/etc/hosts", "localhost");
/// assert_eq!(script.feed("login: "), vec![ShellAction::Send("admin\n".into())]);
/// assert_eq!(script.feed("Password: "), vec![ShellAction::Send("123456\n".into())]);
/// assert_eq!(script.feed("# "), vec![ShellAction::Send("cat /etc/hosts\n".into())]);
/// assert_eq!(
///     script.feed("127.0.0.1 localhost"),
///     vec![ShellAction::Finish("127.0.0.1 localhost".into())]
/// );
/// assert!(script.is_done());
/// ```
#[derive(Debug, Clone)]
pub struct ShellScript {
    command: String,
    marker: String,
    done: bool,
}

impl ShellScript {
    /// Creates a script that prints `path` and waits for `marker`.
    #[must_use]
    pub fn new(path: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            command: format!("cat {}", path.into()),
            marker: marker.into(),
            done: false,
        }
    }

    /// Returns `true` once the marker was seen.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Processes one received chunk.
    pub fn feed(&mut self, chunk: &str) -> Vec<ShellAction> {
        let mut actions = Vec::new();
        if self.done {
            return actions;
        }

        let lower = chunk.to_ascii_lowercase();
        if lower.contains("login:") {
            actions.push(ShellAction::Send(format!("{USERNAME}\n")));
        }
        if lower.contains("password:") {
            actions.push(ShellAction::Send(format!("{PASSWORD}\n")));
        }
        if chunk.contains('#') {
            actions.push(ShellAction::Send(format!("{}\n", self.command)));
        }
        if chunk.replace(self.command.as_str(), "").contains(self.marker.as_str()) {
            self.done = true;
            return vec![ShellAction::Finish(chunk.to_string())];
        }

        actions
    }
}

/// Runs `script` over `stream` until the marker shows up.
///
/// Chunks are decoded as lossy UTF-8. On success the end-of-transmission
/// byte is sent and the write half shut down; failures there are only
/// logged. No timeout is applied here.
///
/// # Errors
///
/// Returns `ExtractionError::SessionEnded` if the peer closes first, or
/// `ExtractionError::Io` on a read or write failure before that.
pub async fn run_script<S>(stream: &mut S, mut script: ShellScript) -> Result<String, ExtractionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            tracing::debug!("Remote shell closed before the target was found");
            return Err(ExtractionError::SessionEnded);
        }

        let chunk = String::from_utf8_lossy(&buf[..n]);
        tracing::trace!(len = n, "Remote shell chunk");

        for action in script.feed(&chunk) {
            match action {
                ShellAction::Send(line) => {
                    tracing::trace!(line = %line.trim_end(), "Remote shell send");
                    stream.write_all(line.as_bytes()).await?;
                }
                ShellAction::Finish(text) => {
                    if let Err(e) = stream.write_all(&[EOT]).await {
                        tracing::debug!(error = %e, "Failed to send end of transmission");
                    }
                    if let Err(e) = stream.shutdown().await {
                        tracing::debug!(error = %e, "Failed to shut down remote shell");
                    }
                    return Ok(text);
                }
            }
        }
    }
}
