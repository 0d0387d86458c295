use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::core::error::GatewayError;
use crate::sequencer::{ChainParams, Sequencer, SequencerState, Session};

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, msg: &serde_json::Value) -> Result<(), GatewayError> {
    let mut line = serde_json::to_string(msg)?;
    tracing::debug!(request = %line, "sent");
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Run the chain over an already-connected line transport until it reaches a
/// terminal state. If the server closes its output first, the sequencer is
/// marked interrupted.
pub async fn run_chain<R, W>(seq: &mut Sequencer, reader: R, mut writer: W) -> Result<(), GatewayError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(first) = seq.start() {
        send(&mut writer, &first).await?;
    }
    let mut lines = reader.lines();
    while !seq.state().is_terminal() {
        let Some(line) = lines.next_line().await? else {
            seq.interrupt("server closed its output");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        tracing::debug!(reply = %line, "received");
        if let Some(next) = seq.on_line(&line) {
            send(&mut writer, &next).await?;
        }
    }
    Ok(())
}

/// Spawn `server` (default: this executable) in `MODE=lines`, drive the chain
/// against it, and kill it once the chain ends or Ctrl-C arrives.
pub async fn run_demo(params: ChainParams, server: Option<PathBuf>) -> Result<(Session, SequencerState), GatewayError> {
    let program = match server {
        Some(path) => path,
        None => std::env::current_exe().map_err(GatewayError::Spawn)?,
    };
    tracing::info!(server = %program.display(), subject = %params.subject, date = %params.date, "starting demo chain");

    let mut child = Command::new(&program)
        .env("MODE", "lines")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(GatewayError::Spawn)?;
    let stdin = child.stdin.take().ok_or_else(|| GatewayError::Spawn(std::io::Error::other("no stdin pipe")))?;
    let stdout = child.stdout.take().ok_or_else(|| GatewayError::Spawn(std::io::Error::other("no stdout pipe")))?;

    let mut seq = Sequencer::new(params);
    let interrupted = tokio::select! {
        res = run_chain(&mut seq, BufReader::new(stdout), stdin) => {
            res?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::info!("interrupt received, stopping server");
        seq.interrupt("interrupted");
    }

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "server already gone");
    }
    Ok(seq.into_session())
}
