//! Operator-facing read-eval loop.
//!
//! Reads lines from standard input, relays them through the session, and
//! prints colored, role-labelled output. The literal tokens `bye` and `exit`
//! (or end of input) end the loop, after which the session's cleanup runs on
//! the normal exit path.

use crate::convoke::backend::{BackendError, Thread};
use crate::convoke::session::AssistantSession;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Drive an interactive conversation on the given thread until the operator
/// leaves. Fatal run errors propagate and terminate the loop; the session
/// shutdown still runs before they are returned.
pub async fn run(session: &mut AssistantSession, thread: &Thread) -> Result<(), BackendError> {
    let result = converse(session, thread).await;
    session.shutdown().await;
    result
}

async fn converse(
    session: &mut AssistantSession,
    thread: &Thread,
) -> Result<(), BackendError> {
    loop {
        print!("{} ", "user:".cyan().bold());
        std::io::stdout().flush()?;
        let line = match read_line().await? {
            Some(line) => line,
            None => return Ok(()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "bye" || input == "exit" {
            return Ok(());
        }
        let reply = session.chat(&thread.id, input, &[], None).await?;
        println!("{}", reply.green());
    }
}

/// Read one line without blocking the async runtime. `None` means end of
/// input.
async fn read_line() -> Result<Option<String>, BackendError> {
    let line = tokio::task::spawn_blocking(|| {
        let stdin = std::io::stdin();
        let mut buffer = String::new();
        match stdin.lock().read_line(&mut buffer) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buffer)),
            Err(e) => Err(e),
        }
    })
    .await??;
    Ok(line)
}
