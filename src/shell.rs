//! A small interactive prompt for listing and starting/stopping torrents.

use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal;
use tracing::debug;

use crate::catalog::{Filter, SortKey};
use crate::client::TorrentClient;
use crate::config::connection::Connection;
use crate::config::rules::RuleRegistry;
use crate::error::CommandError;
use crate::pipeline::{Pipeline, Session};

/// Whether the shell should keep reading commands.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<'a, C> {
    client: &'a mut C,
    rules: &'a RuleRegistry,
    prompt: String,
}

impl<'a, C: TorrentClient> Shell<'a, C> {
    pub fn new(client: &'a mut C, rules: &'a RuleRegistry, connection: &Connection) -> Self {
        Shell {
            client,
            rules,
            prompt: format!("(TS@{}:{})> ", connection.host, connection.port),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Runs one listing pipeline against a fresh torrent list.
    pub async fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<(), CommandError> {
        let pipeline: Pipeline = line.parse()?;
        let torrents = self.client.get_torrents().await?;
        let mut session = Session::new(&mut *self.client, self.rules, out);
        pipeline.apply(torrents, &mut session).await?;
        Ok(())
    }

    /// Interprets one line of input. Command failures are reported on
    /// `out`; only failing to write there is an error.
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        let (command, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match command {
            "" => {}
            "exit" | "quit" => return Ok(Flow::Exit),
            "help" | "?" => write_help(out)?,
            "ls" => {
                if let Err(e) = self.execute(args, out).await {
                    debug!("Command {:?} failed: {}", line, e);
                    writeln!(out, "!!! {}", e)?;
                }
            }
            other => writeln!(out, "!!! Unknown command: {}", other)?,
        }
        Ok(Flow::Continue)
    }

    /// Reads commands until `exit`, end of input or Ctrl-C. An
    /// interrupt abandons the command in flight; whatever it already
    /// did to the torrents stays done.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "{}", self.prompt)?;
            out.flush()?;
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                writeln!(out)?;
                return Ok(());
            };
            let flow = tokio::select! {
                flow = self.handle_line(&line, &mut *out) => Some(flow?),
                _ = signal::ctrl_c() => None,
            };
            match flow {
                Some(Flow::Continue) => {}
                Some(Flow::Exit) => return Ok(()),
                None => {
                    writeln!(out)?;
                    return Ok(());
                }
            }
        }
    }
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "ls [stage|stage|...]   list torrents through a pipeline")?;
    writeln!(out, "exit                   leave the shell")?;
    writeln!(out)?;
    writeln!(out, "stages:")?;
    writeln!(out, "  <n>                  keep the first n torrents")?;
    writeln!(out, "  p, print             print the current list")?;
    writeln!(out, "  c, count             print how many torrents there are, then stop")?;
    writeln!(out, "  r, reverse           reverse the order")?;
    writeln!(out, "  start, stop, verify  act on every torrent in the list")?;
    writeln!(out, "  n=<prefix>           names starting with prefix")?;
    writeln!(out, "  t=<text>             tracker rule containing text")?;
    writeln!(out, "  a=<dir><num><unit>   added before (>) or within (<) e.g. a=>2w")?;
    writeln!(out, "  filters: {}", Filter::NAMES.join(", "))?;
    writeln!(out, "  sorts: {}", SortKey::NAMES.join(", "))?;
    Ok(())
}
