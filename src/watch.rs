//! Interactive terminal dashboard (`nexus-dash watch`).
//!
//! The main thread owns the [`Shell`] and blocks on the event channel. A
//! reader thread turns stdin lines into [`Event::Input`]; worker threads and
//! poll timers feed completions and ticks into the same channel. The screen
//! is redrawn whenever an event changed something visible.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::activity::ActivityLog;
use crate::api::ApiClient;
use crate::config::schema::DashConfig;
use crate::render;
use crate::runtime::{Dispatcher, Event, Runtime};
use crate::shell::{Shell, Tab};
use crate::views::chat::SendOutcome;
use crate::views::memory::MemoryView;

const HELP: &str = "/chat /memory /learning /tools  switch tab\n\
/search <query>  search memory    /results /episodes  memory view\n\
/refresh  reload the current tab   /help   /quit\n\
Anything else is sent as a chat message (or a search on the Memory tab).";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(Tab),
    Search(String),
    View(MemoryView),
    Refresh,
    Help,
    Quit,
    /// Free text for the active tab.
    Text(String),
    Unknown(String),
    Nothing,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Text(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "search" | "s" => Command::Search(arg.to_string()),
        "results" => Command::View(MemoryView::Search),
        "episodes" => Command::View(MemoryView::Episodes),
        "refresh" | "r" => Command::Refresh,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => match Tab::parse(other) {
            Some(tab) => Command::Tab(tab),
            None => Command::Unknown(name.to_string()),
        },
    }
}

/// Run the dashboard until `/quit` or end of input.
pub fn run(config: &DashConfig, log: ActivityLog) -> Result<()> {
    let client = ApiClient::new(&config.api);
    let api_url = client.base_url().to_string();
    let (mut dispatcher, events) = Dispatcher::new(Arc::new(client));
    spawn_input_reader(dispatcher.sender())?;

    let mut shell = Shell::mount(config, log, &mut dispatcher);
    let mut notice: Option<String> = None;
    redraw(&shell, &api_url, notice.as_deref());

    loop {
        // The dispatcher keeps a sender alive, so this only fails on a bug.
        let event = events.recv().context("event channel closed")?;
        let changed = match event {
            Event::InputClosed => break,
            Event::Input(line) => {
                let command = parse_command(&line);
                if command == Command::Quit {
                    break;
                }
                notice = apply(command, &mut shell, &mut dispatcher);
                true
            }
            other => shell.handle(other, &mut dispatcher),
        };
        if changed {
            redraw(&shell, &api_url, notice.as_deref());
        }
    }

    Ok(())
}

/// Apply one command. Returns a notice for the status line, if any.
fn apply(command: Command, shell: &mut Shell, rt: &mut dyn Runtime) -> Option<String> {
    match command {
        Command::Tab(tab) => {
            shell.select(tab, rt);
            None
        }
        Command::Search(query) => {
            if shell.tab() != Tab::Memory {
                shell.select(Tab::Memory, rt);
            }
            shell.set_memory_view(MemoryView::Search);
            (!shell.search_memory(&query, rt)).then(|| "Usage: /search <query>".to_string())
        }
        Command::View(view) => {
            if shell.tab() != Tab::Memory {
                return Some("Switch to /memory first".to_string());
            }
            shell.set_memory_view(view);
            None
        }
        Command::Refresh => {
            shell.refresh(rt);
            None
        }
        Command::Help => Some(HELP.to_string()),
        Command::Text(text) => match shell.tab() {
            Tab::Chat => match shell.send_chat(&text, rt) {
                Some(SendOutcome::Busy) => Some("Still waiting for the last reply".to_string()),
                _ => None,
            },
            Tab::Memory => {
                shell.set_memory_view(MemoryView::Search);
                shell.search_memory(&text, rt);
                None
            }
            _ => Some("Switch to /chat to send messages".to_string()),
        },
        Command::Unknown(name) => Some(format!("Unknown command /{name}. Type /help")),
        Command::Quit | Command::Nothing => None,
    }
}

fn redraw(shell: &Shell, api_url: &str, notice: Option<&str>) {
    let mut out = String::from("\x1B[2J\x1B[H");
    out.push_str(&render::dashboard(&shell.snapshot(), api_url));
    out.push('\n');
    if let Some(notice) = notice {
        out.push_str(&notice.yellow().to_string());
        out.push('\n');
    }
    out.push_str(&format!("{} ", ">".bold()));

    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(out.as_bytes());
    let _ = stdout.flush();
}

fn spawn_input_reader(tx: Sender<Event>) -> Result<()> {
    thread::Builder::new()
        .name("nexus-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Event::Input(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(Event::InputClosed);
        })
        .context("failed to start input reader")?;
    Ok(())
}
