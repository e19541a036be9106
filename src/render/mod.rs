//! Terminal rendering of dashboard view models.
//!
//! Every function returns a `String` so the one-shot CLI commands, the
//! interactive dashboard and the tests share the same output.

use std::fmt::Write;

use colored::{ColoredString, Colorize};

use crate::monitor::ConnectionState;
use crate::shell::{PanelSnapshot, ShellSnapshot, Tab};
use crate::views::chat::{ChatPanel, Role};
use crate::views::learning::{LearningPanel, SkillTier};
use crate::views::memory::{MemoryPanel, MemoryView};
use crate::views::stats::StatsPanel;
use crate::views::tools::ToolsPanel;

/// Width of progress bars in cells.
const BAR_WIDTH: usize = 20;

/// Most recent chat messages shown by the interactive dashboard.
pub const CHAT_TAIL: usize = 12;

const WELCOME_TITLE: &str = "Welcome to Nexus AGI";
const WELCOME_BODY: &str =
    "I'm an advanced autonomous agent with memory, learning, and tool-use capabilities. Ask me anything!";

// ---------------------------------------------------------------------------
// Whole screen
// ---------------------------------------------------------------------------

/// Header, tab bar, active panel and stats panel.
pub fn dashboard(snapshot: &ShellSnapshot, api_url: &str) -> String {
    let mut out = String::new();
    out.push_str(&header(snapshot.connection, api_url));
    out.push_str(&tab_bar(snapshot.tab));
    out.push('\n');
    let panel = match &snapshot.panel {
        PanelSnapshot::Chat(panel) => chat(panel, CHAT_TAIL),
        PanelSnapshot::Memory(panel) => memory(panel),
        PanelSnapshot::Learning(panel) => learning(panel),
        PanelSnapshot::Tools(panel) => tools(panel),
    };
    out.push_str(&panel);
    out.push('\n');
    out.push_str(&stats(&snapshot.stats));
    out
}

pub fn header(connection: ConnectionState, api_url: &str) -> String {
    let dot = match connection {
        ConnectionState::Connected => "●".green(),
        ConnectionState::Disconnected => "●".red(),
        ConnectionState::Unknown => "●".dimmed(),
    };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}  {} {}",
        "Nexus AGI".bold().magenta(),
        "Advanced Autonomous Agent".dimmed(),
        dot,
        connection.label()
    );
    let _ = writeln!(out, "{}", api_url.dimmed());
    let _ = writeln!(out, "{}", "=".repeat(60));
    out
}

pub fn tab_bar(active: Tab) -> String {
    let tabs: Vec<String> = Tab::ALL
        .into_iter()
        .map(|tab| {
            if tab == active {
                format!("[{}]", tab.label()).bold().cyan().to_string()
            } else {
                format!(" {} ", tab.label()).dimmed().to_string()
            }
        })
        .collect();
    format!("{}\n", tabs.join(" "))
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

/// The newest `tail` messages; older ones scroll off the top.
pub fn chat(panel: &ChatPanel, tail: usize) -> String {
    let mut out = String::new();
    if panel.messages.is_empty() && !panel.pending {
        let _ = writeln!(out, "  {}", WELCOME_TITLE.bold());
        let _ = writeln!(out, "  {}", WELCOME_BODY.dimmed());
        return out;
    }

    let skip = panel.messages.len().saturating_sub(tail);
    if skip > 0 {
        let _ = writeln!(out, "  {}", format!("({skip} earlier messages)").dimmed());
    }
    for message in &panel.messages[skip..] {
        let who = match message.role {
            Role::User => "You".bold().blue(),
            Role::Assistant => "Nexus".bold().magenta(),
        };
        let _ = writeln!(out, "  {} {}", who, message.time.dimmed());
        for line in message.content.lines() {
            let _ = writeln!(out, "    {line}");
        }
        if !message.tools.is_empty() {
            let _ = writeln!(
                out,
                "    {} {}",
                "Tools used:".dimmed(),
                message.tools.join(", ").cyan()
            );
        }
        if let Some(pattern) = &message.pattern_detected {
            let _ = writeln!(out, "    {} {}", "Pattern:".dimmed(), pattern);
        }
        if let Some(n) = message.memories_used.filter(|n| *n > 0) {
            let _ = writeln!(out, "    {}", format!("{n} memories used").dimmed());
        }
    }
    if panel.pending {
        let _ = writeln!(out, "  {} {}", "Nexus".bold().magenta(), "Thinking...".dimmed());
    }
    out
}

pub fn memory(panel: &MemoryPanel) -> String {
    let mut out = String::new();
    let (search, episodes) = match panel.view {
        MemoryView::Search => ("[Search]".bold().cyan(), " Episodes ".dimmed()),
        MemoryView::Episodes => (" Search ".dimmed(), "[Episodes]".bold().cyan()),
    };
    let _ = writeln!(out, "  {search} {episodes}");

    match panel.view {
        MemoryView::Search => {
            if let Some(query) = &panel.query {
                let _ = writeln!(out, "  {} {}", "Query:".dimmed(), query);
            }
            if panel.memories.is_empty() {
                let _ = writeln!(out, "  {}", "Search to find relevant memories".dimmed());
            }
            for card in &panel.memories {
                let _ = writeln!(
                    out,
                    "  {} {}",
                    format!("Similarity: {}", card.similarity).green(),
                    card.timestamp.as_deref().unwrap_or("").dimmed()
                );
                let _ = writeln!(out, "    {}", card.content);
            }
        }
        MemoryView::Episodes => {
            if panel.episodes.is_empty() {
                let _ = writeln!(out, "  {}", "No episodes yet".dimmed());
            }
            for card in &panel.episodes {
                let _ = writeln!(out, "  {} {}", "User:".bold().blue(), card.user_message);
                let _ = writeln!(out, "  {} {}", "Agent:".bold().magenta(), card.agent_preview);
                let mut meta = card.timestamp.dimmed().to_string();
                if !card.tools_used.is_empty() {
                    let _ = write!(meta, "  {}", card.tools_used.join(", ").cyan());
                }
                let _ = writeln!(out, "    {meta}");
            }
        }
    }
    out
}

pub fn learning(panel: &LearningPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {}", "Detected Patterns".bold().cyan());
    if panel.patterns.is_empty() {
        let _ = writeln!(out, "    {}", "No patterns detected yet".dimmed());
    }
    for card in &panel.patterns {
        let _ = writeln!(
            out,
            "    {} {}  {}",
            card.keywords.join(", "),
            format!("×{}", card.frequency).yellow(),
            format!("Last seen: {}", card.last_seen).dimmed()
        );
    }

    out.push('\n');
    let _ = writeln!(out, "  {}", "Learned Skills".bold().cyan());
    if panel.skills.is_empty() {
        let _ = writeln!(out, "    {}", "No skills learned yet".dimmed());
    }
    for card in &panel.skills {
        let _ = writeln!(
            out,
            "    {:<20} {}  {}",
            card.name,
            tier_badge(card.tier),
            format!("Level {}", card.level)
        );
        let _ = writeln!(
            out,
            "    {}  {}",
            bar(card.bar_percent, BAR_WIDTH),
            format!("Uses: {}  Success: {}", card.uses, card.success).dimmed()
        );
    }
    out
}

pub fn stats(panel: &StatsPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {}", "System Statistics".bold().cyan());
    let StatsPanel::Ready {
        cards,
        avg_skill,
        top_skills,
    } = panel
    else {
        let _ = writeln!(out, "    {}", "Loading...".dimmed());
        return out;
    };

    for card in cards {
        let _ = writeln!(out, "    {:<16} {}", card.label, card.value.to_string().bold());
    }
    if let Some(avg) = avg_skill {
        let _ = writeln!(
            out,
            "    {:<16} {} / 10",
            "Avg Skill Level",
            avg.level.bold()
        );
        let _ = writeln!(out, "    {}", bar(avg.percent, BAR_WIDTH));
    }
    if !top_skills.is_empty() {
        let _ = writeln!(out, "    {}", "Top Skills".bold());
        for skill in top_skills {
            let _ = writeln!(
                out,
                "      {:<18} {}",
                skill.name,
                format!("Lvl {}", skill.level).dimmed()
            );
        }
    }
    out
}

pub fn tools(panel: &ToolsPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {}", "Available Tools".bold().cyan());
    let ToolsPanel::Ready { tools } = panel else {
        let _ = writeln!(out, "    {}", "Loading tools...".dimmed());
        return out;
    };
    if tools.is_empty() {
        let _ = writeln!(out, "    {}", "No tools registered".dimmed());
    }
    for card in tools {
        let _ = writeln!(out, "    {} {}", card.icon.glyph().cyan(), card.name.bold());
        if !card.description.is_empty() {
            let _ = writeln!(out, "        {}", card.description.dimmed());
        }
        for param in &card.parameters {
            let _ = writeln!(out, "        {}: {}", param.name, param.kind.yellow());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

/// A `█░` bar of `width` cells filled to `percent`.
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn tier_badge(tier: SkillTier) -> ColoredString {
    let label = tier.label();
    match tier {
        SkillTier::Expert => label.magenta(),
        SkillTier::Advanced => label.blue(),
        SkillTier::Intermediate => label.green(),
        SkillTier::Beginner => label.yellow(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
