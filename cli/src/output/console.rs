//! Tool listings and startup progress

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mcp_chat_core::McpToolInfo;
use std::io::{self, Write};
use std::time::Duration;

/// Print one `name (description)` line per tool
pub fn print_tools<W: Write>(out: &mut W, tools: &[McpToolInfo]) -> io::Result<()> {
    for tool in tools {
        writeln!(
            out,
            "{} ({})",
            tool.name.as_str().bold(),
            tool.description.as_deref().unwrap_or_default()
        )?;
    }
    out.flush()
}

/// Spinner shown while the MCP server starts; `npx` may have to download it first
pub fn server_spinner(command_line: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Starting MCP server: {}", command_line));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
