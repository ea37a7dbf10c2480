//! Default command: tool listing, echo check, single prompt, then a chat loop

use super::connect_server;
use crate::config::CliConfigLoader;
use crate::output::print_tools;
use anyhow::{Context, Result};
use mcp_chat_core::error::McpError;
use mcp_chat_core::llm::LlmMessage;
use mcp_chat_core::{
    Conversation, Error, FunctionInvokingClient, OpenAiClient, ToolExecutor, ToolProvider,
};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const ECHO_TOOL: &str = "echo";
const ECHO_MESSAGE: &str = "Hello MCP!";
const SINGLE_SHOT_PROMPT: &str = "Hello can you echo Hellow World";
const PROMPT: &str = "Q: ";

/// Exit status after a second Ctrl-C
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Run the full demo against the configured server and model
pub async fn chat_command(config_loader: CliConfigLoader) -> Result<()> {
    let config = config_loader.load().await?;
    let client = Arc::new(connect_server(&config).await?);

    let tools = client.list_tools().await?;
    print_tools(&mut io::stdout().lock(), &tools)?;

    let echoed = client
        .call_tool(ECHO_TOOL, json!({ "message": ECHO_MESSAGE }))
        .await?;
    let text = echoed.first_text().ok_or_else(|| McpError::NoTextContent {
        tool: ECHO_TOOL.to_string(),
    })?;
    println!("{}", text);

    let mut executor = ToolExecutor::new();
    let registered = client.register_functions(&mut executor).await?;
    info!("Exposing {} MCP tools to {}", registered, config.llm.model);

    let llm = OpenAiClient::new(&config.llm).context("Failed to create chat client")?;
    let chat = FunctionInvokingClient::new(Arc::new(llm), executor);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let prompt = [LlmMessage::user(SINGLE_SHOT_PROMPT)];
    let single_shot = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        response = chat.get_response(&prompt) => Some(response),
    };
    let outcome = match single_shot {
        Some(Ok(response)) => {
            println!("{}", response.message.get_text().unwrap_or_default());
            match spawn_line_reader(io::BufReader::new(io::stdin())) {
                Ok(lines) => run_conversation(&chat, lines, &mut io::stdout(), &cancel).await,
                Err(e) => Err(e).context("Failed to start the input reader"),
            }
        }
        Some(Err(e)) => Err(e.into()),
        None => Ok(Conversation::new()),
    };

    // The registered functions hold the last other references to the client
    drop(chat);
    match Arc::try_unwrap(client) {
        Ok(client) => client.shutdown().await,
        Err(_) => warn!("MCP client still in use; leaving it to stop on drop"),
    }

    let conversation = outcome?;
    debug!("Conversation ended with {} messages", conversation.len());
    Ok(())
}

/// First Ctrl-C cancels `cancel`; a second one exits the process immediately
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        debug!("Ctrl-C received");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
}

/// Lines of `input`, read on a detached thread.
///
/// A read still blocked on that thread never holds up runtime shutdown. The
/// channel closes at EOF or after the first read error.
fn spawn_line_reader<R>(input: R) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in input.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Read questions from `lines` until EOF or cancellation, streaming each answer to `out`.
///
/// Each line is sent exactly as typed, without its line terminator. Empty
/// lines are skipped. Every answered
/// question adds the user turn and the streamed assistant text to the
/// returned log, including text written before a tool call. A question
/// interrupted by cancellation is not recorded.
pub(crate) async fn run_conversation<W>(
    chat: &FunctionInvokingClient,
    mut lines: mpsc::Receiver<io::Result<String>>,
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<Conversation>
where
    W: Write,
{
    let mut conversation = Conversation::new();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                writeln!(out)?;
                break;
            }
            read = lines.recv() => read,
        };
        let question = match read {
            Some(line) => line.context("Failed to read input")?,
            None => {
                writeln!(out)?;
                break;
            }
        };
        if question.is_empty() {
            continue;
        }

        let mut request = conversation.messages().to_vec();
        request.push(LlmMessage::user(question.as_str()));

        let mut answer = String::new();
        let mut write_error: Option<io::Error> = None;
        let streamed = chat
            .get_streaming_response(&request, cancel, |delta| {
                answer.push_str(delta);
                if write_error.is_none() {
                    if let Err(e) = write!(out, "{}", delta).and_then(|_| out.flush()) {
                        write_error = Some(e);
                    }
                }
            })
            .await;

        match streamed {
            Ok(_) => {}
            Err(Error::Cancelled) => {
                writeln!(out)?;
                break;
            }
            Err(e) => return Err(e.into()),
        }
        if let Some(e) = write_error {
            return Err(e).context("Failed to write response");
        }
        writeln!(out)?;

        conversation.push_user(question);
        conversation.push_assistant(answer);
    }

    Ok(conversation)
}
