//! Special commands parser for interactive chat sessions
//!
//! This module parses the slash commands a user can enter at the chat
//! prompt instead of a question:
//! - Switch or pick the active knowledge base
//! - Show the sources behind the last answer
//! - Download the last answer's source document or a company's carbon
//!   report
//! - Clear the conversation
//! - Display help or leave the session
//!
//! Commands are prefixed with `/` and are case-insensitive, except for
//! arguments such as company names which keep their original form.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands modify the session state or query the backend,
/// rather than being sent to the knowledge base as a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch the active knowledge base
    ///
    /// `/kb <id>` selects a knowledge base directly; bare `/kb` lists
    /// the available bases and prompts for a choice.
    SelectKnowledgeBase(Option<i64>),

    /// Show the source documents behind the last answer
    Sources,

    /// Download the document behind the last answer, or a company's
    /// carbon report
    ///
    /// Bare `/download` fetches the last answer's source document and
    /// only works when exactly one document is cited; `/download
    /// <company>` fetches that company's carbon report instead.
    Download(Option<String>),

    /// Clear the conversation history
    Clear,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the knowledge base as a question.
    None,
}

/// Parse a user input string into a special command
///
/// Checks if the input matches any special command pattern.
/// Commands are case-insensitive and may have multiple aliases.
///
/// # Arguments
///
/// * `input` - The user input string to parse
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None
/// for non-commands. Returns Err(CommandError) for invalid commands or
/// invalid arguments.
///
/// # Examples
///
/// ```
/// use ibot::commands::special::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/kb 3").unwrap();
/// assert_eq!(cmd, SpecialCommand::SelectKnowledgeBase(Some(3)));
///
/// let cmd = parse_special_command("什么是碳排放?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// // Invalid command returns error
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "/sources" => Ok(SpecialCommand::Sources),

        "/clear" => Ok(SpecialCommand::Clear),

        "/kb" => Ok(SpecialCommand::SelectKnowledgeBase(None)),
        input if input.starts_with("/kb ") => {
            let arg = input[4..].trim();
            match arg.parse::<i64>() {
                Ok(id) if id > 0 => Ok(SpecialCommand::SelectKnowledgeBase(Some(id))),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/kb".to_string(),
                    arg: arg.to_string(),
                }),
            }
        }

        "/download" => Ok(SpecialCommand::Download(None)),
        input if input.starts_with("/download ") => {
            // Slice the original input so the company name keeps its case
            let company = trimmed.get(10..).unwrap_or("").trim();
            if company.is_empty() {
                Ok(SpecialCommand::Download(None))
            } else {
                Ok(SpecialCommand::Download(Some(company.to_string())))
            }
        }

        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),

        _ => {
            let command = trimmed.split_whitespace().next().unwrap_or(trimmed);
            Err(CommandError::UnknownCommand(command.to_string()))
        }
    }
}

/// Display help information for all special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
======================================

KNOWLEDGE BASE:
  /kb             - List knowledge bases and pick one
  /kb <id>        - Switch to knowledge base <id>

ANSWERS:
  /sources        - Show the source documents behind the last answer
  /clear          - Clear the conversation history

DOWNLOADS:
  /download           - Download the last answer's source document
                        (available when exactly one document is cited)
  /download <company> - Download the carbon report for a company

SESSION:
  /help           - Show this help message
  /?              - Same as /help
  exit            - Leave the chat
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Anything else is sent to the knowledge base as a question
  - Press Ctrl+C while an answer is streaming to stop it
"#
    );
}
