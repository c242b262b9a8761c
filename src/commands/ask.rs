//! One-shot question handler
//!
//! Streams a single answer to stdout and exits. Unlike the interactive
//! session, a stream that ends in an error also fails the process so
//! scripts can detect it.

use crate::chat::stream::{SessionState, StreamingChatClient};
use crate::chat::MessageStore;
use crate::config::Config;
use crate::error::{IbotError, Result};
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Ask a single question against the configured knowledge base
pub async fn run_ask(config: Config, query: String) -> Result<()> {
    let knowledge_base_id = config.chat.knowledge_base_id.ok_or_else(|| {
        IbotError::Precondition(
            "no knowledge base selected; pass --kb or set chat.knowledge_base_id".to_string(),
        )
    })?;

    let client = StreamingChatClient::new(&config.api, &config.chat)?;
    let mut store = MessageStore::new();

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let state = client
        .send(
            &mut store,
            &query,
            knowledge_base_id,
            config.chat.top_k,
            cancel,
            |fragment| {
                print!("{}", fragment);
                let _ = std::io::stdout().flush();
            },
        )
        .await?;
    watcher.abort();
    println!();

    super::print_answer_footer(&store, state);

    if state == SessionState::Errored {
        return Err(IbotError::Transport("the answer stream ended in an error".to_string()).into());
    }
    Ok(())
}
