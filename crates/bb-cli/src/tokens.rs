use crate::cmd::TokensArgs;
use crate::utils::read_input;
use anyhow::Context;
use bb_parser::{Lexer, Token};
use tracing::trace;

pub async fn run_tokens_command(args: TokensArgs) -> anyhow::Result<()> {
    let data = read_input(args.file.as_deref()).await?;
    let tokens = Lexer::new(&data).collect::<Vec<Token>>();
    trace!("lexed {} tokens", tokens.len());
    let output = serde_json::to_string_pretty(&tokens).context("failed to serialize tokens")?;
    println!("{output}");
    Ok(())
}
