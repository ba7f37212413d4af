use crate::compile::run_compile_command;
use crate::tokens::run_tokens_command;
use anyhow::Result;
use clap::ArgAction;
use clap::{Args, Parser, Subcommand};

///////// Args /////////

#[derive(Clone, Debug, Args)]
pub struct CompileArgs {
    #[arg(help = "File to compile. Read from stdin when absent")]
    pub file: Option<String>,

    #[arg(
        long = "lines",
        help = "Compile each line on its own instead of the whole input at once",
        action = ArgAction::SetTrue,
    )]
    pub lines: bool,

    #[arg(
        short = 'c',
        long = "config",
        help = "Path to toml file holding compiler options. Flags override it"
    )]
    pub config: Option<String>,

    #[arg(
        long = "auto-close",
        help = "Render tags that are never closed as if closed at the end of their parent",
        action = ArgAction::SetTrue,
    )]
    pub auto_close: bool,

    #[arg(
        long = "ignore-unmatched",
        help = "Drop closing tags that have no opening partner",
        action = ArgAction::SetTrue,
    )]
    pub ignore_unmatched: bool,

    #[arg(
        long = "sort-attrs",
        help = "Sort attributes of html elements by name",
        action = ArgAction::SetTrue,
    )]
    pub sort_attrs: bool,
}

#[derive(Clone, Debug, Args)]
pub struct TokensArgs {
    #[arg(help = "File to lex. Read from stdin when absent")]
    pub file: Option<String>,
}

///////// Subcommand /////////

#[derive(Clone, Debug, Parser)]
#[command(name = "bbcode", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    #[command(about = "compile bbcode to html")]
    Compile(CompileArgs),

    #[command(about = "print the tokens of bbcode as json")]
    Tokens(TokensArgs),
}

/// Main entry of all subcommands.
pub async fn run_command_with_args(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile(compile_args) => run_compile_command(compile_args).await,
        Command::Tokens(tokens_args) => run_tokens_command(tokens_args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_flags() {
        let cli = Cli::try_parse_from([
            "bbcode",
            "compile",
            "post.txt",
            "--lines",
            "--auto-close",
            "-c",
            "bbcode.toml",
        ])
        .unwrap();
        let Command::Compile(args) = cli.command else {
            panic!("expected compile command");
        };
        assert_eq!(args.file.as_deref(), Some("post.txt"));
        assert_eq!(args.config.as_deref(), Some("bbcode.toml"));
        assert!(args.lines);
        assert!(args.auto_close);
        assert!(!args.ignore_unmatched);
        assert!(!args.sort_attrs);
    }

    #[test]
    fn tokens_from_stdin() {
        let cli = Cli::try_parse_from(["bbcode", "tokens"]).unwrap();
        assert!(matches!(cli.command, Command::Tokens(args) if args.file.is_none()));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["bbcode", "compile", "--strict"]).is_err());
    }
}
