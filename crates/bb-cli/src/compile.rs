use crate::cmd::CompileArgs;
use crate::utils::read_input;
use anyhow::{Context, Result};
use bb_compiler::{Compiler, CompilerOptions};
use tokio::fs;
use tracing::trace;

pub async fn run_compile_command(args: CompileArgs) -> Result<()> {
    let options = load_options(&args).await?;
    trace!("{options:#?}");

    let data = read_input(args.file.as_deref()).await?;
    let compiler = Compiler::new(options);
    if args.lines {
        for line in data.lines() {
            println!("{}", compiler.compile(line));
        }
    } else {
        println!("{}", compiler.compile(&data));
    }
    Ok(())
}

/// Options from the config file if any, overridden by commandline flags.
async fn load_options(args: &CompileArgs) -> Result<CompilerOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .await
                .context("when reading config file")?;
            CompilerOptions::from_toml_str(&data).context("invalid config")?
        }
        None => CompilerOptions::default(),
    };
    apply_flags(&mut options, args);
    Ok(options)
}

/// Flags can only turn switches on.
fn apply_flags(options: &mut CompilerOptions, args: &CompileArgs) {
    options.auto_close_unterminated_tags |= args.auto_close;
    options.ignore_unmatched_closing_tags |= args.ignore_unmatched;
    options.sort_output_attributes |= args.sort_attrs;
}

#[cfg(test)]
mod tests {
    use super::apply_flags;
    use crate::cmd::{Cli, Command};
    use bb_compiler::CompilerOptions;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from(["bbcode", "compile", "--sort-attrs"]).unwrap();
        let Command::Compile(args) = cli.command else {
            panic!("expected compile command");
        };

        let mut options =
            CompilerOptions::from_toml_str("auto-close-unterminated-tags = true").unwrap();
        apply_flags(&mut options, &args);
        assert_eq!(
            options,
            CompilerOptions {
                auto_close_unterminated_tags: true,
                ignore_unmatched_closing_tags: false,
                sort_output_attributes: true,
            }
        );
    }
}
