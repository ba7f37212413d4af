use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::{self, AsyncReadExt};

/// Read the whole content of `file`, or of stdin when `file` is `None`.
///
/// # Errors
///
/// When failed to read the file or stdin, or the content is not utf-8.
pub async fn read_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .await
            .with_context(|| format!("when reading input file {path}")),
        None => {
            let mut data = String::new();
            io::stdin()
                .read_to_string(&mut data)
                .await
                .context("when reading stdin")?;
            Ok(data)
        }
    }
}
