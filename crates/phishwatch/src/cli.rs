//! Command-line parsing.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the status panel from the cache.
    Status,
    /// Fetch now and print the panel.
    Refresh,
    /// Empty the cache.
    Clear,
    /// Probe the API directly.
    TestApi,
    /// Print the detail report for one email.
    Show { email_id: String },
    /// Annotate a JSON row dump with cached verdicts.
    Annotate { rows: PathBuf },
    /// Poll on the timer until interrupted.
    Watch { rows: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub command: Command,
}

pub fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut config: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            value => positional.push(value.to_string()),
        }
        idx += 1;
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("status") => Command::Status,
        Some("refresh") => Command::Refresh,
        Some("clear") => Command::Clear,
        Some("test-api") => Command::TestApi,
        Some("show") => Command::Show {
            email_id: positional
                .next()
                .ok_or_else(|| "show requires an email id".to_string())?,
        },
        Some("annotate") => Command::Annotate {
            rows: positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| "annotate requires a rows file".to_string())?,
        },
        Some("watch") => Command::Watch {
            rows: positional.next().map(PathBuf::from),
        },
        Some(other) => return Err(format!("Unknown command: {other}\n\n{}", help_text())),
    };

    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }

    Ok(Some(CliOptions { config, command }))
}

pub fn help_text() -> String {
    [
        "phishwatch",
        "",
        "Usage:",
        "  phishwatch [--config <settings.json>] <command>",
        "",
        "Commands:",
        "  status               Show cached status (default)",
        "  refresh              Fetch from the API now",
        "  clear                Clear the cache",
        "  test-api             Check the API connection",
        "  show <email_id>      Show details for one email",
        "  annotate <rows.json> Mark inbox rows with cached verdicts",
        "  watch [rows.json]    Poll until interrupted",
    ]
    .join("\n")
}
