use crate::driver::Driver;
use crate::executor::{CommandExecutor, ExecutionResult, ExecutorError};
use crate::judge::Judge;
use crate::loading::LoadingClassifier;
use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct FileOptions {
    pub stop_on_error: bool,
    /// Treat a negative verification like an error.
    pub fail_on_verification: bool,
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    pub exit_commands: &'a [&'a str],
}

/// Summary of a script run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
}

async fn execute_line<D, J, C>(
    driver: &D,
    executor: &mut CommandExecutor<J, C>,
    line: &str,
) -> Result<ExecutionResult, String>
where
    D: Driver + ?Sized,
    J: Judge,
    C: LoadingClassifier,
{
    executor
        .execute_line(driver, line)
        .await
        .map_err(|e| describe_error(&e))
}

fn describe_error(err: &ExecutorError) -> String {
    match err.hint() {
        Some(hint) => format!("{} (hint: {})", err, hint),
        None => err.to_string(),
    }
}

/// Run every non-empty, non-comment line of a script file.
pub async fn run_file<D, J, C>(
    driver: &D,
    executor: &mut CommandExecutor<J, C>,
    output: OutputHandlers,
    path: &str,
    options: FileOptions,
) -> Result<RunSummary, Box<dyn Error>>
where
    D: Driver + ?Sized,
    J: Judge,
    C: LoadingClassifier,
{
    let content = tokio::fs::read_to_string(path).await?;
    let mut summary = RunSummary::default();

    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        summary.executed += 1;

        let failure = match execute_line(driver, executor, trimmed).await {
            Ok(result) if result.success => {
                (output.out)(&result.output);
                None
            }
            Ok(result) => {
                (output.out)(&result.output);
                options.fail_on_verification.then_some(result.output)
            }
            Err(err) => {
                (output.err)(&format!("Error on line {} '{}': {}", number + 1, trimmed, err));
                Some(err)
            }
        };

        if let Some(reason) = failure {
            summary.failed += 1;
            if options.stop_on_error {
                return Err(io::Error::other(reason).into());
            }
        }
    }
    Ok(summary)
}

enum ReadLineResult {
    Input(String),
    Skip,
    Exit,
    Error(io::Error),
}

fn classify_line(result: Result<Option<String>, io::Error>, exit_commands: &[&str]) -> ReadLineResult {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim().to_string();
            if trimmed.is_empty() {
                ReadLineResult::Skip
            } else if exit_commands.contains(&trimmed.as_str()) {
                ReadLineResult::Exit
            } else {
                ReadLineResult::Input(trimmed)
            }
        }
        Ok(None) => ReadLineResult::Exit,
        Err(e) => ReadLineResult::Error(e),
    }
}

pub async fn run_repl<D, J, C>(
    driver: &D,
    executor: &mut CommandExecutor<J, C>,
    output: OutputHandlers,
    options: ReplOptions<'_>,
) -> Result<(), Box<dyn Error>>
where
    D: Driver + ?Sized,
    J: Judge,
    C: LoadingClassifier,
{
    for line in options.banner_lines {
        (output.out)(line);
    }

    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{}", options.prompt);
        stdout.flush()?;

        let next = tokio::select! {
            line = reader.next_line() => classify_line(line, options.exit_commands),
            _ = tokio::signal::ctrl_c() => ReadLineResult::Exit,
        };

        match next {
            ReadLineResult::Input(line) => match execute_line(driver, executor, &line).await {
                Ok(result) => (output.out)(&result.output),
                Err(err) => (output.err)(&format!("Error: {}", err)),
            },
            ReadLineResult::Skip => continue,
            ReadLineResult::Exit => break,
            ReadLineResult::Error(e) => return Err(e.into()),
        }
    }
    Ok(())
}
