//! Interactive y/n confirmation for write functions.
//!
//! ```text
//! ─── Confirm create_order (write) ───
//!    amountInDollars: 50
//!    asset: BTC
//!    side: BUY
//! Proceed? [y/n]
//! ```
//!
//! `y`/`yes` proceeds and `n`/`no` cancels (case-insensitive). Anything
//! else re-prompts. End of input cancels.
//!
//! On a terminal the prompt waits for stdin to become readable and only
//! then reads the line, so a prompt abandoned by a timeout or Ctrl-C
//! leaves nothing blocked on stdin and the next line goes to the REPL.

use crate::output::format::format_arguments;
use async_trait::async_trait;
use callgate_application::{
    ConfirmationDecision, ConfirmationError, ConfirmationPort, ConfirmationRequest,
};
use colored::Colorize;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// Interpret one line of operator input.
pub fn parse_answer(input: &str) -> Option<ConfirmationDecision> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(ConfirmationDecision::Proceed),
        "n" | "no" => Some(ConfirmationDecision::Cancel),
        _ => None,
    }
}

/// Where answers come from. `None` is end of input.
#[async_trait]
trait AnswerSource: Send {
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Non-terminal stdin (pipes and files).
struct PipedInput(Lines<BufReader<tokio::io::Stdin>>);

#[async_trait]
impl AnswerSource for PipedInput {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.0.next_line().await
    }
}

/// A descriptor read only once it is ready; dropping the wait reads nothing.
#[cfg(unix)]
struct ReadyInput<T: std::os::fd::AsRawFd>(tokio::io::unix::AsyncFd<T>);

#[cfg(unix)]
impl<T: std::os::fd::AsRawFd> ReadyInput<T> {
    fn new(inner: T) -> io::Result<Self> {
        tokio::io::unix::AsyncFd::new(inner).map(Self)
    }
}

#[cfg(unix)]
#[async_trait]
impl<T> AnswerSource for ReadyInput<T>
where
    T: std::os::fd::AsRawFd + Send + Sync,
    for<'a> &'a T: io::Read,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        use std::io::Read;

        loop {
            let mut guard = self.0.readable().await?;
            let mut buf = [0u8; 1024];
            let read = guard.try_io(|fd| {
                let mut reader = fd.get_ref();
                reader.read(&mut buf)
            });
            match read {
                Ok(Ok(0)) => return Ok(None),
                Ok(Ok(n)) => return Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned())),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
    }
}

/// Prompt until the operator gives a valid answer.
async fn read_answer(source: &mut dyn AnswerSource) -> Result<ConfirmationDecision, ConfirmationError> {
    loop {
        print!("Proceed? [y/n] ");
        let _ = io::stdout().flush();

        let line = source
            .next_line()
            .await
            .map_err(|e| ConfirmationError::IoError(e.to_string()))?;
        match line {
            None => {
                println!();
                return Ok(ConfirmationDecision::Cancel);
            }
            Some(line) => match parse_answer(&line) {
                Some(decision) => return Ok(decision),
                None => println!("Please answer y or n."),
            },
        }
    }
}

pub struct InteractiveConfirmation;

impl InteractiveConfirmation {
    pub fn new() -> Self {
        Self
    }

    fn display_request(request: &ConfirmationRequest) {
        println!();
        println!(
            "{}",
            format!(
                "─── Confirm {} ({}) ───",
                request.function_name, request.operation_type
            )
            .yellow()
            .bold()
        );
        for line in format_arguments(&request.arguments) {
            println!("   {}", line);
        }
    }

    fn input() -> Result<Box<dyn AnswerSource>, ConfirmationError> {
        #[cfg(unix)]
        {
            use std::io::IsTerminal;

            let stdin = io::stdin();
            if stdin.is_terminal() {
                let input = ReadyInput::new(stdin)
                    .map_err(|e| ConfirmationError::IoError(e.to_string()))?;
                return Ok(Box::new(input));
            }
        }
        Ok(Box::new(PipedInput(BufReader::new(tokio::io::stdin()).lines())))
    }
}

impl Default for InteractiveConfirmation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationPort for InteractiveConfirmation {
    async fn confirm(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationDecision, ConfirmationError> {
        Self::display_request(request);
        let mut input = Self::input()?;
        read_answer(input.as_mut()).await
    }
}
