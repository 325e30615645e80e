use std::io::{self, BufRead, Write};

/// Source of the user's answers to confirmation questions.
pub trait Confirm {
    /// Ask before an action is sent.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Ask whether to resend after a failure.
    fn retry(&mut self, error: &str) -> io::Result<bool>;
}

/// Interactive `[y/N]` prompts on stdin/stdout.
pub struct StdinConfirm;

impl StdinConfirm {
    fn ask(question: &str) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{question} [y/N] ")?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(is_yes(&line))
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        Self::ask(question)
    }

    fn retry(&mut self, error: &str) -> io::Result<bool> {
        Self::ask(&format!("{error}. Retry?"))
    }
}

/// `--yes`: confirms up front, never retries.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(true)
    }

    fn retry(&mut self, _error: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Anything starting with `y`, case-insensitive. Empty means no.
pub fn is_yes(answer: &str) -> bool {
    answer
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}
