use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const QUESTION: &str = "Are you sure you want to abort these multipart uploads? (yes/no) ";

/// What to do with the uploads once they have been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Skip,
    Forced,
    Prompt,
}

impl Gate {
    pub fn new(abort: bool, force: bool) -> Self {
        match (abort, force) {
            (false, _) => Gate::Skip,
            (true, true) => Gate::Forced,
            (true, false) => Gate::Prompt,
        }
    }
}

/// Line-oriented yes/no prompt. The input is released when the prompt is
/// closed or dropped.
pub struct Prompt<R> {
    input: Option<R>,
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn new(input: R) -> Self {
        Prompt { input: Some(input) }
    }

    /// Asks `question` and waits for one line. Only an exact `yes`
    /// confirms; end of input counts as a refusal.
    pub async fn confirm<W: Write>(&mut self, out: &mut W, question: &str) -> Result<bool> {
        write!(out, "{}", question)?;
        out.flush()?;

        let input = self.input.as_mut().context("prompt is already closed")?;
        let mut answer = String::new();
        input
            .read_line(&mut answer)
            .await
            .context("failed to read answer")?;

        let answer = answer.strip_suffix('\n').unwrap_or(&answer);
        let answer = answer.strip_suffix('\r').unwrap_or(answer);

        Ok(answer == "yes")
    }

    pub fn close(&mut self) {
        if self.input.take().is_some() {
            log::debug!("confirmation prompt closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn answer(input: &str) -> bool {
        let mut prompt = Prompt::new(input.as_bytes());
        let mut out: Vec<u8> = Vec::new();

        prompt.confirm(&mut out, QUESTION).await.unwrap()
    }

    #[test]
    fn gate_follows_flags() {
        assert_eq!(Gate::new(false, false), Gate::Skip);
        assert_eq!(Gate::new(false, true), Gate::Skip);
        assert_eq!(Gate::new(true, true), Gate::Forced);
        assert_eq!(Gate::new(true, false), Gate::Prompt);
    }

    #[tokio::test]
    async fn only_exact_yes_confirms() {
        assert!(answer("yes\n").await);
        assert!(answer("yes\r\n").await);
        assert!(answer("yes").await);

        for input in ["Yes\n", "y\n", "YES\n", "\n", "", "yes please\n", " yes\n", "no\n"] {
            assert!(!answer(input).await, "{:?} should not confirm", input);
        }
    }

    #[tokio::test]
    async fn asks_the_question() {
        let mut prompt = Prompt::new("no\n".as_bytes());
        let mut out: Vec<u8> = Vec::new();
        prompt.confirm(&mut out, QUESTION).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), QUESTION);
    }

    #[tokio::test]
    async fn closed_prompt_cannot_be_asked() {
        let mut prompt = Prompt::new("yes\n".as_bytes());
        prompt.close();

        let mut out: Vec<u8> = Vec::new();
        assert!(prompt.confirm(&mut out, QUESTION).await.is_err());
    }
}
