use crate::models::Decision;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// The human in the loop. Both calls block until an answer is given.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn decide(&self, subject: &str, sender: &str) -> Result<Decision>;

    /// Opens `url` for the user and asks whether unsubscribing worked.
    async fn confirm_link(&self, url: &str) -> Result<bool>;
}

/// Prompts on stdin/stdout and opens links in the default browser.
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn decide(&self, subject: &str, sender: &str) -> Result<Decision> {
        let text = format!(
            "Do you want to unsubscribe from this email?\n    {}: {}\n[{}] (yes): ",
            sender,
            subject,
            Decision::CHOICES.join("/")
        );
        tokio::task::spawn_blocking(move || -> Result<Decision> {
            loop {
                let answer = ask(&text)?;
                if answer.is_empty() {
                    return Ok(Decision::default());
                }
                match answer.parse::<Decision>() {
                    Ok(decision) => return Ok(decision),
                    Err(e) => println!("Error: {}", e),
                }
            }
        })
        .await
        .context("Prompt task failed")?
    }

    async fn confirm_link(&self, url: &str) -> Result<bool> {
        info!("opening browser to unsubscribe");
        if let Err(e) = open::that(url) {
            warn!("could not open browser: {}", e);
            println!("\tPlease open {}", url);
        }

        tokio::task::spawn_blocking(|| -> Result<bool> {
            loop {
                let answer = ask("\tSuccessful? [Y/n]: ")?;
                match answer.to_lowercase().as_str() {
                    "" | "y" | "yes" => return Ok(true),
                    "n" | "no" => return Ok(false),
                    _ => println!("Error: invalid input"),
                }
            }
        })
        .await
        .context("Prompt task failed")?
    }
}

fn ask(text: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read answer")?;
    if read == 0 {
        anyhow::bail!("stdin closed while waiting for an answer");
    }
    Ok(line.trim().to_string())
}
