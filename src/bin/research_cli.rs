//! Interactive research loop on stdin/stdout; offers to mail the result
//! when SMTP is configured. `--check-email` only tests the SMTP login.

use anyhow::Result;
use research_assistant::bootstrap::Runtime;
use research_assistant::research::format_results_for_email;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

async fn check_email(runtime: &Runtime) -> Result<()> {
    let Some(mailer) = runtime.mailer.as_ref() else {
        println!("Email credentials not found; set SENDER_EMAIL and SENDER_PASSWORD.");
        return Ok(());
    };
    match mailer.check_connection().await {
        Ok(true) => println!("SMTP login successful."),
        Ok(false) => println!("SMTP server did not accept the session."),
        Err(e) => println!("SMTP connection failed: {e:#}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let runtime = Runtime::from_env()?;
    if std::env::args().skip(1).any(|a| a == "--check-email") {
        return check_email(&runtime).await;
    }
    if runtime.researcher.news().config().gnews_api_key.is_none() {
        println!("\nNote: GNEWS_API_KEY not set. News comes from RSS feeds only, with no search fallback.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(query) = prompt(&mut lines, "\nWhat can I help you research? (type 'exit' to quit) ").await? else {
            break;
        };
        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            println!("Goodbye!");
            break;
        }
        if query.is_empty() {
            println!("Please enter a topic to research.");
            continue;
        }

        println!("\nResearching...");
        let result = runtime.researcher.research(&query).await;
        println!("\n{result}");

        let Some(mailer) = runtime.mailer.as_ref() else {
            continue;
        };
        if result.is_error() {
            continue;
        }
        let answer = prompt(&mut lines, "\nEmail these results? (y/n) ").await?.unwrap_or_default();
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            continue;
        }
        let recipient = prompt(&mut lines, "Recipient address: ").await?.unwrap_or_default();
        if !recipient.contains('@') {
            println!("Not an email address; skipping.");
            continue;
        }
        let (subject, body) = format_results_for_email(&result);
        if mailer.send(&recipient, &subject, &body).await {
            println!("Sent to {recipient}.");
        } else {
            println!("Sending failed; see logs.");
        }
    }
    Ok(())
}
