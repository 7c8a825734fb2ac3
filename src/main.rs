use aiconnect::messages::Role;
use aiconnect::session::{SessionConfig, SessionController};
use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aiconnect=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AIConnect assistant");

    let config = SessionConfig::from_env();
    let mut controller = SessionController::new(config)?;

    println!("AIConnect -- type a message and press Enter.");
    println!("Commands: /play <n> toggles audio for message n, /quit exits.\n");

    let stdin = io::stdin();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break; // EOF
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "/quit" || trimmed == "/exit" {
            break;
        }
        if let Some(arg) = trimmed.strip_prefix("/play") {
            match arg.trim().parse::<usize>() {
                Ok(index) => {
                    if !controller.toggle_audio_at(index) {
                        println!("No audio for message {}\n", index);
                    }
                }
                Err(_) => println!("Usage: /play <message number>\n"),
            }
            continue;
        }

        let before = controller.messages().len();
        controller.submit(trimmed);
        wait_for_turn(&mut controller);

        if let Some(error) = controller.take_last_error() {
            info!("Turn ended with error: {}", error);
            println!("({})\n", error.user_message());
        }

        for (index, message) in controller.messages().iter().enumerate().skip(before + 1) {
            if message.role == Role::Assistant {
                if message.has_audio() {
                    println!("assistant> {}  [/play {} for audio]\n", message.content, index);
                } else {
                    println!("assistant> {}\n", message.content);
                }
            }
        }
    }

    println!("Goodbye!");
    controller.shutdown();

    Ok(())
}

/// Poll the controller until the current turn settles or times out
fn wait_for_turn(controller: &mut SessionController) {
    let deadline = Instant::now() + Duration::from_secs(120);
    let mut shown_thinking = false;
    let mut shown_audio = false;

    loop {
        controller.poll_events();

        if !controller.is_awaiting_completion() && !controller.is_awaiting_synthesis() {
            break;
        }
        if Instant::now() >= deadline {
            println!("(timed out waiting for a reply)\n");
            break;
        }

        if controller.is_awaiting_completion() && !shown_thinking {
            println!("AI is thinking...");
            shown_thinking = true;
        }
        if controller.is_awaiting_synthesis() && !shown_audio {
            println!("Generating audio...");
            shown_audio = true;
        }

        std::thread::sleep(Duration::from_millis(25));
    }
}
