use anyhow::Result;
use colored::Colorize;
use doorplay_core::screen::FINISH;
use doorplay_core::{DoorStage, DoorState, DoorView, Phase, Screen};
use doorplay_experiment::ExperimentEvent;
use doorplay_timing::{Timer, sleep_with_progress};
use std::io::{self, BufRead, Write};

use crate::Session;
use crate::audio::CuePlayer;

const PROGRESS_STEPS: u32 = 20;

/// Runs the session on stdin/stdout until it finishes or input closes.
pub fn run(mut session: Session) -> Result<()> {
    let cues = CuePlayer::new(session.assets.clone(), session.config.sounds.clone());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("{}", "=== DOOR TASK ===".bright_cyan().bold());

    loop {
        cues.play_all(session.drain_cues());
        if session.is_finished() {
            break;
        }

        match session.screen() {
            Screen::Finished => break,
            Screen::Blank => poll(&mut session),
            Screen::Door(view) => match view.stage {
                DoorStage::Approach => {
                    print_door(&view);
                    prompt("[f]orward  [b]ackward  [o]pen > ")?;
                    let Some(line) = lines.next() else {
                        break;
                    };
                    match parse_command(&line?, session.current_phase().is_block()) {
                        Some(event) => {
                            session.handle_event(event);
                        }
                        None => println!("{}", "Unknown command".yellow()),
                    }
                }
                DoorStage::Revealed { .. } => {
                    print_outcome(&view);
                    if let Some(wait) = session.remaining_wait() {
                        session.timer.sleep(wait);
                    }
                    poll(&mut session);
                }
                DoorStage::Iti { .. } => {
                    if let Some(wait) = session.remaining_wait() {
                        let timer = session.timer.clone();
                        sleep_with_progress(&timer, wait, PROGRESS_STEPS, print_progress);
                        println!();
                    }
                    poll(&mut session);
                }
            },
            screen => {
                print_page(&screen);
                let label = screen.controls().first().copied().unwrap_or_default();
                prompt(&format!("[Enter] {label} > "))?;
                let Some(line) = lines.next() else {
                    break;
                };
                if let Some(event) = parse_command(&line?, session.current_phase().is_block()) {
                    session.handle_event(event);
                }
            }
        }
    }

    let summary = session.summary();
    println!(
        "{} {} doors, {} opened, {} coins",
        "Done:".green().bold(),
        summary.trials,
        summary.doors_opened,
        summary.total_coins
    );
    Ok(())
}

fn poll(session: &mut Session) {
    for event in session.update() {
        session.handle_event(event);
    }
}

/// Maps a typed command to a session event.
fn parse_command(line: &str, in_block: bool) -> Option<ExperimentEvent> {
    let command = line.trim().to_lowercase();
    if !in_block {
        return Some(ExperimentEvent::Continue);
    }
    match command.as_str() {
        "f" | "forward" | "w" => Some(ExperimentEvent::MoveForward),
        "b" | "backward" | "s" => Some(ExperimentEvent::MoveBackward),
        "o" | "open" => Some(ExperimentEvent::Confirm),
        _ => None,
    }
}

fn prompt(text: &str) -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "{}", text.bold())?;
    out.flush()
}

fn print_door(view: &DoorView) {
    let mut header = format!("Coins: {}", view.total_coins);
    if let Some((current, total)) = view.progress {
        header = format!("Trial: {current}/{total}   {header}");
    }
    if view.practice {
        header = format!("{}   {header}", "PRACTICE MODE".yellow());
    }
    println!("\n{header}");
    println!("{}", view.caption.bold());
    println!(
        "Distance {:>3} {}  (door {} px)",
        view.distance,
        distance_bar(view.distance),
        view.width_px()
    );
}

fn distance_bar(distance: u8) -> String {
    let filled = usize::from(distance.min(100)) / 5;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled))
}

fn print_outcome(view: &DoorView) {
    let Some(banner) = view.stage.banner() else {
        return;
    };
    let banner = match view.stage {
        DoorStage::Revealed {
            state: DoorState::Rewarded,
            ..
        } => banner.green().bold(),
        DoorStage::Revealed {
            state: DoorState::Punished,
            ..
        } => banner.red().bold(),
        _ => banner.yellow(),
    };
    println!("{banner}");
}

fn print_progress(done: u32, steps: u32) {
    let pct = done * 100 / steps.max(1);
    let filled = (done as usize * 30) / steps.max(1) as usize;
    print!(
        "\rInter-trial interval [{}{}] {pct:>3}%",
        "=".repeat(filled),
        " ".repeat(30 - filled)
    );
    let _ = io::stdout().flush();
}

fn print_page(screen: &Screen) {
    match screen {
        Screen::Instructions { image, caption } => {
            println!("\n{}", caption.bright_cyan().bold());
            println!("(image: {})", image.display());
        }
        Screen::Message { text, button } => {
            let text = text.trim_end();
            if *button == FINISH {
                println!("\n{}", text.green().bold());
            } else {
                println!("\n{text}");
            }
        }
        Screen::Wheel { video, award } => {
            println!("\n{}", "Prize wheel".bright_cyan().bold());
            println!("(video: {})", video.display());
            println!("You won {} extra coins!", award.to_string().green().bold());
        }
        _ => {}
    }
}
