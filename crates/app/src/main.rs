use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use quiz_core::Clock;
use quiz_core::model::{QuizKind, ResultReport, SessionState};
use services::{
    EnvCredentials, HttpQuizApi, LoadError, QuizController, ReviewError, SharedSession,
};
use storage::JsonFileStore;

#[derive(Debug)]
enum ArgsError {
    MissingSubject,
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidKind { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingSubject => write!(f, "a subject argument is required"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidKind { raw } => {
                write!(f, "invalid --type value: {raw} (expected quiz or practice)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    subject: String,
    kind: QuizKind,
    api_url: String,
    data_dir: PathBuf,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, ArgsError> {
    let mut subject = None;
    let mut kind = QuizKind::default();
    let mut api_url =
        env::var("QUIZ_API_URL").unwrap_or_else(|_| "http://localhost:4000/api".to_string());
    let mut data_dir = PathBuf::from(".quiz-results");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--type" => {
                let raw = require_value(&mut args, "--type")?;
                kind = raw.parse().map_err(|_| ArgsError::InvalidKind { raw })?;
            }
            "--api-url" => api_url = require_value(&mut args, "--api-url")?,
            "--data-dir" => data_dir = PathBuf::from(require_value(&mut args, "--data-dir")?),
            other if other.starts_with("--") => {
                return Err(ArgsError::UnknownArg(other.to_string()));
            }
            _ if subject.is_none() => subject = Some(arg.clone()),
            other => return Err(ArgsError::UnknownArg(other.to_string())),
        }
    }

    Ok(Args {
        subject: subject.ok_or(ArgsError::MissingSubject)?,
        kind,
        api_url,
        data_dir,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Blocking stdin reads on a plain thread, handed over a channel so the
/// answer loop can wait on input and the countdown at the same time.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("usage: quiz <subject> [--type quiz|practice] [--api-url URL] [--data-dir DIR]");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpQuizApi::new(args.api_url.clone(), Arc::new(EnvCredentials::new()))?;
    let store = JsonFileStore::new(args.data_dir.clone());
    let controller = QuizController::new(Clock::default(), Arc::new(api), Arc::new(store));

    let session = match controller.load_session(&args.subject, args.kind).await {
        Ok(session) => session,
        Err(LoadError::NoContent { subject, kind }) => {
            println!("No questions found for {subject} ({kind}). Try another subject.");
            return Ok(());
        }
        Err(LoadError::Api(services::ApiError::MissingToken)) => {
            println!("Not logged in: set QUIZ_API_TOKEN and try again.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    println!("{} {}", args.subject, label_for(args.kind));
    println!("  Questions: {}", session.question_set().len());
    println!("  Duration:  {}", format_time(session.total_secs()));
    println!();
    println!("Press Enter to start. The timer runs until you submit or it expires.");

    let mut input = spawn_input_reader();
    if input.recv().await.is_none() {
        return Ok(());
    }

    let mut session = session;
    controller.start(&mut session)?;
    let session: SharedSession = Arc::new(tokio::sync::Mutex::new(session));
    let clock_task = controller.spawn_clock(Arc::clone(&session));

    answer_loop(&controller, &session, &mut input).await?;
    clock_task.abort();

    let (state, report_id, failure) = {
        let guard = session.lock().await;
        (
            guard.state(),
            guard.report_id().cloned(),
            guard.failure().map(str::to_string),
        )
    };

    match state {
        SessionState::Completed => {
            if let Some(id) = report_id {
                match controller.load_report(&id).await {
                    Ok(report) => render_report(&id.to_string(), &report),
                    Err(ReviewError::NotFound) => {
                        println!("Result {id} is gone; back to quiz selection.");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        SessionState::Failed => {
            println!(
                "Submission failed: {}",
                failure.unwrap_or_else(|| "unknown error".to_string())
            );
            println!("Type 's' to retry, anything else to quit.");
            if input.recv().await.as_deref() == Some("s") {
                if let Some(id) = controller.submit_shared(&session).await? {
                    let report = controller.load_report(&id).await?;
                    render_report(&id.to_string(), &report);
                }
            }
        }
        _ => {}
    }

    Ok(())
}

async fn answer_loop(
    controller: &QuizController,
    session: &SharedSession,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        {
            let guard = session.lock().await;
            if guard.state() != SessionState::Running {
                // Terminal state reached, e.g. the countdown forced a
                // submission while we were waiting for input.
                return Ok(());
            }
            render_question(&guard);
        }

        // Poll the session state once a second so an expired timer does
        // not leave us stuck waiting for a line of input.
        let line = tokio::select! {
            line = input.recv() => match line {
                Some(line) => line,
                None => return Ok(()),
            },
            () = tokio::time::sleep(Duration::from_secs(1)) => continue,
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("n") => {
                session.lock().await.advance();
            }
            Some("p") => {
                session.lock().await.retreat();
            }
            Some("g") => {
                if let Some(index) = parts.next().and_then(|raw| raw.parse::<usize>().ok()) {
                    let mut guard = session.lock().await;
                    if index == 0 || guard.jump_to(index - 1).is_err() {
                        println!("No question {index}.");
                    }
                }
            }
            Some("c") => {
                let _ = session.lock().await.clear_answer();
            }
            Some("s") => {
                match controller.submit_shared(session).await {
                    // Report rendering happens after the loop, whether we
                    // won the race against the timer or not.
                    Ok(_) => return Ok(()),
                    Err(err) => {
                        tracing::warn!(error = %err, "manual submission failed");
                        return Ok(());
                    }
                }
            }
            Some("q") => return Ok(()),
            Some(raw) => {
                if let Ok(choice) = raw.parse::<usize>() {
                    let mut guard = session.lock().await;
                    let option = guard
                        .current_question()
                        .options()
                        .get(choice.saturating_sub(1))
                        .cloned();
                    match option {
                        Some(option) if choice >= 1 => {
                            // Ignore a selection that raced a forced
                            // submit; the loop exits on the next pass.
                            let _ = guard.select_answer(option);
                        }
                        _ => println!("No option {choice}."),
                    }
                } else {
                    println!("Commands: 1-9 select, n(ext), p(rev), g N, c(lear), s(ubmit), q(uit)");
                }
            }
        }
    }
}

fn render_question(session: &quiz_core::model::QuizSession) {
    let question = session.current_question();
    let total = session.question_set().len();
    println!();
    println!(
        "[{}] Q{}/{}  answered {}/{}",
        format_time(session.remaining_secs()),
        session.cursor() + 1,
        total,
        session.answered_count(),
        total,
    );
    println!("{}", question.prompt());
    if let Some(image) = question.image() {
        println!("  (image: {image})");
    }
    let selected = session.answer_for(question.id());
    for (i, option) in question.options().iter().enumerate() {
        let marker = if selected == Some(option.as_str()) {
            "*"
        } else {
            " "
        };
        println!(" {marker} {}. {option}", i + 1);
    }
}

fn label_for(kind: QuizKind) -> &'static str {
    match kind {
        QuizKind::Quiz => "Quiz",
        QuizKind::Practice => "Practice Paper",
    }
}

fn render_report(report_id: &str, report: &ResultReport) {
    println!();
    println!("Results for {} ({})", report.subject(), report.kind());
    println!(
        "  Score:    {}/{}  ({:.2}%)",
        report.correct_count(),
        report.total(),
        report.accuracy_percent()
    );
    println!("  Time:     {}", format_time(report.time_taken_secs()));
    println!("  Saved as: {report_id}");

    for (i, outcome) in report.outcomes().iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, outcome.prompt);
        for option in &outcome.options {
            let mark = if *option == outcome.correct_answer {
                "+"
            } else if *option == outcome.user_answer {
                "x"
            } else {
                " "
            };
            println!("  {mark} {option}");
        }
        if outcome.user_answer.is_empty() {
            println!("  (not answered)");
        }
        if !outcome.is_correct {
            println!("  Correct answer: {}", outcome.correct_answer);
        }
        if !outcome.explanation.is_empty() {
            println!("  Explanation: {}", outcome.explanation);
        }
        if let Some(url) = &outcome.video_solution_url {
            println!("  Video solution: {url}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(words: &[&str]) -> Result<Args, ArgsError> {
        parse_args(words.iter().map(|w| (*w).to_string()))
    }

    #[test]
    fn subject_and_defaults() {
        let args = parse(&["Maths"]).unwrap();
        assert_eq!(args.subject, "Maths");
        assert_eq!(args.kind, QuizKind::Quiz);
    }

    #[test]
    fn type_flag_selects_practice() {
        let args = parse(&["Maths", "--type", "practice"]).unwrap();
        assert_eq!(args.kind, QuizKind::Practice);
    }

    #[test]
    fn invalid_type_is_rejected() {
        assert!(matches!(
            parse(&["Maths", "--type", "exam"]),
            Err(ArgsError::InvalidKind { .. })
        ));
    }

    #[test]
    fn missing_subject_is_rejected() {
        assert!(matches!(parse(&[]), Err(ArgsError::MissingSubject)));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(matches!(
            parse(&["Maths", "--fast"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn time_formats_as_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(90), "01:30");
        assert_eq!(format_time(600), "10:00");
    }
}
