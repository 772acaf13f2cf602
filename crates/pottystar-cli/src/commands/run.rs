use std::io::Write;
use std::time::Duration;

use clap::Args;
use pottystar_core::timer::format_clock;
use pottystar_core::{
    Config, Database, Event, KvStore, NullOutput, Outcome, Session, SessionOptions, ToneSequencer,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;

/// How long to sleep when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

const HELP: &str = "\
keys (then Enter):
  p / Enter  start or pause
  r          reset
  1-9        pick preset interval
  c N        custom interval of N minutes (1-120)
  x          time's up now
  s          success (earn a star)
  t          try again (shorter interval)
  m          mute / unmute
  z          reset stars to zero
  ?          status
  h          this help
  q          quit";

#[derive(Args)]
pub struct RunArgs {
    /// Interval in minutes; a preset or any whole number 1-120
    #[arg(short, long)]
    minutes: Option<String>,
    /// Start counting down immediately
    #[arg(long)]
    start: bool,
    /// Never open an audio device
    #[arg(long)]
    dry_run: bool,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Toggle,
    Reset,
    Preset(usize),
    Custom(String),
    Expire,
    Success,
    TryAgain,
    Mute,
    ResetStars,
    Status,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let command = match head {
            "" | "p" => Command::Toggle,
            "r" => Command::Reset,
            "c" => Command::Custom(rest.to_string()),
            "x" => Command::Expire,
            "s" => Command::Success,
            "t" => Command::TryAgain,
            "m" => Command::Mute,
            "z" => Command::ResetStars,
            "?" => Command::Status,
            "h" => Command::Help,
            "q" => Command::Quit,
            digit => match digit.parse::<usize>() {
                Ok(n @ 1..=9) => Command::Preset(n - 1),
                _ => return None,
            },
        };
        Some(command)
    }
}

#[cfg(feature = "playback")]
fn sequencer(dry_run: bool) -> ToneSequencer {
    use pottystar_core::audio::RodioOutput;
    use pottystar_core::AudioOutput;

    if dry_run {
        return ToneSequencer::with_output(NullOutput);
    }
    ToneSequencer::new(|| {
        RodioOutput::open_default().map(|output| Box::new(output) as Box<dyn AudioOutput>)
    })
}

#[cfg(not(feature = "playback"))]
fn sequencer(dry_run: bool) -> ToneSequencer {
    if !dry_run {
        debug!("built without the playback feature, cues are silent");
    }
    ToneSequencer::with_output(NullOutput)
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut session = Session::new(SessionOptions::from(&config), sequencer(args.dry_run), db);

    if let Some(minutes) = &args.minutes {
        match minutes.trim().parse::<u32>() {
            Ok(m) if session.presets().contains(&m) => session.select_preset(m)?,
            _ => session.apply_custom(minutes)?,
        };
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(event_loop(&mut session, Renderer { json: args.json }, args.start))
}

async fn event_loop<S: KvStore>(
    session: &mut Session<S>,
    mut out: Renderer,
    autostart: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = Instant::now();

    if !out.json {
        eprintln!("{HELP}");
    }
    out.render(&[session.snapshot()]);
    if autostart {
        out.render(&session.toggle());
    }

    loop {
        let wait = session.next_deadline_in().unwrap_or(IDLE_WAIT);
        let input = tokio::select! {
            line = lines.next_line() => Some(line?),
            _ = tokio::time::sleep(wait) => None,
        };

        let now = Instant::now();
        out.render(&session.advance(now.duration_since(last)));
        last = now;

        let line = match input {
            None => continue,
            Some(None) => break,
            Some(Some(line)) => line,
        };
        match Command::parse(&line) {
            Some(Command::Quit) => break,
            Some(command) => {
                let events = apply(session, command);
                out.render(&events);
            }
            None => eprintln!("unknown key {line:?}, h for help"),
        }
    }

    out.render(&[session.snapshot()]);
    Ok(())
}

fn apply<S: KvStore>(session: &mut Session<S>, command: Command) -> Vec<Event> {
    let result = match command {
        Command::Toggle => Ok(session.toggle()),
        Command::Reset => Ok(session.reset()),
        Command::Preset(index) => match session.presets().get(index).copied() {
            Some(minutes) => session.select_preset(minutes),
            None => Ok(Vec::new()),
        },
        Command::Custom(input) => session.apply_custom(&input),
        Command::Expire => Ok(session.force_expire()),
        Command::Success => session.record_success(),
        Command::TryAgain => session.try_again(),
        Command::Mute => Ok(session.toggle_sound()),
        Command::ResetStars => Ok(session.reset_stars()),
        Command::Status => Ok(vec![session.snapshot()]),
        Command::Help => {
            eprintln!("{HELP}");
            Ok(Vec::new())
        }
        Command::Quit => Ok(Vec::new()),
    };
    result.unwrap_or_else(|e| {
        debug!(error = %e, "ignored input");
        Vec::new()
    })
}

struct Renderer {
    json: bool,
}

impl Renderer {
    fn render(&mut self, events: &[Event]) {
        for event in events {
            if self.json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => debug!(error = %e, "could not serialize event"),
                }
            } else {
                self.render_human(event);
            }
        }
        let _ = std::io::stdout().flush();
    }

    fn render_human(&self, event: &Event) {
        match event {
            Event::TimerTicked { remaining_secs, .. } => {
                print!("\r  {}  ", format_clock(*remaining_secs));
            }
            Event::TimerStarted { remaining_secs, .. } => {
                println!("\rstarted  {}", format_clock(*remaining_secs));
            }
            Event::TimerPaused { remaining_secs, .. } => {
                println!("\rpaused   {}", format_clock(*remaining_secs));
            }
            Event::TimerReset { total_secs, .. } => {
                println!("\rready    {}", format_clock(*total_secs));
            }
            Event::TimerExpired { .. } => {
                println!("\rTime's up!  [s] success  [t] try again");
            }
            Event::OutcomeRecorded {
                outcome: Outcome::Success,
                stars,
                ..
            } => {
                println!("Great job! Stars: {stars}");
            }
            Event::OutcomeRecorded {
                outcome: Outcome::TryAgain,
                next_secs,
                ..
            } => {
                println!("Let's try again in {}", format_clock(*next_secs));
            }
            Event::SoundToggled { enabled, .. } => {
                println!("sound {}", if *enabled { "on" } else { "off" });
            }
            Event::StarsReset { .. } => println!("stars reset"),
            Event::StateSnapshot {
                state,
                remaining_secs,
                selected_minutes,
                stars,
                sound_enabled,
                ..
            } => {
                println!(
                    "{:?}  {}  ({} min)  stars: {}  sound: {}",
                    state,
                    format_clock(*remaining_secs),
                    selected_minutes,
                    stars,
                    if *sound_enabled { "on" } else { "off" }
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys() {
        assert_eq!(Command::parse(""), Some(Command::Toggle));
        assert_eq!(Command::parse(" p \n"), Some(Command::Toggle));
        assert_eq!(Command::parse("3"), Some(Command::Preset(2)));
        assert_eq!(Command::parse("c 17"), Some(Command::Custom("17".into())));
        assert_eq!(Command::parse("c"), Some(Command::Custom(String::new())));
        assert_eq!(Command::parse("z"), Some(Command::ResetStars));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert_eq!(Command::parse("0"), None);
        assert_eq!(Command::parse("y"), None);
        assert_eq!(Command::parse("10"), None);
    }

    #[test]
    fn apply_ignores_invalid_custom_input() {
        let mut session = Session::new(
            SessionOptions::default(),
            ToneSequencer::with_output(NullOutput),
            pottystar_core::MemoryStore::new(),
        );
        assert!(apply(&mut session, Command::Custom("121".into())).is_empty());
        assert_eq!(session.selected_minutes(), 45);
        assert!(apply(&mut session, Command::Success).is_empty());
        assert_eq!(apply(&mut session, Command::Preset(8)), Vec::new());
    }
}
