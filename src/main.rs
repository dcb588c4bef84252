use clap::Parser;
use session_history::app::script::{parse_script, run_script, ScriptError};
use session_history::app::Session;
use session_history::frame::CachePolicy;
use session_history::history::HistorySettings;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "session-history")]
#[command(about = "Replay a scripted multi-frame browsing session against the back/forward list")]
struct Args {
    /// Script to run (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Unique name of the top frame
    #[arg(long = "top", default_value = "top")]
    top: String,

    /// Maximum number of back/forward entries to keep
    #[arg(long = "max-entries")]
    max_entries: Option<usize>,

    /// Cache policy for history loads: protocol, reload, else-load, dont-load
    #[arg(long = "cache-policy", default_value = "else-load", value_parser = parse_cache_policy)]
    cache_policy: CachePolicy,

    /// Skip the final dump of the back/forward list
    #[arg(long = "quiet", default_value_t = false, action = clap::ArgAction::SetTrue)]
    quiet: bool,
}

fn parse_cache_policy(name: &str) -> Result<CachePolicy, String> {
    CachePolicy::from_name(name).ok_or_else(|| format!("unknown cache policy `{}`", name))
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), ScriptError> {
    let text = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let script = parse_script(&text)?;
    log::info!("Running {} commands", script.len());

    let settings = HistorySettings {
        max_entries: args.max_entries,
        traversal_cache_policy: args.cache_policy,
    };
    let session = Session::new(&args.top, settings);

    {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        run_script(&session, &script, &mut out)?;
    }

    // Finish whatever traversal the script left in flight.
    let loads = session.settle();
    if loads > 0 {
        log::info!("Completed {} outstanding history loads", loads);
    }

    if !args.quiet {
        print!("{}", session.describe());
    }
    Ok(())
}
