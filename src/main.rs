//! `pushjob` binary: the `post-receive` hook (no arguments) or a job's worker (`pushjob <job id>`).

use std::{env, io, path::PathBuf};

use clap::Parser;
use pushjob::{git::r#impl::LocalClient,
              job::{exec::r#impl::ProcessExecutor, receive::Receiver, worker::Worker, Id},
              report::Reporter,
              settings::Settings};

/// git push to run a command
#[derive(Debug, Parser)]
#[command(name = "pushjob", version)]
struct Args {
  /// Canonical repository (defaults to the repository whose hooks directory holds this executable)
  #[arg(long, value_name = "DIR")]
  repo: Option<PathBuf>,

  /// Run this job. Without it, act as the post-receive hook and read ref updates from stdin
  job_id: Option<String>,
}

/// Entry point
#[tokio::main]
async fn main() {
  dotenv::dotenv().ok();
  init_logger();

  let args = Args::parse();

  if let Err(e) = run(args).await {
    log::error!("{}", e);
    Reporter::stdout(false).err(format!("pushjob failed: {}", e));
    std::process::exit(1);
  }
}

async fn run(args: Args) -> pushjob::Result<()> {
  let settings = Settings::from_env(args.repo)?;
  let report = Reporter::stdout(settings.verbose);
  let git = LocalClient::new(&settings);

  match args.job_id {
    | None => {
      let executor = ProcessExecutor::current(git.url())?;
      let receiver = Receiver::new(&settings, &git, &executor, report);

      let outcome = receiver.receive_from(io::stdin().lock())?;
      log::info!("{:?}", outcome);
    },
    | Some(id) => {
      let id = id.parse::<Id>()?;
      let exit = Worker::new(&git, report).run(&id).await?;
      log::info!("job {} exited with {}", id, exit.code());
    },
  }

  Ok(())
}

fn init_logger() {
  // the hook's stderr is relayed to whoever pushed, keep it quiet unless asked
  if env::var_os("RUST_LOG").is_none() {
    env::set_var("RUST_LOG", "pushjob=warn");
  }

  pretty_env_logger::init();
}
