use anyhow::Context;
use review_waiting_list::{
    ConfigError, GitHub, Mode, PersonalReminder, WriterSink, handle_message, parse_args,
};
use tracing::info;

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn exit_with_missing_settings(lines: &[String]) -> ! {
    for line in lines {
        eprintln!("{line}");
    }
    std::process::exit(1);
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = match parse_args(std::env::args_os()) {
        Ok(settings) => settings,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            }
            if let Some(ConfigError::Missing(lines)) = err.downcast_ref::<ConfigError>() {
                exit_with_missing_settings(lines);
            }
            return Err(err);
        }
    };

    let github = GitHub::new(settings.github_token, settings.api_url.as_deref())
        .context("Failed to create GitHub client")?;
    let sink = WriterSink::new(std::io::stdout());

    match settings.mode {
        Mode::Ls { message } => {
            if !handle_message(&message, &github, &sink).await? {
                anyhow::bail!("Query is empty: '{message}'");
            }
        }
        Mode::Remind {
            cron,
            mapping_file,
            once,
        } => {
            let reminder = PersonalReminder::new(&cron, mapping_file)?;
            if once {
                reminder
                    .tick(&github, &sink)
                    .await
                    .context("Reminder round failed")?;
            } else {
                info!(cron = %cron, "personal reminder started");
                reminder.run(&github, &sink).await;
            }
        }
    }

    Ok(())
}
