use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod auth_store;
mod console;
mod datetime;
mod error;
mod log_command;
mod logging;
mod login_command;
mod models;
mod projects_command;
mod prompt;
mod report;
mod report_command;
mod selector;
mod teamwork;
mod time_entry;
mod whoami_command;

use auth_store::JsonAuthStore;
use console::{ConsolePresenter, ConsoleText};
use log_command::{LogArgs, LogCommand};
use login_command::{LoginCommand, LogoutCommand};
use projects_command::{ProjectsCommand, TasksCommand};
use prompt::TerminalPrompter;
use report_command::{ReportArgs, ReportCommand};
use teamwork::TeamworkClient;
use whoami_command::WhoAmICommand;

/// Teamwork.comに時間を記録し、月毎の記録時間を集計するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- login
/// $ cargo run -- log --duration 1.5
/// $ cargo run -- report --year 2024 --month 2
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        short = 'v',
        long = "verbose",
        global = true,
        parse(from_occurrences),
        help = "Increases log verbosity (-v, -vv)"
    )]
    verbose: u64,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Login to Teamwork.com
    Login,
    /// Logout from Teamwork.com
    Logout,
    /// Show the currently logged in user
    Whoami,
    /// List all projects
    Projects,
    /// List all tasks
    Tasks,
    /// Log time
    Log(LogArgs),
    /// Report logged time of a month
    Report(ReportArgs),
    /// Print the version number of teamlog
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logger(args.verbose)?;

    let client = TeamworkClient::new();
    let store = JsonAuthStore::from_env().context("Failed to locate the credentials file")?;
    let mut stdout = io::stdout();
    let mut presenter = ConsoleText::new(&mut stdout, io::stdout().is_terminal());

    match args.subcommand {
        SubCommands::Login => {
            let mut prompter = TerminalPrompter::stdio();
            let account = LoginCommand::new(&client, &store, &mut prompter)
                .run()
                .await?;
            println!("Logged in successfully as {}", account);
        }
        SubCommands::Logout => LogoutCommand.run()?,
        SubCommands::Whoami => {
            let person = WhoAmICommand::new(&client, &store).run().await?;
            presenter.show_profile(&person)?;
        }
        SubCommands::Projects => {
            let projects = ProjectsCommand::new(&client, &store).run().await?;
            presenter.show_projects(&projects)?;
        }
        SubCommands::Tasks => {
            let groups = TasksCommand::new(&client, &store).run().await?;
            presenter.show_task_groups(&groups)?;
        }
        SubCommands::Log(log_args) => {
            let mut prompter = TerminalPrompter::stdio();
            let outcome = LogCommand::new(&client, &store, &mut prompter)
                .run(log_args)
                .await?;
            presenter.show_log_outcome(&outcome)?;
        }
        SubCommands::Report(report_args) => {
            let report = ReportCommand::new(&client, &store)
                .run(report_args)
                .await?;
            presenter.show_report(&report)?;
        }
        SubCommands::Version => println!("{}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}
