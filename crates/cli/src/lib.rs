pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use commands::booking::SelectionArgs;
use commands::tickets::TicketFiles;
use commands::Backend;
use tripdesk_core::ReviewDecision;

#[derive(Debug, Parser)]
#[command(
    name = "tripdesk",
    about = "Tripdesk booking operator CLI",
    long_about = "Drive travel bookings through selection, manager review, ticketing and deactivation.",
    after_help = "Examples:\n  tripdesk config\n  tripdesk booking show bk-selecting-001 --demo\n  tripdesk booking select bk-selecting-001 --onward 0 --return 0 --hotel 1\n  tripdesk tickets list --page 2"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Use the in-memory backend seeded with demo bookings")]
    demo: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(subcommand, about = "Inspect and advance a single booking")]
    Booking(BookingCommand),
    #[command(subcommand, about = "Ticket issuer queue and invoice upload")]
    Tickets(TicketsCommand),
}

#[derive(Debug, Subcommand)]
enum BookingCommand {
    #[command(about = "Show a booking, its progress and option catalogs")]
    Show { id: String },
    #[command(about = "Pick options by catalog index and submit them for manager review")]
    Select {
        id: String,
        #[arg(long)]
        onward: Option<usize>,
        #[arg(long = "return")]
        return_trip: Option<usize>,
        #[arg(long)]
        hotel: Option<usize>,
    },
    #[command(about = "Approve or reject a booking awaiting manager review")]
    Review {
        id: String,
        #[command(flatten)]
        decision: DecisionArgs,
        #[arg(long, help = "Reviewer feedback (1-200 characters); defaults to a canned text")]
        feedback: Option<String>,
    },
    #[command(about = "Cancel a booking; it becomes permanently inactive")]
    Deactivate {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct DecisionArgs {
    #[arg(long)]
    approve: bool,
    #[arg(long)]
    reject: bool,
}

impl DecisionArgs {
    fn decision(&self) -> ReviewDecision {
        if self.approve {
            ReviewDecision::Approved
        } else {
            ReviewDecision::Rejected
        }
    }
}

#[derive(Debug, Subcommand)]
enum TicketsCommand {
    #[command(about = "List manager approved bookings waiting for tickets")]
    List {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    #[command(about = "Upload the three ticket files and create invoices")]
    Submit {
        id: String,
        #[arg(long)]
        onward: PathBuf,
        #[arg(long = "return")]
        return_trip: PathBuf,
        #[arg(long)]
        hotel: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let backend = if cli.demo { Backend::Demo } else { Backend::Http };

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Booking(BookingCommand::Show { id }) => commands::booking::show(&id, backend),
        Command::Booking(BookingCommand::Select { id, onward, return_trip, hotel }) => {
            commands::booking::select(&id, SelectionArgs { onward, return_trip, hotel }, backend)
        }
        Command::Booking(BookingCommand::Review { id, decision, feedback }) => {
            commands::booking::review(&id, decision.decision(), feedback.as_deref(), backend)
        }
        Command::Booking(BookingCommand::Deactivate { id, reason }) => {
            commands::booking::deactivate(&id, reason.as_deref(), backend)
        }
        Command::Tickets(TicketsCommand::List { user_id, page, size }) => {
            commands::tickets::list(user_id.as_deref(), page, size, backend)
        }
        Command::Tickets(TicketsCommand::Submit { id, onward, return_trip, hotel }) => {
            commands::tickets::submit(&id, &TicketFiles { onward, return_trip, hotel }, backend)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
