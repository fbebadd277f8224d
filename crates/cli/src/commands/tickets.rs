use std::fs;
use std::path::{Path, PathBuf};

use tripdesk_core::{
    ApplicationError, ApprovedBookingsQuery, BookingId, Leg, RequestContext, TicketDocument, UserId,
};

use crate::commands::{prepare, Backend, CommandResult};

/// One ticket file per leg, as given on the command line.
#[derive(Clone, Debug)]
pub struct TicketFiles {
    pub onward: PathBuf,
    pub return_trip: PathBuf,
    pub hotel: PathBuf,
}

impl TicketFiles {
    fn path(&self, leg: Leg) -> &Path {
        match leg {
            Leg::Onward => &self.onward,
            Leg::Return => &self.return_trip,
            Leg::Hotel => &self.hotel,
        }
    }
}

pub fn list(user_id: Option<&str>, page: u32, size: u32, backend: Backend) -> CommandResult {
    const COMMAND: &str = "tickets.list";
    let app = match prepare(COMMAND, backend) {
        Ok(app) => app,
        Err(failure) => return failure,
    };
    let ctx = RequestContext::new("ticket_issuer");
    let query = ApprovedBookingsQuery {
        user_id: user_id.map(|id| UserId(id.to_owned())),
        page,
        size,
    };

    let page = match app.runtime.block_on(app.workflow.list_manager_approved(&query, &ctx)) {
        Ok(page) => page,
        Err(error) => return CommandResult::from_application_error(COMMAND, error, &ctx),
    };

    let mut lines = vec![format!(
        "manager approved bookings: page {}/{} ({} total)",
        page.page,
        page.page_count().max(1),
        page.total
    )];
    for booking in &page.travel_requests {
        let traveler = booking.user.as_ref().map(|user| user.name.as_str()).unwrap_or("unknown");
        lines.push(format!(
            "- {} {traveler} to {} departing {} total {}",
            booking.id,
            booking.destination,
            booking.departure_date.format("%Y-%m-%d"),
            booking.total_selected_cost()
        ));
    }
    CommandResult::success(COMMAND, lines.join("\n"))
}

pub fn submit(id: &str, files: &TicketFiles, backend: Backend) -> CommandResult {
    const COMMAND: &str = "tickets.submit";

    let mut documents = Vec::with_capacity(Leg::ALL.len());
    for leg in Leg::ALL {
        match read_document(files.path(leg)) {
            Ok(document) => documents.push((leg, document)),
            Err(message) => {
                return CommandResult::failure(COMMAND, "validation", format!("{leg} ticket: {message}"), 4)
            }
        }
    }

    let app = match prepare(COMMAND, backend) {
        Ok(app) => app,
        Err(failure) => return failure,
    };
    let ctx = RequestContext::new("ticket_issuer");
    let booking_id = BookingId(id.to_owned());

    let result = app.runtime.block_on(async {
        let mut view = app.workflow.load(&booking_id, &ctx).await?;
        for (leg, document) in documents {
            app.workflow.stage_ticket(&booking_id, leg, Some(document));
        }
        let receipt = app.workflow.submit_tickets(&mut view, &ctx).await?;
        Ok::<_, ApplicationError>((view, receipt))
    });

    match result {
        Ok((view, receipt)) => {
            let invoices = receipt
                .invoices
                .iter()
                .map(|invoice| format!("- {:?} {} ({})", invoice.category, invoice.amount, invoice.file_path))
                .collect::<Vec<_>>()
                .join("\n");
            let status = view.booking().session_status().map(|status| status.as_str()).unwrap_or("unknown");
            CommandResult::success(
                COMMAND,
                format!(
                    "uploaded {} ticket files; session {status}\n{invoices}",
                    receipt.uploaded_count
                ),
            )
        }
        Err(error) => CommandResult::from_application_error(COMMAND, error, &ctx),
    }
}

fn read_document(path: &Path) -> Result<TicketDocument, String> {
    let bytes = fs::read(path).map_err(|error| format!("cannot read `{}`: {error}", path.display()))?;
    if bytes.is_empty() {
        return Err(format!("`{}` is empty", path.display()));
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ticket".to_owned());
    Ok(TicketDocument::new(file_name, bytes))
}
