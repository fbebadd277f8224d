use tripdesk_core::{
    ApplicationError, BookingId, BookingPhase, BookingView, Leg, RequestContext, ReviewDecision,
    StepStatus, DEFAULT_DEACTIVATION_REASON,
};

use crate::commands::{prepare, Backend, CommandResult};

/// Leg indices given on the command line; `None` keeps the current pick.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectionArgs {
    pub onward: Option<usize>,
    pub return_trip: Option<usize>,
    pub hotel: Option<usize>,
}

impl SelectionArgs {
    fn get(&self, leg: Leg) -> Option<usize> {
        match leg {
            Leg::Onward => self.onward,
            Leg::Return => self.return_trip,
            Leg::Hotel => self.hotel,
        }
    }
}

pub fn show(id: &str, backend: Backend) -> CommandResult {
    const COMMAND: &str = "booking.show";
    let app = match prepare(COMMAND, backend) {
        Ok(app) => app,
        Err(failure) => return failure,
    };
    let ctx = RequestContext::new("operator");

    match app.runtime.block_on(app.workflow.load(&BookingId(id.to_owned()), &ctx)) {
        Ok(view) => CommandResult::success(COMMAND, describe(&view)),
        Err(error) => CommandResult::from_application_error(COMMAND, error, &ctx),
    }
}

pub fn select(id: &str, picks: SelectionArgs, backend: Backend) -> CommandResult {
    const COMMAND: &str = "booking.select";
    let app = match prepare(COMMAND, backend) {
        Ok(app) => app,
        Err(failure) => return failure,
    };
    let ctx = RequestContext::new("traveler");

    let result = app.runtime.block_on(async {
        let mut view = app.workflow.load(&BookingId(id.to_owned()), &ctx).await?;
        if view.phase().is_rejected() {
            view.revise()?;
        }
        for leg in Leg::ALL {
            if let Some(index) = picks.get(leg) {
                view.selection_mut().select_index(leg, index)?;
            }
        }
        app.workflow.submit_selections(&mut view, &ctx).await?;
        Ok::<_, ApplicationError>(view)
    });

    match result {
        Ok(view) => CommandResult::success(
            COMMAND,
            format!("selections submitted for manager review\n{}", describe(&view)),
        ),
        Err(error) => CommandResult::from_application_error(COMMAND, error, &ctx),
    }
}

pub fn review(
    id: &str,
    decision: ReviewDecision,
    feedback: Option<&str>,
    backend: Backend,
) -> CommandResult {
    const COMMAND: &str = "booking.review";
    let app = match prepare(COMMAND, backend) {
        Ok(app) => app,
        Err(failure) => return failure,
    };
    let ctx = RequestContext::new("manager");
    let feedback = feedback.unwrap_or_else(|| decision.default_feedback());

    let result = app.runtime.block_on(async {
        let mut view = app.workflow.load(&BookingId(id.to_owned()), &ctx).await?;
        app.workflow.manager_review(&mut view, decision, feedback, &ctx).await?;
        Ok::<_, ApplicationError>(view)
    });

    match result {
        Ok(view) => CommandResult::success(
            COMMAND,
            format!("manager decision recorded: {}\n{}", decision.action(), describe(&view)),
        ),
        Err(error) => CommandResult::from_application_error(COMMAND, error, &ctx),
    }
}

pub fn deactivate(id: &str, reason: Option<&str>, backend: Backend) -> CommandResult {
    const COMMAND: &str = "booking.deactivate";
    let app = match prepare(COMMAND, backend) {
        Ok(app) => app,
        Err(failure) => return failure,
    };
    let ctx = RequestContext::new("traveler");
    let reason = reason.unwrap_or(DEFAULT_DEACTIVATION_REASON);

    let result = app.runtime.block_on(async {
        let mut view = app.workflow.load(&BookingId(id.to_owned()), &ctx).await?;
        app.workflow.deactivate(&mut view, reason, &ctx).await?;
        Ok::<_, ApplicationError>(view)
    });

    match result {
        Ok(view) => {
            CommandResult::success(COMMAND, format!("booking deactivated\n{}", describe(&view)))
        }
        Err(error) => CommandResult::from_application_error(COMMAND, error, &ctx),
    }
}

pub(crate) fn describe(view: &BookingView) -> String {
    let booking = view.booking();
    let status =
        booking.session_status().map(|status| status.as_str()).unwrap_or("<no session>");
    let mut lines = vec![format!(
        "booking {} to {} ({:?}, version {}): session {status}",
        booking.id, booking.destination, booking.status, booking.version
    )];

    let steps = view
        .steps()
        .iter()
        .map(|step| {
            let mark = match step.status {
                StepStatus::Completed => "x",
                StepStatus::Current => ">",
                StepStatus::Pending => " ",
            };
            format!("[{mark}] {}", step.label)
        })
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(format!("progress: {steps}"));
    if let BookingPhase::ManagerReview { decision: Some(decision) } = view.phase() {
        lines.push(format!("decision: {}", decision.action()));
    }

    for leg in Leg::ALL {
        let catalog = booking.catalog(leg);
        if catalog.is_empty() {
            lines.push(format!("- {leg}: no options offered"));
            continue;
        }
        for (index, option) in catalog.iter().enumerate() {
            let marker =
                if view.selection().selected_index(leg) == Some(index) { "*" } else { " " };
            let route = option.route_label().unwrap_or_default();
            let amount = match leg {
                Leg::Hotel => option.total_cost,
                _ => option.price,
            };
            lines.push(format!(
                "{marker} {leg}[{index}] {} {route} {}",
                option.display_name(index),
                amount.map(|amount| amount.to_string()).unwrap_or_else(|| "-".to_owned())
            ));
        }
    }

    lines.push(format!("selected total: {}", booking.total_selected_cost()));
    if let Some(feedback) = &booking.manager_feedback {
        lines.push(format!("manager feedback: {feedback}"));
    }
    if let Some(reason) = &booking.inactive_reason {
        lines.push(format!("inactive reason: {reason}"));
    }
    lines.join("\n")
}
