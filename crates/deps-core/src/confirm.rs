//! Confirmation step before installing unsatisfied dependencies

use crate::dependency::Dependency;
use crate::request::DependencyRequest;
use crate::ui::UserInterface;

pub const CONFIRM_TITLE: &str = "Install Required Packages";

/// What the confirmation step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Declined,
    /// No prompt strategy and no user action: never install unasked
    Unavailable,
}

/// Comma-joined package names.
pub fn describe_packages(dependencies: &[Dependency]) -> String {
    dependencies
        .iter()
        .map(|d| d.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Body of the default confirmation dialog.
pub fn confirmation_message(user_action: &str, dependencies: &[Dependency]) -> String {
    let body = match dependencies {
        [single] => format!(
            "requires an updated version of the {} package.\n\n\
             Do you want to install this package now?",
            single.name
        ),
        _ => format!(
            "requires updated versions of the following packages: {}.\n\n\
             Do you want to install these packages now?",
            describe_packages(dependencies)
        ),
    };
    format!("{} {}", user_action, body)
}

/// Ask whether `unsatisfied` should be installed for `request`.
///
/// A custom prompt strategy takes precedence; otherwise the default dialog
/// is shown only when the request carries a user action.
pub async fn confirm(
    request: &DependencyRequest,
    unsatisfied: &[Dependency],
    ui: &dyn UserInterface,
) -> Decision {
    let accepted = if let Some(prompt) = &request.prompt {
        prompt.prompt(&describe_packages(unsatisfied)).await
    } else if let Some(action) = request.action() {
        ui.confirm(CONFIRM_TITLE, &confirmation_message(action, unsatisfied))
            .await
    } else {
        tracing::debug!("No prompt or user action; skipping installation");
        return Decision::Unavailable;
    };

    if accepted {
        Decision::Accepted
    } else {
        Decision::Declined
    }
}
