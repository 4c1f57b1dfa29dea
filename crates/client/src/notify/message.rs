//! Change report emails as multipart/alternative messages.

use std::time::SystemTime;

use lettre::Message;
use lettre::message::{Mailbox, MultiPart};
use pricewatch_core::{Error, Report};

fn mailbox(address: &str) -> Result<Mailbox, Error> {
    address
        .trim()
        .parse()
        .map_err(|e| Error::NotifyFailed(format!("invalid email address '{address}': {e}")))
}

/// Build the report email with a plain-text and an HTML part.
///
/// # Errors
///
/// `NotifyFailed` when there are no recipients or an address does not parse.
pub fn build_message(report: &Report, from: &str, recipients: &[String], date: SystemTime) -> Result<Message, Error> {
    if recipients.is_empty() {
        return Err(Error::NotifyFailed("email config incomplete: no recipients".into()));
    }

    let mut builder = Message::builder().from(mailbox(from)?).subject(report.subject()).date(date);
    for recipient in recipients {
        builder = builder.to(mailbox(recipient)?);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(report.render_text(), report.render_html()))
        .map_err(|e| Error::NotifyFailed(format!("failed to build email: {e}")))
}
