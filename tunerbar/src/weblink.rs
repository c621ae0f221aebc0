//! Web program-detail links expanded from URL templates.

use tunerbar_protocol::{ProgramEvent, RecordedFile};
use url::Url;

use crate::error::{AppError, Result};

/// Expand `{ONID}`, `{TSID}`, `{SID}` and `{EID}` for a program.
pub fn event_url(template: &str, event: &ProgramEvent) -> Result<Url> {
    let raw = template
        .replace("{ONID}", &event.onid.to_string())
        .replace("{TSID}", &event.tsid.to_string())
        .replace("{SID}", &event.sid.to_string())
        .replace("{EID}", &event.event_id.to_string());
    parse(raw)
}

/// Expand `{RecID}` for a recorded file.
pub fn recorded_url(template: &str, file: &RecordedFile) -> Result<Url> {
    parse(template.replace("{RecID}", &file.id.to_string()))
}

fn parse(raw: String) -> Result<Url> {
    Url::parse(&raw).map_err(|source| AppError::InvalidWebLink { url: raw, source })
}
