//! Line-based console for driving the virtual host by hand.
//!
//! Each line is `entity=value`, e.g. `binary_sensor.office_presence=on` or
//! `sensor.outdoor=4.5`. Blank lines and `#` comments are ignored.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use zoneclimate_adapter_virtual::VirtualHost;
use zoneclimate_app::ports::EventPublisher;
use zoneclimate_domain::entity::{EntityRef, StateValue};

/// Feed every command read from `input` into `host` until end of input.
pub async fn run<P, R>(host: &VirtualHost<P>, input: R)
where
    P: EventPublisher + Send + Sync,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(%err, "console input failed");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some((entity, value))) => {
                if let Err(err) = host.set_state(entity, value).await {
                    tracing::warn!(%err, "failed to change virtual state");
                }
            }
            Ok(None) => {}
            Err(reason) => tracing::warn!(line = %line, reason, "ignoring console line"),
        }
    }
    tracing::debug!("console input closed");
}

/// Parse one console line.
///
/// # Errors
///
/// Returns the reason when the line is neither empty, a comment, nor an
/// `entity=value` assignment.
pub fn parse_line(line: &str) -> Result<Option<(EntityRef, StateValue)>, &'static str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (entity, value) = line.split_once('=').ok_or("expected entity=value")?;
    let entity = entity.trim();
    if !entity.contains('.') {
        return Err("entity must look like domain.object_id");
    }
    Ok(Some((EntityRef::new(entity), StateValue::from_literal(value))))
}
