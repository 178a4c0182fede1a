use std::time::Instant;

use tokio::task;

use super::{ScenarioReport, pump};
use crate::config::ScenarioSettings;
use crate::error::Result;
use crate::reader::ReaderKind;
use crate::workload::{DurationGate, SyntheticCounter, SyntheticSource};

pub(super) async fn flat_rate(
    reader: ReaderKind,
    settings: &ScenarioSettings,
    counter: &SyntheticCounter,
) -> Result<ScenarioReport> {
    let payload = settings.payload_bytes;
    let buffer_size = settings.buffer_size;
    let limit = settings.flat_rate_limit();
    let source = SyntheticSource::new(payload, counter.clone());

    task::spawn_blocking(move || -> Result<ScenarioReport> {
        let mut limited = reader.wrap(Box::new(source), buffer_size, limit);
        let started = Instant::now();
        let bytes = pump(&mut limited, buffer_size, None)?;
        Ok(ScenarioReport::bounded(bytes, payload, started.elapsed()))
    })
    .await?
}

pub(super) async fn unbounded(
    reader: ReaderKind,
    settings: &ScenarioSettings,
    counter: &SyntheticCounter,
) -> Result<ScenarioReport> {
    let buffer_size = settings.buffer_size;
    let gate = DurationGate::new(settings.unbounded_duration);
    let source = SyntheticSource::unbounded(counter.clone());

    task::spawn_blocking(move || -> Result<ScenarioReport> {
        let mut limited = reader.wrap(Box::new(source), buffer_size, u64::MAX);
        let started = Instant::now();
        gate.start_at(started);
        let bytes = pump(&mut limited, buffer_size, Some(&gate))?;
        Ok(ScenarioReport::timed(bytes, started.elapsed()))
    })
    .await?
}
