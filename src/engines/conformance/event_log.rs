use crate::error::{CounterfactualError, Result};
use chrono::{DateTime, Duration, Utc};
use polars::prelude::*;

/// Label rendered for the padding activity `"0"`
pub const PADDING_ACTIVITY: &str = "other";
/// Label every synthetic trace carries
pub const TRACE_LABEL: &str = "false";
/// 2011-01-01T00:00:00Z, first synthetic timestamp
const LOG_START_SECS: i64 = 1_293_840_000;

pub const CASE_COLUMN: &str = "case:concept:name";
pub const ACTIVITY_COLUMN: &str = "concept:name";
pub const TIMESTAMP_COLUMN: &str = "time:timestamp";
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub activity: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub case_id: String,
    pub label: String,
    pub events: Vec<Event>,
}

impl Trace {
    /// 0-based position of the first event with this activity
    pub fn position_of(&self, activity: &str) -> Option<usize> {
        self.events.iter().position(|e| e.activity == activity)
    }

    pub fn activities(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.activity.as_str())
    }
}

/// Synthetic process log built from decoded activity sequences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    traces: Vec<Trace>,
}

impl EventLog {
    /// One trace per sequence, case ids `"1".."N"` in input order, hourly
    /// timestamps increasing across the whole log.
    pub fn from_sequences(sequences: &[Vec<String>]) -> Result<Self> {
        let start = DateTime::<Utc>::from_timestamp(LOG_START_SECS, 0).ok_or_else(|| {
            CounterfactualError::Conformance(format!("Invalid log start timestamp: {}", LOG_START_SECS))
        })?;

        let mut hour = 0i64;
        let traces = sequences
            .iter()
            .enumerate()
            .map(|(i, sequence)| {
                let events = sequence
                    .iter()
                    .map(|activity| {
                        let event = Event {
                            activity: render_activity(activity),
                            timestamp: start + Duration::hours(hour),
                        };
                        hour += 1;
                        event
                    })
                    .collect();
                Trace {
                    case_id: (i + 1).to_string(),
                    label: TRACE_LABEL.to_string(),
                    events,
                }
            })
            .collect();

        Ok(Self { traces })
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn num_events(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }

    /// Long-format frame, one row per event
    pub fn to_frame(&self) -> Result<DataFrame> {
        let n = self.num_events();
        let mut cases = Vec::with_capacity(n);
        let mut activities = Vec::with_capacity(n);
        let mut timestamps = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);

        for trace in &self.traces {
            for event in &trace.events {
                cases.push(trace.case_id.as_str());
                activities.push(event.activity.as_str());
                timestamps.push(event.timestamp.timestamp_millis());
                labels.push(trace.label.as_str());
            }
        }

        let time = Column::new(TIMESTAMP_COLUMN.into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let df = DataFrame::new(vec![
            Column::new(CASE_COLUMN.into(), cases),
            Column::new(ACTIVITY_COLUMN.into(), activities),
            time,
            Column::new(LABEL_COLUMN.into(), labels),
        ])?;
        Ok(df)
    }
}

fn render_activity(label: &str) -> String {
    if label == "0" {
        PADDING_ACTIVITY.to_string()
    } else {
        label.to_string()
    }
}
