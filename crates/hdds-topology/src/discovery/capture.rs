// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recorded discovery traffic, one JSON record per line.
//!
//! ```text
//! {"domain":0,"kind":"participant","key":"01.0f...01.c1"}
//! {"domain":0,"kind":"publication","key":"...","topic":"Square","type_name":"ShapeType","qos":{"reliability":"reliable"}}
//! {"domain":0,"kind":"subscription","key":"...","topic":"Square","state":"disposed","delay_ms":500}
//! {"domain":0,"kind":"participant_status","key":"...","process_name":"talker","hostname":"node-a"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use super::{
    BuiltinSample, EndpointData, ParticipantData, ParticipantStatusData, Sample, SampleInfo,
};
use crate::error::{Result, TopologyError};
use crate::guid::Guid;
use crate::model::{DomainId, ParticipantMetadata};
use crate::qos::EndpointQos;
use serde::Deserialize;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

/// Instance state recorded for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    #[default]
    Alive,
    Disposed,
}

/// Built-in topic a record was taken from, with its payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Participant {
        key: Guid,
    },
    Publication(EndpointRecord),
    Subscription(EndpointRecord),
    ParticipantStatus {
        key: Guid,
        #[serde(default)]
        process_name: Option<String>,
        #[serde(default)]
        hostname: Option<String>,
        #[serde(default)]
        process_id: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndpointRecord {
    pub key: Guid,
    /// Owning participant; defaults to the key's prefix.
    #[serde(default)]
    pub participant: Option<Guid>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub qos: EndpointQos,
}

/// One line of a capture.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptureRecord {
    pub domain: DomainId,
    #[serde(default)]
    pub state: RecordState,
    /// Pause before this record is injected.
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(flatten)]
    pub body: RecordBody,
}

impl CaptureRecord {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Built-in sample this record stands for.
    pub fn to_sample(&self) -> BuiltinSample {
        let info = match self.state {
            RecordState::Alive => SampleInfo::alive(),
            RecordState::Disposed => SampleInfo::disposed(),
        };

        match &self.body {
            RecordBody::Participant { key } => BuiltinSample::Participant(Sample {
                info,
                data: ParticipantData { key: *key },
            }),
            RecordBody::Publication(record) => BuiltinSample::Publication(Sample {
                info,
                data: record.to_data(),
            }),
            RecordBody::Subscription(record) => BuiltinSample::Subscription(Sample {
                info,
                data: record.to_data(),
            }),
            RecordBody::ParticipantStatus {
                key,
                process_name,
                hostname,
                process_id,
            } => BuiltinSample::ParticipantStatus(Sample {
                info,
                data: ParticipantStatusData {
                    key: *key,
                    metadata: ParticipantMetadata {
                        process_name: process_name.clone(),
                        hostname: hostname.clone(),
                        process_id: *process_id,
                    },
                },
            }),
        }
    }
}

impl EndpointRecord {
    fn to_data(&self) -> EndpointData {
        EndpointData {
            key: self.key,
            participant_key: self.participant.unwrap_or_else(|| self.key.participant()),
            topic_name: self.topic.clone(),
            type_name: self.type_name.clone(),
            qos: self.qos.clone(),
        }
    }
}

/// Parse a capture stream.
pub fn parse_capture<R: BufRead>(reader: R) -> Result<Vec<CaptureRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|e| TopologyError::Capture {
            line: index + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load a capture file.
pub fn load_capture<P: AsRef<Path>>(path: P) -> Result<Vec<CaptureRecord>> {
    let file = std::fs::File::open(path)?;
    parse_capture(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::Reliability;
    use std::io::Cursor;

    const KEY: &str = "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.02";

    #[test]
    fn test_parse_endpoint_record() {
        let text = format!(
            "# recorded on node-a\n\n{{\"domain\":3,\"kind\":\"publication\",\"key\":\"{}\",\"topic\":\"Square\",\"type_name\":\"ShapeType\",\"qos\":{{\"reliability\":\"reliable\"}},\"delay_ms\":20}}\n",
            KEY
        );
        let records = parse_capture(Cursor::new(text)).expect("parse");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.domain, 3);
        assert_eq!(record.delay(), Duration::from_millis(20));
        assert_eq!(record.state, RecordState::Alive);

        match record.to_sample() {
            BuiltinSample::Publication(sample) => {
                assert_eq!(sample.info, SampleInfo::alive());
                assert_eq!(sample.data.topic_name, "Square");
                assert_eq!(sample.data.qos.reliability, Reliability::Reliable);
                assert_eq!(sample.data.participant_key, sample.data.key.participant());
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_parse_disposed_and_status() {
        let text = format!(
            "{{\"domain\":0,\"kind\":\"subscription\",\"key\":\"{key}\",\"state\":\"disposed\"}}\n{{\"domain\":0,\"kind\":\"participant_status\",\"key\":\"{key}\",\"process_name\":\"talker\"}}\n",
            key = KEY
        );
        let records = parse_capture(Cursor::new(text)).expect("parse");
        assert_eq!(records[0].state, RecordState::Disposed);
        assert!(matches!(
            records[0].to_sample(),
            BuiltinSample::Subscription(ref s) if s.info == SampleInfo::disposed()
        ));
        match records[1].to_sample() {
            BuiltinSample::ParticipantStatus(sample) => {
                assert_eq!(sample.data.metadata.process_name.as_deref(), Some("talker"))
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "{\"domain\":0,\"kind\":\"participant\",\"key\":\"bad\"}\n";
        let err = parse_capture(Cursor::new(text)).expect_err("must fail");
        assert!(matches!(err, TopologyError::Capture { line: 1, .. }));
    }

    #[test]
    fn test_load_capture_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "{{\"domain\":1,\"kind\":\"participant\",\"key\":\"{}\"}}", KEY).expect("write");
        let records = load_capture(file.path()).expect("load");
        assert_eq!(
            records[0].body,
            RecordBody::Participant {
                key: KEY.parse().expect("guid")
            }
        );
    }
}
