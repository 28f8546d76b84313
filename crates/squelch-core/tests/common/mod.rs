#![allow(dead_code)]

use bytes::Bytes;
use tenvis_squelch_core::capability::Session;
use tenvis_squelch_core::{
    ActorId, AuditLog, AudioTransport, ChannelDescriptor, ChannelRegistry, LogImpact, LogType,
    RadioRouter, ReplayRecorder, RouterConfig, SessionTransport,
};
use squelch_protocol::ChatRecord;
use std::sync::{Arc, Mutex};

/// Records every collaborator call the router makes.
#[derive(Default)]
pub struct Recorder {
    pub pushes: Mutex<Vec<(ActorId, String, Bytes)>>,
    pub sounds: Mutex<Vec<(String, Vec<ActorId>, f32)>>,
    pub audits: Mutex<Vec<(LogType, LogImpact, String)>>,
    pub replays: Mutex<Vec<ChatRecord>>,
}

impl Recorder {
    pub fn audit_lines(&self) -> Vec<String> {
        self.audits
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, text)| text.clone())
            .collect()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.lock().unwrap().len()
    }
}

impl SessionTransport for Recorder {
    fn push_to_session(&self, actor: ActorId, session: &Session, frame: Bytes) {
        self.pushes
            .lock()
            .unwrap()
            .push((actor, session.id.clone(), frame));
    }
}

impl AudioTransport for Recorder {
    fn play_to_targets(&self, sound: &str, targets: &[ActorId], volume: f32) {
        self.sounds
            .lock()
            .unwrap()
            .push((sound.to_string(), targets.to_vec(), volume));
    }
}

impl AuditLog for Recorder {
    fn record(&self, kind: LogType, impact: LogImpact, text: &str) {
        self.audits
            .lock()
            .unwrap()
            .push((kind, impact, text.to_string()));
    }
}

impl ReplayRecorder for Recorder {
    fn record(&self, record: &ChatRecord) {
        self.replays.lock().unwrap().push(record.clone());
    }
}

pub fn channels() -> ChannelRegistry {
    [
        ChannelDescriptor::new("cmd", "Command").with_color("#fcdf03"),
        ChannelDescriptor::new("common", "Common").with_color("#2cdb2c"),
        ChannelDescriptor::new("cc", "CentCom").long_range(),
    ]
    .into_iter()
    .collect()
}

/// A seeded router wired to a fresh recorder.
pub fn router() -> (RadioRouter, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let router = RadioRouter::with_config(
        channels(),
        RouterConfig {
            verb_seed: Some(42),
            ..RouterConfig::default()
        },
    )
    .with_sessions(recorder.clone())
    .with_audio(recorder.clone())
    .with_audit(recorder.clone())
    .with_replay(recorder.clone());
    (router, recorder)
}
