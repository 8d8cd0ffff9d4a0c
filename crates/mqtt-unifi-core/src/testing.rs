// In-memory collaborators for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bus::Bus;
use crate::error::{BusError, CoreError};
use crate::model::{AccessPointTable, ControllerReport, MacAddress, RawStation};
use crate::source::StationSource;

/// Bus that records every publish and subscribe.
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<(String, String)>>,
    subscriptions: Mutex<Vec<String>>,
    fail_publishes: AtomicBool,
    fail_subscribes: AtomicBool,
}

impl RecordingBus {
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribes.store(fail, Ordering::SeqCst);
    }

    /// `(topic, payload)` pairs in publish order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn take_published(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }
}

impl Bus for RecordingBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(BusError::Publish {
                topic: topic.into(),
                reason: "broker unavailable".into(),
            });
        }
        let payload = String::from_utf8(payload).unwrap();
        self.published.lock().unwrap().push((topic.into(), payload));
        Ok(())
    }

    async fn subscribe(&self, filter: &str) -> Result<(), BusError> {
        if self.fail_subscribes.load(Ordering::SeqCst) {
            return Err(BusError::Subscribe {
                filter: filter.into(),
                reason: "not authorized".into(),
            });
        }
        self.subscriptions.lock().unwrap().push(filter.into());
        Ok(())
    }
}

/// One scripted answer of a [`ScriptedSource`].
pub enum Step {
    Report(ControllerReport),
    Fail,
    /// Never resolves.
    Hang,
}

/// Station source replaying a fixed script; an exhausted script hangs.
#[derive(Default)]
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
        }
    }
}

impl StationSource for ScriptedSource {
    async fn fetch(&self) -> Result<ControllerReport, CoreError> {
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Report(report)) => Ok(report),
            Some(Step::Fail) => Err(CoreError::ConnectionFailed {
                url: "https://controller:8443".into(),
                reason: "connection refused".into(),
            }),
            Some(Step::Hang) | None => std::future::pending().await,
        }
    }
}

/// A report with stations `(mac, hostname, ap_mac)` and a single AP table.
pub fn report(stations: &[(&str, &str, &str)], aps: &[(&str, &str)]) -> ControllerReport {
    ControllerReport {
        stations: stations
            .iter()
            .map(|(mac, host, ap)| RawStation {
                mac: MacAddress::new(mac),
                hostname: Some((*host).into()),
                ap_mac: Some(MacAddress::new(ap)),
                channel: Some(6),
                essid: Some("HomeNet".into()),
                ..RawStation::default()
            })
            .collect(),
        access_points: aps
            .iter()
            .map(|(mac, name)| (MacAddress::new(mac), (*name).to_owned()))
            .collect::<AccessPointTable>(),
    }
}
