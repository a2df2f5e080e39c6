//! SensorSuite - the set of sources the assembler reads each tick

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{SensorKind, SensorSource};
use tracing::debug;

/// Sources keyed by the sample field they fill
///
/// At most one source per kind. A kind without a source is reported as
/// unavailable by the assembler.
#[derive(Clone, Default)]
pub struct SensorSuite {
    sources: BTreeMap<SensorKind, Arc<dyn SensorSource>>,
}

impl SensorSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any previous source of the same kind
    pub fn insert(&mut self, source: Arc<dyn SensorSource>) -> Option<Arc<dyn SensorSource>> {
        self.sources.insert(source.kind(), source)
    }

    /// Builder-style `insert`
    pub fn with(mut self, source: Arc<dyn SensorSource>) -> Self {
        self.insert(source);
        self
    }

    pub fn get(&self, kind: SensorKind) -> Option<&Arc<dyn SensorSource>> {
        self.sources.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SensorKind, &Arc<dyn SensorSource>)> {
        self.sources.iter().map(|(kind, source)| (*kind, source))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Register push-style listeners on every source
    pub fn listen_all(&self) {
        for source in self.sources.values() {
            source.listen();
        }
        debug!(sources = self.sources.len(), "push listeners registered");
    }

    /// Deregister push-style listeners on every source
    pub fn detach_all(&self) {
        for source in self.sources.values() {
            source.detach();
        }
        debug!(sources = self.sources.len(), "push listeners detached");
    }
}

impl std::fmt::Debug for SensorSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.sources.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_device::MockDevice;
    use contracts::SensorDevice;
    use crate::{BatterySource, GeolocationSource, OrientationSource};

    #[test]
    fn test_insert_replaces_same_kind() {
        let mut suite = SensorSuite::new();
        assert!(suite.insert(Arc::new(GeolocationSource::unsupported())).is_none());
        assert!(suite.insert(Arc::new(GeolocationSource::unsupported())).is_some());
        suite.insert(Arc::new(BatterySource::unsupported()));

        assert_eq!(suite.len(), 2);
        let kinds: Vec<_> = suite.iter().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![SensorKind::Geolocation, SensorKind::Battery]);
        assert!(suite.get(SensorKind::AmbientLight).is_none());
    }

    #[test]
    fn test_listen_and_detach_all() {
        let device = Arc::new(MockDevice::with_defaults("tilt", SensorKind::Orientation));
        let suite = SensorSuite::new()
            .with(Arc::new(OrientationSource::new(device.clone())))
            .with(Arc::new(BatterySource::unsupported()));

        suite.listen_all();
        assert!(device.is_listening());

        suite.detach_all();
        assert!(!device.is_listening());
    }
}
