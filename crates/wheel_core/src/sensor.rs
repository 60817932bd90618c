use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAccess {
    Granted,
    Denied,
    Unsupported,
}

#[async_trait]
pub trait SensorGate: Send + Sync {
    async fn request_access(&self) -> SensorAccess;
}

/// Null gate for platforms without an orientation source.
#[derive(Debug, Default)]
pub struct UnsupportedSensorGate;

#[async_trait]
impl SensorGate for UnsupportedSensorGate {
    async fn request_access(&self) -> SensorAccess {
        SensorAccess::Unsupported
    }
}
