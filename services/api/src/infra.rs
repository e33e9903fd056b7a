use admission_portal::workflows::admission::intake::{
    AdmissionIntakeService, InMemoryApplicationRepository, InMemoryDraftRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type PortalIntake =
    AdmissionIntakeService<InMemoryDraftRepository, InMemoryApplicationRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Intake backed by process memory; drafts and applications are lost on restart.
pub(crate) fn in_memory_intake() -> Arc<PortalIntake> {
    Arc::new(AdmissionIntakeService::new(
        Arc::new(InMemoryDraftRepository::default()),
        Arc::new(InMemoryApplicationRepository::default()),
    ))
}
