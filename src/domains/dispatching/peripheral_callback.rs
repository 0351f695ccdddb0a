use crate::common::DomainResult;
use crate::domains::fleet::{FleetState, PeripheralJob};

/// Results reported by the peripheral subsystem. Only ever called on the
/// kernel executor, never concurrently with a dispatch cycle.
pub trait PeripheralJobCallback {
    fn peripheral_job_finished(&mut self, job: &PeripheralJob) -> DomainResult<()>;
    fn peripheral_job_failed(&mut self, job: &PeripheralJob) -> DomainResult<()>;
}

impl PeripheralJobCallback for FleetState {
    fn peripheral_job_finished(&mut self, job: &PeripheralJob) -> DomainResult<()> {
        if self.peripheral_job(&job.id).is_none() {
            tracing::debug!("Peripheral job {} was not registered; recording as reported", job.id);
        }
        self.complete_peripheral_job(job)?;
        tracing::info!("Peripheral job {} finished", job.id);
        Ok(())
    }

    fn peripheral_job_failed(&mut self, job: &PeripheralJob) -> DomainResult<()> {
        let failed = self.fail_peripheral_job(job)?;
        if failed.is_empty() {
            tracing::info!("Peripheral job {} failed", job.id);
        } else {
            tracing::warn!("Peripheral job {} failed; orders failed: {:?}", job.id, failed);
        }
        Ok(())
    }
}
