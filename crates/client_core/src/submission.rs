//! Drives a [`Wizard`] through one submission against a [`TryOnBackend`].

use std::{sync::Arc, time::Duration};

use shared::{domain::SubmissionResult, error::TryOnError};
use tracing::warn;

use crate::{
    config::DEFAULT_PROGRESS_INTERVAL,
    wizard::{SubmissionTicket, TransitionError, Wizard},
    TryOnBackend,
};

const INTERRUPTED: &str = "submission was interrupted before the backend answered";

pub struct SubmissionController<B: ?Sized> {
    backend: Arc<B>,
    progress_interval: Duration,
}

impl<B: TryOnBackend + ?Sized> SubmissionController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Validates, submits, and settles the wizard. On return the wizard is
    /// either on the result step or back on step 2 showing the error; it is
    /// never left loading, even if this future is dropped mid-request.
    pub async fn generate_try_on(
        &self,
        wizard: &mut Wizard,
    ) -> Result<SubmissionResult, TransitionError> {
        let pending = wizard.begin_submit()?;
        let mut guard = LoadingGuard {
            wizard,
            ticket: pending.ticket,
            settled: false,
        };

        let call = self.backend.generate(&pending.request);
        tokio::pin!(call);
        let mut ticker = tokio::time::interval(self.progress_interval);
        ticker.tick().await;

        let outcome = loop {
            tokio::select! {
                outcome = &mut call => break outcome,
                _ = ticker.tick() => guard.wizard.advance_progress(),
            }
        };

        guard.settle(outcome.clone());
        outcome.map_err(TransitionError::Rejected)
    }
}

struct LoadingGuard<'a> {
    wizard: &'a mut Wizard,
    ticket: SubmissionTicket,
    settled: bool,
}

impl LoadingGuard<'_> {
    fn settle(&mut self, outcome: Result<SubmissionResult, TryOnError>) {
        self.settled = true;
        let _ = self.wizard.finish_submit(self.ticket, outcome);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("tryon: {INTERRUPTED}");
            let _ = self
                .wizard
                .finish_submit(self.ticket, Err(TryOnError::Network(INTERRUPTED.to_string())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use shared::{
        domain::{DataUrl, MeasurementField, WizardStep},
        protocol::TryOnRequest,
    };

    struct FakeBackend {
        calls: AtomicUsize,
        outcome: Result<SubmissionResult, TryOnError>,
        delay: Duration,
    }

    impl FakeBackend {
        fn answering(outcome: Result<SubmissionResult, TryOnError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome,
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Err(TryOnError::Network("unreachable".into())),
                delay,
            })
        }
    }

    #[async_trait]
    impl TryOnBackend for FakeBackend {
        async fn generate(
            &self,
            _request: &TryOnRequest,
        ) -> Result<SubmissionResult, TryOnError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.outcome.clone()
        }
    }

    fn ready_wizard() -> Wizard {
        let mut wizard = Wizard::new();
        let data = wizard.data_mut().expect("editable");
        data.user_image = Some(DataUrl::from_bytes("image/png", b"u"));
        data.clothing_image = Some(DataUrl::from_bytes("image/png", b"c"));
        data.name = "Lin".into();
        wizard.next().expect("step 2");
        let data = wizard.data_mut().expect("editable");
        for field in MeasurementField::ALL {
            *data.measurements.get_mut(field) = "90".into();
        }
        wizard
    }

    fn ok_result() -> SubmissionResult {
        SubmissionResult {
            success: true,
            id: None,
            result_image: Some("data:image/png;base64,AAAA".into()),
            feedback: Some("Looks sharp".into()),
            status: None,
        }
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_backend() {
        let backend = FakeBackend::answering(Ok(ok_result()));
        let controller = SubmissionController::new(backend.clone());
        let mut wizard = ready_wizard();
        wizard.data_mut().expect("editable").measurements.chest.clear();

        let err = controller
            .generate_try_on(&mut wizard)
            .await
            .expect_err("invalid");
        assert!(matches!(err, TransitionError::Rejected(TryOnError::Validation(_))));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(wizard.step(), WizardStep::Measurements);
    }

    #[tokio::test]
    async fn success_moves_to_result_step() {
        let backend = FakeBackend::answering(Ok(ok_result()));
        let controller = SubmissionController::new(backend.clone());
        let mut wizard = ready_wizard();

        let result = controller.generate_try_on(&mut wizard).await.expect("ok");
        assert_eq!(result.feedback.as_deref(), Some("Looks sharp"));
        assert_eq!(wizard.step(), WizardStep::Result);
        assert!(!wizard.is_loading());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_clears_loading_and_keeps_step() {
        let backend = FakeBackend::answering(Err(TryOnError::application(None)));
        let controller = SubmissionController::new(backend);
        let mut wizard = ready_wizard();

        controller
            .generate_try_on(&mut wizard)
            .await
            .expect_err("backend failure");
        assert!(!wizard.is_loading());
        assert_eq!(wizard.step(), WizardStep::Measurements);
        assert!(wizard.error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_failure_settles_after_progress_ticks() {
        let backend = FakeBackend::slow(Duration::from_secs(10));
        let controller =
            SubmissionController::new(backend).with_progress_interval(Duration::from_secs(1));
        let mut wizard = ready_wizard();

        let _ = controller.generate_try_on(&mut wizard).await;
        assert!(!wizard.is_loading());
        assert!(wizard.error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_call_still_clears_loading() {
        let backend = FakeBackend::slow(Duration::from_secs(60));
        let controller = SubmissionController::new(backend);
        let mut wizard = ready_wizard();

        let timed_out = tokio::time::timeout(
            Duration::from_secs(1),
            controller.generate_try_on(&mut wizard),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(!wizard.is_loading());
        assert!(wizard
            .error()
            .expect("interrupted error")
            .to_string()
            .contains("interrupted"));
    }
}
