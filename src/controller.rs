//! Per-session classification workflow.
//!
//! All state sits behind one synchronous lock that is never held across an
//! `.await`. `classify` and `select_example` suspend; every other operation
//! is a single critical section.

use crate::{
    assets::{load_example_file, AssetSource, ExampleImage},
    classification::{ClassificationResult, ImageFile, ModelChoice, RequestState},
    inference::InferenceClient,
    preview::{Preview, PreviewRegistry},
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

pub const EXAMPLE_LOAD_ERROR: &str = "Failed to load example image";
pub const CLASSIFY_ERROR: &str = "Error classifying image. Please try again.";

struct SelectedImage {
    id: u64,
    file: ImageFile,
    preview: Preview,
}

/// Identity of the (image, model) pair a classification was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    image_id: u64,
    model: ModelChoice,
}

#[derive(Default)]
struct WorkflowState {
    image: Option<SelectedImage>,
    model: ModelChoice,
    loading: bool,
    result: Option<ClassificationResult>,
    error: Option<String>,
    next_image_id: u64,
    // bumped whenever a selection starts; a pending example load must still match it
    selection_epoch: u64,
}

impl WorkflowState {
    fn snapshot(&self) -> Option<Snapshot> {
        self.image.as_ref().map(|image| Snapshot {
            image_id: image.id,
            model: self.model,
        })
    }

    fn clear_outcome(&mut self) {
        self.result = None;
        self.error = None;
    }

    fn replace_image(&mut self, file: ImageFile, preview: Preview) {
        self.next_image_id += 1;
        // the previous preview handle is released when the old image drops here
        self.image = Some(SelectedImage {
            id: self.next_image_id,
            file,
            preview,
        });
        self.clear_outcome();
    }

    fn request_state(&self) -> RequestState {
        if self.loading {
            RequestState::InFlight
        } else if self.result.is_some() {
            RequestState::Succeeded
        } else if self.error.is_some() {
            RequestState::Failed
        } else {
            RequestState::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceRow {
    pub label: String,
    pub confidence: f64,
    pub percent: String,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub label: String,
    pub confidences: Vec<ConfidenceRow>,
}

impl From<&ClassificationResult> for ResultView {
    fn from(result: &ClassificationResult) -> Self {
        let confidences = result
            .confidences
            .iter()
            .enumerate()
            .map(|(index, entry)| ConfidenceRow {
                label: entry.label.clone(),
                confidence: entry.confidence,
                percent: format!("{:.1}%", entry.confidence * 100.0),
                emphasized: index == 0,
            })
            .collect();

        Self {
            label: result.label.clone(),
            confidences,
        }
    }
}

/// Everything the page needs to render, taken under one lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowView {
    pub preview_url: Option<String>,
    pub model: ModelChoice,
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<ResultView>,
    pub state: RequestState,
    pub can_classify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyOutcome {
    /// No image selected, or a classification was already in flight.
    Skipped,
    /// The response matched the current selection and was stored.
    Applied(RequestState),
    /// The selection or model changed while the request was in flight.
    Discarded,
}

impl ClassifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifyOutcome::Skipped => "skipped",
            ClassifyOutcome::Applied(RequestState::Succeeded) => "succeeded",
            ClassifyOutcome::Applied(_) => "failed",
            ClassifyOutcome::Discarded => "discarded",
        }
    }
}

/// Clears the in-flight flag if a classification future unwinds or is dropped
/// before it reaches its own cleanup.
struct InFlightGuard<'a> {
    state: &'a Mutex<WorkflowState>,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Classification ended without resolving, clearing in-flight flag");
            self.state.lock().loading = false;
        }
    }
}

pub struct WorkflowController {
    state: Mutex<WorkflowState>,
    inference: Arc<dyn InferenceClient>,
    assets: Arc<dyn AssetSource>,
    previews: PreviewRegistry,
}

impl WorkflowController {
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        assets: Arc<dyn AssetSource>,
        previews: PreviewRegistry,
    ) -> Self {
        Self {
            state: Mutex::new(WorkflowState::default()),
            inference,
            assets,
            previews,
        }
    }

    pub fn select_file(&self, file: ImageFile) {
        let handle = self.previews.acquire(file.bytes.clone(), &file.content_type);
        let mut state = self.state.lock();
        state.selection_epoch += 1;
        tracing::debug!(
            "Selected {} ({} bytes)",
            file.file_name,
            file.bytes.len()
        );
        state.replace_image(file, Preview::Derived(handle));
    }

    pub async fn select_example(&self, asset: ExampleImage) {
        let epoch = {
            let mut state = self.state.lock();
            state.selection_epoch += 1;
            state.clear_outcome();
            state.selection_epoch
        };

        let loaded = load_example_file(self.assets.as_ref(), asset).await;

        let mut state = self.state.lock();
        if state.selection_epoch != epoch {
            tracing::debug!("Dropping example {} superseded by a newer selection", asset);
            return;
        }

        match loaded {
            Ok(file) => {
                tracing::debug!("Selected example {}", asset);
                state.replace_image(file, Preview::Asset(asset.public_path()));
            }
            Err(e) => {
                tracing::warn!("Failed to load example {}: {}", asset, e);
                state.result = None;
                state.error = Some(EXAMPLE_LOAD_ERROR.to_string());
            }
        }
    }

    pub fn set_model(&self, model: ModelChoice) {
        let mut state = self.state.lock();
        state.model = model;
        state.clear_outcome();
        tracing::debug!("Model set to {}", model);
    }

    pub async fn classify(&self) -> ClassifyOutcome {
        let (file, snapshot) = {
            let mut state = self.state.lock();
            if state.loading {
                tracing::debug!("Classification already in flight, ignoring");
                return ClassifyOutcome::Skipped;
            }
            let (Some(image), Some(snapshot)) = (state.image.as_ref(), state.snapshot()) else {
                return ClassifyOutcome::Skipped;
            };
            let file = image.file.clone();

            state.loading = true;
            state.clear_outcome();
            (file, snapshot)
        };

        let mut guard = InFlightGuard {
            state: &self.state,
            armed: true,
        };

        tracing::info!("Classifying {} with {}", file.file_name, snapshot.model);
        let outcome = self.inference.submit(&file, snapshot.model).await;

        let mut state = self.state.lock();
        state.loading = false;
        guard.armed = false;

        if state.snapshot() != Some(snapshot) {
            tracing::info!("Discarding classification for a superseded selection");
            return ClassifyOutcome::Discarded;
        }

        match outcome {
            Ok(result) => {
                state.result = Some(result);
                state.error = None;
                ClassifyOutcome::Applied(RequestState::Succeeded)
            }
            Err(e) => {
                tracing::debug!("Classification failed: {}", e);
                state.result = None;
                state.error = Some(CLASSIFY_ERROR.to_string());
                ClassifyOutcome::Applied(RequestState::Failed)
            }
        }
    }

    pub fn current_view(&self) -> WorkflowView {
        let state = self.state.lock();
        WorkflowView {
            preview_url: state.image.as_ref().map(|image| image.preview.url()),
            model: state.model,
            loading: state.loading,
            error: state.error.clone(),
            result: state.result.as_ref().map(ResultView::from),
            state: state.request_state(),
            can_classify: state.image.is_some() && !state.loading,
        }
    }

    /// Releases the selected image and its preview handle.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.image = None;
        state.clear_outcome();
        // invalidate a pending example load
        state.selection_epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::AssetError,
        classification::Confidence,
        inference::InferenceFailed,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{oneshot, Notify};

    type Reply = Result<ClassificationResult, InferenceFailed>;

    /// Holds each submit until the test sends its reply.
    #[derive(Default)]
    struct GatedInference {
        calls: AtomicUsize,
        started: Notify,
        replies: parking_lot::Mutex<Vec<oneshot::Receiver<Reply>>>,
        models: parking_lot::Mutex<Vec<ModelChoice>>,
    }

    impl GatedInference {
        fn gate(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().push(rx);
            tx
        }
    }

    #[async_trait]
    impl InferenceClient for GatedInference {
        async fn submit(&self, _image: &ImageFile, model: ModelChoice) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.models.lock().push(model);
            let reply = self.replies.lock().pop();
            self.started.notify_one();
            match reply {
                Some(rx) => rx.await.unwrap_or(Err(InferenceFailed)),
                None => Err(InferenceFailed),
            }
        }
    }

    struct PanickingInference;

    #[async_trait]
    impl InferenceClient for PanickingInference {
        async fn submit(&self, _image: &ImageFile, _model: ModelChoice) -> Reply {
            panic!("inference backend exploded");
        }
    }

    #[derive(Default)]
    struct AssetGate {
        started: Notify,
        release: Notify,
    }

    struct MockAssets {
        fail: bool,
        gate: Option<Arc<AssetGate>>,
    }

    #[async_trait]
    impl AssetSource for MockAssets {
        async fn load(&self, asset: ExampleImage) -> Result<Bytes, AssetError> {
            if let Some(gate) = &self.gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            if self.fail {
                Err(AssetError::Empty)
            } else {
                Ok(Bytes::from(format!("{}-bytes", asset.name())))
            }
        }
    }

    fn dog_result() -> ClassificationResult {
        ClassificationResult {
            label: "Dog".to_string(),
            confidences: vec![
                Confidence {
                    label: "Dog".to_string(),
                    confidence: 0.93,
                },
                Confidence {
                    label: "Cat".to_string(),
                    confidence: 0.07,
                },
            ],
        }
    }

    fn upload(bytes: &'static [u8]) -> ImageFile {
        ImageFile::new(Bytes::from_static(bytes), "upload.png", "image/png")
    }

    struct Fixture {
        inference: Arc<GatedInference>,
        previews: PreviewRegistry,
        controller: Arc<WorkflowController>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_assets(MockAssets {
                fail: false,
                gate: None,
            })
        }

        fn with_assets(assets: MockAssets) -> Self {
            let inference = Arc::new(GatedInference::default());
            let previews = PreviewRegistry::new();
            let controller = Arc::new(WorkflowController::new(
                inference.clone(),
                Arc::new(assets),
                previews.clone(),
            ));
            Self {
                inference,
                previews,
                controller,
            }
        }

        /// Starts a classification and waits until the adapter has been called.
        async fn start_classify(&self) -> tokio::task::JoinHandle<ClassifyOutcome> {
            let controller = self.controller.clone();
            let handle = tokio::spawn(async move { controller.classify().await });
            self.inference.started.notified().await;
            handle
        }
    }

    fn assert_consistent(view: &WorkflowView) {
        assert!(
            !(view.result.is_some() && view.error.is_some()),
            "result and error both set: {:?}",
            view
        );
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        File,
        Example(ExampleImage),
        Model(ModelChoice),
        Classify { succeed: bool },
    }

    async fn apply(fixture: &Fixture, step: Step) {
        match step {
            Step::File => fixture.controller.select_file(upload(b"step")),
            Step::Example(asset) => fixture.controller.select_example(asset).await,
            Step::Model(model) => fixture.controller.set_model(model),
            Step::Classify { succeed } => {
                let reply = fixture.inference.gate();
                let task = fixture.start_classify().await;
                let outcome = if succeed {
                    Ok(dog_result())
                } else {
                    Err(InferenceFailed)
                };
                reply.send(outcome).unwrap();
                task.await.unwrap();
            }
        }
    }

    #[test]
    fn test_initial_view() {
        let fixture = Fixture::new();
        let view = fixture.controller.current_view();

        assert_eq!(view.preview_url, None);
        assert_eq!(view.model, ModelChoice::CatVsDog);
        assert!(!view.loading);
        assert!(!view.can_classify);
        assert_eq!(view.state, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_classify_success() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        let in_flight = fixture.controller.current_view();
        assert!(in_flight.loading);
        assert!(!in_flight.can_classify);
        assert_eq!(in_flight.state, RequestState::InFlight);

        reply.send(Ok(dog_result())).unwrap();
        assert_eq!(
            task.await.unwrap(),
            ClassifyOutcome::Applied(RequestState::Succeeded)
        );

        let view = fixture.controller.current_view();
        assert!(!view.loading);
        assert_eq!(view.state, RequestState::Succeeded);
        assert_eq!(view.error, None);
        let result = view.result.unwrap();
        assert_eq!(result.label, "Dog");
        assert_eq!(result.confidences.len(), 2);
        assert_eq!(result.confidences[0].label, "Dog");
        assert!(result.confidences[0].emphasized);
        assert!(!result.confidences[1].emphasized);
        assert_eq!(result.confidences[0].percent, "93.0%");
        let total: f64 = result.confidences.iter().map(|c| c.confidence).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_classify_failure_sets_fixed_message() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        reply.send(Err(InferenceFailed)).unwrap();
        assert_eq!(
            task.await.unwrap(),
            ClassifyOutcome::Applied(RequestState::Failed)
        );

        let view = fixture.controller.current_view();
        assert_eq!(view.error.as_deref(), Some(CLASSIFY_ERROR));
        assert_eq!(view.result, None);
        assert!(!view.loading);
        assert!(view.can_classify);
        assert_eq!(view.state, RequestState::Failed);
    }

    #[tokio::test]
    async fn test_classify_without_image_is_ignored() {
        let fixture = Fixture::new();

        assert_eq!(fixture.controller.classify().await, ClassifyOutcome::Skipped);
        assert_eq!(fixture.inference.calls.load(Ordering::SeqCst), 0);
        let view = fixture.controller.current_view();
        assert_eq!(view.error, None);
        assert_eq!(view.state, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_second_classify_while_in_flight_is_noop() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        assert_eq!(fixture.controller.classify().await, ClassifyOutcome::Skipped);
        assert_eq!(fixture.inference.calls.load(Ordering::SeqCst), 1);

        reply.send(Ok(dog_result())).unwrap();
        task.await.unwrap();
        assert_eq!(fixture.inference.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            fixture.controller.current_view().state,
            RequestState::Succeeded
        );
    }

    #[tokio::test]
    async fn test_stale_response_after_new_image_is_discarded() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"first"));
        let reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        fixture.controller.select_file(upload(b"second"));
        let before = fixture.controller.current_view();
        assert!(before.loading);

        reply.send(Ok(dog_result())).unwrap();
        assert_eq!(task.await.unwrap(), ClassifyOutcome::Discarded);

        let view = fixture.controller.current_view();
        assert_eq!(view.result, None);
        assert_eq!(view.error, None);
        assert!(!view.loading);
        assert_eq!(view.preview_url, before.preview_url);
        assert_eq!(view.state, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_stale_failure_after_model_change_is_discarded() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        fixture.controller.set_model(ModelChoice::BearClassifier);

        reply.send(Err(InferenceFailed)).unwrap();
        assert_eq!(task.await.unwrap(), ClassifyOutcome::Discarded);

        let view = fixture.controller.current_view();
        assert_eq!(view.error, None);
        assert_eq!(view.model, ModelChoice::BearClassifier);
        assert_eq!(
            fixture.inference.models.lock().as_slice(),
            &[ModelChoice::CatVsDog]
        );
    }

    #[tokio::test]
    async fn test_stale_response_after_example_selection_is_discarded() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        fixture.controller.select_example(ExampleImage::Dog).await;
        assert!(fixture.controller.current_view().loading);

        reply.send(Ok(dog_result())).unwrap();
        assert_eq!(task.await.unwrap(), ClassifyOutcome::Discarded);

        let view = fixture.controller.current_view();
        assert_eq!(view.preview_url.as_deref(), Some("/assets/dog.jpg"));
        assert_eq!(view.result, None);
        assert_eq!(view.error, None);
        assert!(!view.loading);
        assert!(view.can_classify);
        assert_eq!(view.state, RequestState::Idle);
        assert!(fixture.previews.is_empty());
    }

    #[tokio::test]
    async fn test_set_model_clears_result_synchronously() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let reply = fixture.inference.gate();
        let task = fixture.start_classify().await;
        reply.send(Ok(dog_result())).unwrap();
        task.await.unwrap();
        assert!(fixture.controller.current_view().result.is_some());

        fixture.controller.set_model(ModelChoice::BearClassifier);

        let view = fixture.controller.current_view();
        assert_eq!(view.result, None);
        assert!(view.preview_url.is_some());
        assert_eq!(fixture.inference.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invariant_holds_across_selection_sequences() {
        let failing = Fixture::with_assets(MockAssets {
            fail: true,
            gate: None,
        });
        let controller = &failing.controller;

        controller.select_file(upload(b"a"));
        assert_consistent(&controller.current_view());
        controller.select_example(ExampleImage::Cat).await;
        assert_consistent(&controller.current_view());
        controller.set_model(ModelChoice::BearClassifier);
        assert_consistent(&controller.current_view());
        controller.select_example(ExampleImage::Dog).await;
        assert_consistent(&controller.current_view());
        controller.select_file(upload(b"b"));
        let view = controller.current_view();
        assert_consistent(&view);
        assert_eq!(view.error, None);
    }

    #[tokio::test]
    async fn test_invariant_holds_from_succeeded_state() {
        use ExampleImage::*;
        use ModelChoice::*;

        let sequences: &[&[Step]] = &[
            &[
                Step::Example(Cat),
                Step::Classify { succeed: true },
                Step::Model(BearClassifier),
                Step::File,
            ],
            &[
                Step::Model(BearClassifier),
                Step::Classify { succeed: false },
                Step::Example(Dog),
                Step::Classify { succeed: true },
            ],
            &[
                Step::File,
                Step::Classify { succeed: false },
                Step::File,
                Step::Model(CatVsDog),
            ],
            &[
                Step::Example(Teddy),
                Step::Example(Grizzly),
                Step::Classify { succeed: true },
                Step::Example(Dunno),
            ],
            &[
                Step::Model(CatVsDog),
                Step::Classify { succeed: true },
                Step::Example(Black),
                Step::Model(BearClassifier),
                Step::Classify { succeed: false },
                Step::File,
            ],
        ];

        for steps in sequences {
            let fixture = Fixture::new();
            fixture.controller.select_file(upload(b"png"));
            apply(&fixture, Step::Classify { succeed: true }).await;
            assert_eq!(
                fixture.controller.current_view().state,
                RequestState::Succeeded
            );

            for step in steps.iter() {
                apply(&fixture, *step).await;
                let view = fixture.controller.current_view();
                assert_consistent(&view);
                assert!(!view.loading, "{:?} left loading set", step);
                assert!(fixture.previews.len() <= 1);

                match step {
                    Step::Classify { succeed: true } => {
                        assert_eq!(view.state, RequestState::Succeeded)
                    }
                    Step::Classify { succeed: false } => {
                        assert_eq!(view.state, RequestState::Failed)
                    }
                    _ => {
                        assert_eq!(view.result, None, "{:?} kept a result", step);
                        assert_eq!(view.error, None, "{:?} kept an error", step);
                        assert_eq!(view.state, RequestState::Idle);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_select_example_uses_asset_path_as_preview() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        assert_eq!(fixture.previews.len(), 1);

        fixture.controller.select_example(ExampleImage::Grizzly).await;

        let view = fixture.controller.current_view();
        assert_eq!(view.preview_url.as_deref(), Some("/assets/grizzly.jpg"));
        assert!(view.can_classify);
        assert!(fixture.previews.is_empty());
    }

    #[tokio::test]
    async fn test_failed_example_keeps_prior_image() {
        let fixture = Fixture::with_assets(MockAssets {
            fail: true,
            gate: None,
        });
        fixture.controller.select_file(upload(b"png"));
        let before = fixture.controller.current_view().preview_url;

        fixture.controller.select_example(ExampleImage::Teddy).await;

        let view = fixture.controller.current_view();
        assert_eq!(view.preview_url, before);
        assert_eq!(view.error.as_deref(), Some(EXAMPLE_LOAD_ERROR));
        assert_eq!(view.result, None);
        assert_eq!(fixture.previews.len(), 1);
    }

    #[tokio::test]
    async fn test_superseded_example_load_is_dropped() {
        let gate = Arc::new(AssetGate::default());
        let fixture = Fixture::with_assets(MockAssets {
            fail: false,
            gate: Some(gate.clone()),
        });

        let controller = fixture.controller.clone();
        let pending =
            tokio::spawn(async move { controller.select_example(ExampleImage::Cat).await });
        gate.started.notified().await;

        fixture.controller.select_file(upload(b"newer"));
        let uploaded = fixture.controller.current_view().preview_url;
        gate.release.notify_one();
        pending.await.unwrap();

        assert_eq!(fixture.controller.current_view().preview_url, uploaded);
    }

    #[tokio::test]
    async fn test_new_selection_releases_previous_preview() {
        let fixture = Fixture::new();

        fixture.controller.select_file(upload(b"one"));
        fixture.controller.select_file(upload(b"two"));
        fixture.controller.select_file(upload(b"three"));
        assert_eq!(fixture.previews.len(), 1);

        fixture.controller.shutdown();
        assert!(fixture.previews.is_empty());
        assert_eq!(fixture.controller.current_view().preview_url, None);
    }

    #[tokio::test]
    async fn test_panicking_adapter_clears_in_flight() {
        let previews = PreviewRegistry::new();
        let controller = Arc::new(WorkflowController::new(
            Arc::new(PanickingInference),
            Arc::new(MockAssets {
                fail: false,
                gate: None,
            }),
            previews,
        ));
        controller.select_file(upload(b"png"));

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.classify().await }
        });
        assert!(task.await.is_err());

        let view = controller.current_view();
        assert!(!view.loading);
        assert!(view.can_classify);
    }

    #[tokio::test]
    async fn test_dropped_classification_clears_in_flight() {
        let fixture = Fixture::new();
        fixture.controller.select_file(upload(b"png"));
        let _reply = fixture.inference.gate();

        let task = fixture.start_classify().await;
        assert!(fixture.controller.current_view().loading);
        task.abort();
        let _ = task.await;

        assert!(!fixture.controller.current_view().loading);
    }
}
