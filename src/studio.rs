//! The task that owns [`AppState`].
//!
//! HTTP handlers never touch the state directly; they send messages through
//! a [`StudioHandle`] and get a [`StateView`] back once the message is
//! applied. Image payloads stay here and are handed out one at a time.
//! Generation calls run in their own tasks and report back through the same
//! task, so concurrent jobs never race on the state.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use crate::data_url::{DataUrl, DataUrlError};
use crate::gallery::Download;
use crate::gemini::ImageGenerator;
use crate::state::{AppState, Command, Message, StateView};

const REQUEST_QUEUE: usize = 64;

/// Where a stored image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Base,
    Background,
    Result(String),
}

enum Request {
    Dispatch {
        message: Message,
        reply: oneshot::Sender<StateView>,
    },
    Snapshot(oneshot::Sender<StateView>),
    Image {
        source: ImageSource,
        reply: oneshot::Sender<Option<DataUrl>>,
    },
    Download {
        id: String,
        reply: oneshot::Sender<Option<Result<Download, DataUrlError>>>,
    },
}

#[derive(Clone)]
pub struct StudioHandle {
    sender: mpsc::Sender<Request>,
}

impl StudioHandle {
    /// Applies one message and returns the state after it.
    pub async fn dispatch(&self, message: Message) -> Result<StateView> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Dispatch { message, reply }).await?;
        response.await.map_err(|_| anyhow!("studio dropped the reply"))
    }

    pub async fn snapshot(&self) -> Result<StateView> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Snapshot(reply)).await?;
        response.await.map_err(|_| anyhow!("studio dropped the reply"))
    }

    /// `None` when the slot is empty or no result has this id.
    pub async fn image(&self, source: ImageSource) -> Result<Option<DataUrl>> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Image { source, reply }).await?;
        response.await.map_err(|_| anyhow!("studio dropped the reply"))
    }

    /// `None` when no result has this id.
    pub async fn download(&self, id: impl Into<String>) -> Result<Option<Result<Download, DataUrlError>>> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Download {
            id: id.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| anyhow!("studio dropped the reply"))
    }

    async fn send(&self, request: Request) -> Result<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| anyhow!("studio is not running"))
    }
}

struct Studio {
    state: AppState,
    generator: Arc<dyn ImageGenerator>,
    completions: mpsc::UnboundedSender<Message>,
}

/// Starts the owning task on the current runtime.
pub fn spawn(generator: Arc<dyn ImageGenerator>) -> StudioHandle {
    let (sender, requests) = mpsc::channel(REQUEST_QUEUE);
    let (completions, finished) = mpsc::unbounded_channel();
    let studio = Studio {
        state: AppState::new(),
        generator,
        completions,
    };
    tokio::spawn(studio.run(requests, finished));
    StudioHandle { sender }
}

impl Studio {
    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut finished: mpsc::UnboundedReceiver<Message>,
    ) {
        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                Some(message) = finished.recv() => self.apply(message),
            }
        }
        tracing::debug!("studio stopped");
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Dispatch { message, reply } => {
                self.apply(message);
                let _ = reply.send(self.state.view());
            }
            Request::Snapshot(reply) => {
                let _ = reply.send(self.state.view());
            }
            Request::Image { source, reply } => {
                let _ = reply.send(self.stored_image(&source));
            }
            Request::Download { id, reply } => {
                let _ = reply.send(self.state.gallery.download(&id));
            }
        }
    }

    fn stored_image(&self, source: &ImageSource) -> Option<DataUrl> {
        match source {
            ImageSource::Base => self.state.base_image.as_ref().map(|image| image.inline_data()),
            ImageSource::Background => self
                .state
                .background_image
                .as_ref()
                .map(|image| image.inline_data()),
            ImageSource::Result(id) => {
                let image = self.state.gallery.get(id)?;
                DataUrl::parse(&image.data_url).ok()
            }
        }
    }

    fn apply(&mut self, message: Message) {
        if let Some(command) = self.state.update(message) {
            self.execute(command);
        }
    }

    fn execute(&self, command: Command) {
        match command {
            Command::Generate(job) => {
                let generator = self.generator.clone();
                let completions = self.completions.clone();
                tracing::info!(
                    background_image = job.background_image.is_some(),
                    style = %job.params.style,
                    "starting generation"
                );
                tokio::spawn(async move {
                    let result = generator
                        .generate(&job.base_image, &job.prompt, job.background_image.as_ref())
                        .await;
                    match &result {
                        Ok(_) => tracing::info!("generation finished"),
                        Err(err) => tracing::warn!("generation failed: {err}"),
                    }
                    let _ = completions.send(Message::GenerationFinished {
                        job,
                        result,
                        finished_at: Utc::now(),
                    });
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::data_url::BaseImage;
    use crate::error::{GenerationError, GenerationResult};
    use crate::state::RequestStatus;

    struct StubGenerator {
        result: GenerationResult<String>,
        prompts: Mutex<Vec<String>>,
        gate: Option<Semaphore>,
    }

    impl StubGenerator {
        fn new(result: GenerationResult<String>) -> Arc<Self> {
            Arc::new(Self {
                result,
                prompts: Mutex::new(Vec::new()),
                gate: None,
            })
        }

        /// Each call waits for one permit before answering.
        fn gated(result: GenerationResult<String>) -> Arc<Self> {
            Arc::new(Self {
                result,
                prompts: Mutex::new(Vec::new()),
                gate: Some(Semaphore::new(0)),
            })
        }

        fn release(&self, calls: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(calls);
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for StubGenerator {
        async fn generate(
            &self,
            _base_image: &BaseImage,
            prompt: &str,
            _background_image: Option<&BaseImage>,
        ) -> GenerationResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.result.clone()
        }
    }

    fn image() -> BaseImage {
        BaseImage {
            file_name: "face.png".into(),
            mime_type: "image/png".into(),
            data_url: "data:image/png;base64,AAAA".into(),
        }
    }

    async fn wait_for(handle: &StudioHandle, in_flight: usize) -> StateView {
        for _ in 0..100 {
            let state = handle.snapshot().await.unwrap();
            if state.in_flight == in_flight {
                return state;
            }
            tokio::task::yield_now().await;
        }
        panic!("in-flight count never reached {in_flight}");
    }

    async fn settled(handle: &StudioHandle) -> StateView {
        wait_for(handle, 0).await
    }

    #[tokio::test]
    async fn submit_runs_generator_and_records_result() {
        let generator = StubGenerator::new(Ok("data:image/png;base64,aGk=".into()));
        let handle = spawn(generator.clone());

        handle.dispatch(Message::BaseImageLoaded(image())).await.unwrap();
        let state = handle.dispatch(Message::Submit).await.unwrap();
        assert_eq!(state.status, RequestStatus::Generating);
        assert_eq!(state.in_flight, 1);

        let state = settled(&handle).await;
        assert_eq!(state.status, RequestStatus::Idle);
        assert_eq!(state.gallery.len(), 1);
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);

        let id = state.gallery[0].id.clone();
        let download = handle.download(id.clone()).await.unwrap().unwrap().unwrap();
        assert_eq!(download.bytes, b"hi");
        assert_eq!(download.file_name, "variacion_1_web_1x1.png");

        let stored = handle.image(ImageSource::Result(id)).await.unwrap().unwrap();
        assert_eq!(stored.payload(), "aGk=");
    }

    #[tokio::test]
    async fn overlapping_jobs_keep_the_page_busy_until_both_finish() {
        let generator = StubGenerator::gated(Ok("data:image/png;base64,aGk=".into()));
        let handle = spawn(generator.clone());

        handle.dispatch(Message::BaseImageLoaded(image())).await.unwrap();
        handle.dispatch(Message::Submit).await.unwrap();
        generator.release(1);
        let state = settled(&handle).await;
        let id = state.gallery[0].id.clone();

        handle.dispatch(Message::Submit).await.unwrap();
        let state = handle.dispatch(Message::Regenerate(id)).await.unwrap();
        assert_eq!(state.in_flight, 2);
        assert_eq!(state.status, RequestStatus::Generating);

        generator.release(1);
        let state = wait_for(&handle, 1).await;
        assert_eq!(state.status, RequestStatus::Idle);
        assert!(state.is_busy());
        assert_eq!(state.gallery.len(), 2);

        generator.release(1);
        let state = settled(&handle).await;
        assert!(!state.is_busy());
        assert_eq!(state.gallery.len(), 3);
    }

    #[tokio::test]
    async fn missing_base_image_never_calls_generator() {
        let generator = StubGenerator::new(Ok("unused".into()));
        let handle = spawn(generator.clone());

        let state = handle.dispatch(Message::Submit).await.unwrap();
        assert!(matches!(state.status, RequestStatus::Failed(_)));
        assert_eq!(state.in_flight, 0);
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert!(state.gallery.is_empty());
        assert!(handle.image(ImageSource::Base).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_generation_surfaces_generic_message() {
        let generator = StubGenerator::new(Err(GenerationError::Failed));
        let handle = spawn(generator);

        handle.dispatch(Message::BaseImageLoaded(image())).await.unwrap();
        handle.dispatch(Message::Submit).await.unwrap();
        let state = settled(&handle).await;
        assert_eq!(
            state.status,
            RequestStatus::Failed(GenerationError::Failed.to_string())
        );
        assert!(state.gallery.is_empty());
        assert!(handle.download("missing").await.unwrap().is_none());

        let base = handle.image(ImageSource::Base).await.unwrap().unwrap();
        assert_eq!(base.mime_type(), "image/png");
        assert!(handle.image(ImageSource::Background).await.unwrap().is_none());
    }
}
