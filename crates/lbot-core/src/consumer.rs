use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::Event,
    ports::{Fetcher, Processor},
};

pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// Poll-fetch-process loop.
///
/// Strictly sequential: one fetch, then every event of the batch in order.
/// No error is fatal. Fetch errors are retried right away, per-event errors
/// are logged and the batch carries on.
pub struct Consumer {
    fetcher: Arc<dyn Fetcher>,
    processor: Arc<dyn Processor>,
    batch_size: usize,
    idle_interval: Duration,
}

impl Consumer {
    pub fn new(fetcher: Arc<dyn Fetcher>, processor: Arc<dyn Processor>, batch_size: usize) -> Self {
        Self {
            fetcher,
            processor,
            batch_size,
            idle_interval: DEFAULT_IDLE_INTERVAL,
        }
    }

    /// Sleep between polls that returned nothing.
    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.idle_interval = idle_interval;
        self
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation interrupts a pending fetch or idle sleep only. A batch that
    /// was fetched is always processed to the end, then the fetcher commits.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(batch_size = self.batch_size, "consumer started");

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                res = self.fetcher.fetch(self.batch_size) => res,
            };

            let events = match fetched {
                Ok(events) => events,
                Err(e) => {
                    tracing::error!(error = %e, "fetch failed");
                    continue;
                }
            };

            if events.is_empty() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = sleep(self.idle_interval) => {}
                }
                continue;
            }

            self.handle_events(events).await;
        }

        if let Err(e) = self.fetcher.commit().await {
            tracing::warn!(error = %e, "failed to commit fetch position");
        }
        tracing::info!("consumer stopped");
    }

    async fn handle_events(&self, events: Vec<Event>) {
        for event in events {
            if let Err(e) = self.processor.process(event).await {
                tracing::error!(error = %e, "failed to process event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{domain::ChatId, errors::Error, Result};

    /// Serves scripted batches, then cancels the loop once the script runs out.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Result<Vec<Event>>>>,
        cancel: CancellationToken,
        calls: Mutex<usize>,
        commits: Mutex<usize>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<Vec<Event>>>, cancel: CancellationToken) -> Self {
            Self {
                script: Mutex::new(script.into()),
                cancel,
                calls: Mutex::new(0),
                commits: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, _limit: usize) -> Result<Vec<Event>> {
            *self.calls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(batch) => batch,
                None => {
                    self.cancel.cancel();
                    Ok(Vec::new())
                }
            }
        }

        async fn commit(&self) -> Result<()> {
            *self.commits.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingProcessor {
        seen: Mutex<Vec<String>>,
        cancel_on_first: Option<CancellationToken>,
    }

    #[async_trait]
    impl Processor for RecordingProcessor {
        async fn process(&self, event: Event) -> Result<()> {
            self.seen.lock().unwrap().push(event.text.clone());
            if let Some(cancel) = &self.cancel_on_first {
                cancel.cancel();
            }
            if event.text == "boom" {
                return Err(Error::Transport("boom".to_string()));
            }
            Ok(())
        }
    }

    fn ev(text: &str) -> Event {
        Event::message(text, ChatId(1), "alice")
    }

    fn consumer(fetcher: Arc<ScriptedFetcher>, processor: Arc<RecordingProcessor>) -> Consumer {
        Consumer::new(fetcher, processor, 100).with_idle_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn failing_event_does_not_abort_batch() {
        let cancel = CancellationToken::new();
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![Ok(vec![ev("one"), ev("boom"), ev("three")])],
            cancel.clone(),
        ));
        let processor = Arc::new(RecordingProcessor::default());

        consumer(fetcher, processor.clone()).run(cancel).await;

        assert_eq!(*processor.seen.lock().unwrap(), vec!["one", "boom", "three"]);
    }

    #[tokio::test]
    async fn fetch_errors_and_empty_batches_keep_the_loop_alive() {
        let cancel = CancellationToken::new();
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![
                Err(Error::Transport("network down".to_string())),
                Ok(Vec::new()),
                Ok(vec![ev("a")]),
                Err(Error::Transport("again".to_string())),
                Ok(vec![ev("b"), ev("c")]),
            ],
            cancel.clone(),
        ));
        let processor = Arc::new(RecordingProcessor::default());

        consumer(fetcher.clone(), processor.clone()).run(cancel).await;

        assert_eq!(*processor.seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(*fetcher.calls.lock().unwrap(), 6);
    }

    #[tokio::test]
    async fn cancellation_mid_batch_finishes_batch_then_commits() {
        let cancel = CancellationToken::new();
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![
                Ok(vec![ev("one"), ev("two"), ev("three")]),
                Ok(vec![ev("four")]),
            ],
            cancel.clone(),
        ));
        let processor = Arc::new(RecordingProcessor {
            cancel_on_first: Some(cancel.clone()),
            ..Default::default()
        });

        consumer(fetcher.clone(), processor.clone()).run(cancel).await;

        assert_eq!(*processor.seen.lock().unwrap(), vec!["one", "two", "three"]);
        assert_eq!(*fetcher.calls.lock().unwrap(), 1);
        assert_eq!(*fetcher.commits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_fetches_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(vec![ev("a")])], cancel.clone()));
        let processor = Arc::new(RecordingProcessor::default());

        consumer(fetcher.clone(), processor.clone()).run(cancel).await;

        assert_eq!(*fetcher.calls.lock().unwrap(), 0);
        assert!(processor.seen.lock().unwrap().is_empty());
        assert_eq!(*fetcher.commits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn cancellation_interrupts_idle_sleep() {
        struct EmptyFetcher;

        #[async_trait]
        impl Fetcher for EmptyFetcher {
            async fn fetch(&self, _limit: usize) -> Result<Vec<Event>> {
                Ok(Vec::new())
            }
        }

        let cancel = CancellationToken::new();
        let c = Consumer::new(
            Arc::new(EmptyFetcher),
            Arc::new(RecordingProcessor::default()),
            10,
        )
        .with_idle_interval(Duration::from_secs(3600));

        let stopper = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            stopper.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), c.run(cancel))
            .await
            .expect("consumer should stop on cancellation");
    }
}
