//! Progress reporting for byte streams.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::stream::ByteStream;

/// Receives lifecycle events from an observed stream.
///
/// Implementations must not fail: rendering problems are swallowed so they
/// can never abort a transfer.
pub trait ProgressObserver: Send {
    /// Called once, before the first chunk is handed downstream.
    fn start(&mut self, total: Option<u64>);

    /// Called after every chunk with the running byte count.
    fn update(&mut self, current: u64);

    /// Called once when the stream ends, errors or is dropped.
    fn stop(&mut self);
}

/// Observer that renders nothing.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn start(&mut self, _total: Option<u64>) {}
    fn update(&mut self, _current: u64) {}
    fn stop(&mut self) {}
}

/// Running counter behind a progress display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    transferred: u64,
    total: Option<u64>,
    last_percent: f64,
}

impl ProgressState {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            transferred: 0,
            total,
            last_percent: 0.0,
        }
    }

    /// Record the running byte count and return the percentage to render.
    ///
    /// The declared total is a hint: the percentage clamps at 100 and never
    /// goes backwards.
    pub fn advance(&mut self, current: u64) -> Option<f64> {
        self.transferred = current;
        let total = self.total?;
        let percent = if total == 0 {
            100.0
        } else {
            (current as f64 / total as f64 * 100.0).min(100.0)
        };
        self.last_percent = self.last_percent.max(percent);
        Some(self.last_percent)
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Position to draw on a bar, clamped to the declared total.
    pub fn position(&self) -> u64 {
        match self.total {
            Some(total) => self.transferred.min(total),
            None => self.transferred,
        }
    }
}

/// Terminal progress bar driven by an observed stream.
pub struct BarReporter {
    label: String,
    bar: Option<ProgressBar>,
    state: ProgressState,
}

impl BarReporter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bar: None,
            state: ProgressState::default(),
        }
    }
}

impl ProgressObserver for BarReporter {
    fn start(&mut self, total: Option<u64>) {
        self.state = ProgressState::new(total);
        let bar = match total {
            Some(total) => create_download_bar(total),
            None => create_spinner(&self.label),
        };
        bar.set_message(self.label.clone());
        self.bar = Some(bar);
    }

    fn update(&mut self, current: u64) {
        self.state.advance(current);
        if let Some(bar) = &self.bar {
            bar.set_position(self.state.position());
        }
    }

    fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            if let Some(total) = self.state.total() {
                bar.set_position(total);
            }
            bar.finish();
        }
    }
}

/// Create a spinner for streams of unknown size.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Create a progress bar for downloads.
pub fn create_download_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{bar:40.cyan/blue} | {percent}% || {bytes}/{total_bytes} ({eta})")
    {
        bar.set_style(style.progress_chars("█░"));
    }
    bar
}

/// A byte stream that reports every chunk to a [`ProgressObserver`].
///
/// Chunks pass through unchanged and in order.
pub struct ObservedStream {
    inner: ByteStream,
    observer: Box<dyn ProgressObserver>,
    total: Option<u64>,
    seen: u64,
    started: bool,
    stopped: bool,
}

impl ObservedStream {
    pub fn new(inner: ByteStream, total: Option<u64>, observer: Box<dyn ProgressObserver>) -> Self {
        Self {
            inner,
            observer,
            total,
            seen: 0,
            started: false,
            stopped: false,
        }
    }

    fn finish(&mut self) {
        if self.started && !self.stopped {
            self.stopped = true;
            self.observer.stop();
        }
    }
}

impl Stream for ObservedStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.stopped {
            return Poll::Ready(None);
        }
        if !this.started {
            this.started = true;
            this.observer.start(this.total);
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.seen += chunk.len() as u64;
                this.observer.update(this.seen);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.finish();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish();
                tracing::info!("Downloading finished ({} bytes)", this.seen);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ObservedStream {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Wrap `stream` so that `observer` sees its progress.
pub fn observe(
    stream: ByteStream,
    total: Option<u64>,
    observer: Box<dyn ProgressObserver>,
) -> ByteStream {
    Box::pin(ObservedStream::new(stream, total, observer))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use futures::StreamExt;

    use crate::pipeline::stream::tests::chunks;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Event {
        Start(Option<u64>),
        Update(u64),
        Stop,
    }

    /// Observer that records every event, for assertions.
    #[derive(Clone, Default)]
    pub(crate) struct Recorder(pub Arc<Mutex<Vec<Event>>>);

    impl Recorder {
        pub(crate) fn events(&self) -> Vec<Event> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ProgressObserver for Recorder {
        fn start(&mut self, total: Option<u64>) {
            self.0.lock().unwrap().push(Event::Start(total));
        }
        fn update(&mut self, current: u64) {
            self.0.lock().unwrap().push(Event::Update(current));
        }
        fn stop(&mut self) {
            self.0.lock().unwrap().push(Event::Stop);
        }
    }

    #[tokio::test]
    async fn test_observed_stream_lifecycle() {
        let recorder = Recorder::default();
        let mut stream = observe(chunks(&["abcd", "ef"]), Some(6), Box::new(recorder.clone()));

        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        drop(stream);

        assert_eq!(out, b"abcdef");
        assert_eq!(
            recorder.events(),
            vec![
                Event::Start(Some(6)),
                Event::Update(4),
                Event::Update(6),
                Event::Stop
            ]
        );
    }

    #[tokio::test]
    async fn test_observed_stream_stops_on_drop() {
        let recorder = Recorder::default();
        let mut stream = observe(chunks(&["abcd", "ef"]), None, Box::new(recorder.clone()));
        let _ = stream.next().await;
        drop(stream);

        assert_eq!(recorder.events().last(), Some(&Event::Stop));
    }

    #[test]
    fn test_percentage_clamps_and_is_monotonic() {
        let mut state = ProgressState::new(Some(100));
        assert_eq!(state.advance(10), Some(10.0));
        assert_eq!(state.advance(50), Some(50.0));
        assert_eq!(state.advance(40), Some(50.0));
        assert_eq!(state.advance(250), Some(100.0));
        assert_eq!(state.position(), 100);
        assert_eq!(state.transferred(), 250);
    }

    #[test]
    fn test_percentage_unknown_total() {
        let mut state = ProgressState::new(None);
        assert_eq!(state.advance(10), None);
        assert_eq!(state.position(), 10);
    }

    #[test]
    fn test_bar_reporter_never_panics_without_start() {
        let mut reporter = BarReporter::new("test");
        reporter.update(5);
        reporter.stop();
    }
}
