use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Texts used whenever the quote service is unavailable.
pub const FALLBACK_TEXTS: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog. This is a typing test to measure your speed and accuracy. Practice makes perfect when you keep typing consistently every day.",
    "In today's digital world, typing skills are essential for productivity and communication. The more you practice, the faster and more accurate you will become at typing.",
    "Consistency is the key to improving your typing speed and accuracy. Regular daily practice will help you develop muscle memory and increase your words per minute.",
    "Good typing technique involves proper finger placement, maintaining rhythm, and avoiding the hunt-and-peck method. Focus on accuracy first, then speed will naturally follow.",
    "Professional typists can achieve speeds of over one hundred words per minute through dedicated practice and proper technique. Set goals and track your progress regularly.",
];

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("quote service answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("quote service returned no usable quote")]
    Empty,
}

/// Something that can hand out a text to type.
pub trait QuoteProvider: Send + Sync + 'static {
    fn fetch(&self) -> Result<String, QuoteError>;
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    quote: String,
}

/// Quote service reached over HTTPS, authenticated with an `X-Api-Key` header.
#[derive(Debug)]
pub struct ApiQuoteProvider {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl ApiQuoteProvider {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl QuoteProvider for ApiQuoteProvider {
    fn fetch(&self) -> Result<String, QuoteError> {
        let response = self
            .client
            .get(&self.url)
            .header("X-Api-Key", &self.api_key)
            .send()?;
        if !response.status().is_success() {
            return Err(QuoteError::Status(response.status()));
        }
        let entries: Vec<QuoteEntry> = response.json()?;
        first_quote(entries)
    }
}

fn first_quote(entries: Vec<QuoteEntry>) -> Result<String, QuoteError> {
    entries
        .into_iter()
        .next()
        .map(|e| e.quote.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(QuoteError::Empty)
}

/// Fixed local list of texts.
#[derive(Debug, Clone)]
pub struct FallbackQuotes {
    texts: Vec<String>,
}

impl Default for FallbackQuotes {
    fn default() -> Self {
        Self {
            texts: FALLBACK_TEXTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FallbackQuotes {
    pub fn pick(&self) -> String {
        self.texts
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_TEXTS[0].to_string())
    }
}

/// Resolves the next text: custom prompt first, then the provider, then
/// the fallback list. Never yields an empty string.
#[derive(Default)]
pub struct QuoteSource {
    custom_prompt: Option<String>,
    provider: Option<Box<dyn QuoteProvider>>,
    fallback: FallbackQuotes,
}

impl QuoteSource {
    pub fn new(custom_prompt: Option<String>, provider: Option<Box<dyn QuoteProvider>>) -> Self {
        Self {
            custom_prompt: custom_prompt.filter(|p| !p.trim().is_empty()),
            provider,
            fallback: FallbackQuotes::default(),
        }
    }

    pub fn next_text(&self) -> String {
        if let Some(prompt) = &self.custom_prompt {
            return prompt.clone();
        }
        if let Some(provider) = &self.provider {
            match provider.fetch() {
                Ok(quote) => return quote,
                Err(err) => warn!(error = %err, "quote provider failed, using fallback text"),
            }
        }
        self.fallback.pick()
    }
}

/// Resolves texts off the UI thread. Only the most recent request's text is
/// handed out; earlier in-flight requests are dropped on arrival.
pub struct QuoteLoader {
    source: Arc<QuoteSource>,
    tx: Sender<(u64, String)>,
    rx: Receiver<(u64, String)>,
    latest: u64,
    pending: bool,
}

impl QuoteLoader {
    pub fn new(source: QuoteSource) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source: Arc::new(source),
            tx,
            rx,
            latest: 0,
            pending: false,
        }
    }

    pub fn request(&mut self) {
        self.latest += 1;
        self.pending = true;
        let ticket = self.latest;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(ticket, "requesting new text");
        thread::spawn(move || {
            let text = source.next_text();
            let _ = tx.send((ticket, text));
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns the text for the latest request once it has arrived.
    pub fn poll(&mut self) -> Option<String> {
        let mut result = None;
        while let Ok((ticket, text)) = self.rx.try_recv() {
            if ticket == self.latest && self.pending {
                self.pending = false;
                result = Some(text);
            } else {
                debug!(ticket, latest = self.latest, "dropping superseded text");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct Failing;

    impl QuoteProvider for Failing {
        fn fetch(&self) -> Result<String, QuoteError> {
            Err(QuoteError::Empty)
        }
    }

    struct Counting(AtomicUsize);

    impl QuoteProvider for Counting {
        fn fetch(&self) -> Result<String, QuoteError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("quote number {}", n))
        }
    }

    fn wait_for(loader: &mut QuoteLoader) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(text) = loader.poll() {
                return Some(text);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn fallback_pick_is_from_the_list() {
        let text = FallbackQuotes::default().pick();
        assert!(FALLBACK_TEXTS.contains(&text.as_str()));
    }

    #[test]
    fn failing_provider_falls_back() {
        let source = QuoteSource::new(None, Some(Box::new(Failing)));
        let text = source.next_text();
        assert!(FALLBACK_TEXTS.contains(&text.as_str()));
    }

    #[test]
    fn no_provider_uses_fallback() {
        let text = QuoteSource::default().next_text();
        assert!(!text.is_empty());
    }

    #[test]
    fn custom_prompt_wins() {
        let source = QuoteSource::new(
            Some("hello there".to_string()),
            Some(Box::new(Counting(AtomicUsize::new(0)))),
        );
        assert_eq!(source.next_text(), "hello there");
    }

    #[test]
    fn blank_custom_prompt_is_ignored() {
        let source = QuoteSource::new(Some("   ".to_string()), None);
        assert!(FALLBACK_TEXTS.contains(&source.next_text().as_str()));
    }

    #[test]
    fn provider_text_is_used() {
        let source = QuoteSource::new(None, Some(Box::new(Counting(AtomicUsize::new(7)))));
        assert_eq!(source.next_text(), "quote number 7");
    }

    #[test]
    fn first_quote_rejects_empty_payloads() {
        assert!(matches!(first_quote(vec![]), Err(QuoteError::Empty)));
        assert!(matches!(
            first_quote(vec![QuoteEntry {
                quote: "  ".to_string()
            }]),
            Err(QuoteError::Empty)
        ));
        let entries: Vec<QuoteEntry> =
            serde_json::from_str(r#"[{"quote":" Be yourself. ","author":"Wilde"}]"#).unwrap();
        assert_eq!(first_quote(entries).unwrap(), "Be yourself.");
    }

    #[test]
    fn loader_delivers_text() {
        let mut loader = QuoteLoader::new(QuoteSource::new(Some("abc".to_string()), None));
        assert!(!loader.is_pending());

        loader.request();
        assert!(loader.is_pending());
        assert_eq!(wait_for(&mut loader).as_deref(), Some("abc"));
        assert!(!loader.is_pending());
    }

    #[test]
    fn loader_applies_only_the_latest_request() {
        let mut loader = QuoteLoader::new(QuoteSource::new(
            None,
            Some(Box::new(Counting(AtomicUsize::new(0)))),
        ));

        loader.request();
        loader.request();
        assert!(wait_for(&mut loader).is_some());

        // the superseded answer never surfaces
        thread::sleep(Duration::from_millis(50));
        assert_eq!(loader.poll(), None);
        assert!(!loader.is_pending());
    }
}
