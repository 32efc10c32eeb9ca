//! The question/answer exchange engine.
//!
//! One [`ThreadEngine`] owns the active thread, the conversation's chat id,
//! the live-answer buffer and the loading flag.  An exchange moves through
//! [`Phase::Sending`] and [`Phase::Streaming`] to either [`Phase::Settled`]
//! or [`Phase::Failed`].
//!
//! Exchanges are identified by an [`Exchange`] ticket.  Starting a new
//! conversation, opening another thread or switching identity abandons the
//! in-flight exchange: its ticket goes stale and anything it still delivers is
//! discarded instead of landing in a thread that is no longer active.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::StreamExt;
use time::OffsetDateTime;

use crate::backend::ChatBackend;
use crate::history::HistorySyncer;
use crate::observability::{EXCHANGES_FAILED, EXCHANGES_SETTLED, STALE_DELTAS, STREAM_DURATION};
use crate::render::Renderer;
use crate::types::{AskRequest, ContextMode, Message, Thread, Tier};
use crate::{Error, Result};

/// Text that replaces the live answer when an exchange fails.
pub const ERROR_NOTICE: &str = "Error.";

/// Text that replaces the live answer when the user stopped the stream.
pub const INTERRUPTED_NOTICE: &str = "Interrupted.";

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No exchange has run since the thread was (re)set.
    Idle,
    /// The question was accepted; no delta has arrived yet.
    Sending,
    /// At least one delta has arrived.
    Streaming,
    /// The answer was committed into the thread.
    Settled,
    /// The exchange ended with an error notice.
    Failed,
}

/// How a call to [`ThreadEngine::ask`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// The question was empty or whitespace; nothing happened.
    Ignored,
    /// The answer was committed.
    Settled,
    /// The exchange failed; the live answer holds the notice.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatId {
    Unassigned,
    /// Allocated by the client but not yet confirmed by a settled exchange.
    Pending(String),
    Confirmed(String),
}

/// Ticket for one in-flight exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    generation: u64,
    index: usize,
    request: AskRequest,
}

impl Exchange {
    /// The request to send for this exchange.
    pub fn request(&self) -> &AskRequest {
        &self.request
    }

    /// Index of the placeholder message in the thread.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The chat id the question was asked under.
    pub fn chat_id(&self) -> &str {
        &self.request.chat_id
    }
}

/// Drives question/answer exchanges against the active thread.
pub struct ThreadEngine {
    backend: Arc<dyn ChatBackend>,
    thread: Thread,
    chat_id: ChatId,
    live_answer: String,
    loading: bool,
    phase: Phase,
    tier: Tier,
    context: ContextMode,
    generation: u64,
}

impl ThreadEngine {
    /// Creates an engine with an empty thread.
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            thread: Thread::new(),
            chat_id: ChatId::Unassigned,
            live_answer: String::new(),
            loading: false,
            phase: Phase::Idle,
            tier: Tier::default(),
            context: ContextMode::default(),
            generation: 0,
        }
    }

    /// Sets the tier used for new questions.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Sets whether prior turns are sent along with new questions.
    pub fn with_context(mut self, context: ContextMode) -> Self {
        self.context = context;
        self
    }

    /// The active thread.
    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// The confirmed chat id of the active thread, if any.
    pub fn chat_id(&self) -> Option<&str> {
        match &self.chat_id {
            ChatId::Confirmed(id) => Some(id),
            ChatId::Unassigned | ChatId::Pending(_) => None,
        }
    }

    /// The live-answer buffer.
    pub fn live_answer(&self) -> &str {
        &self.live_answer
    }

    /// The answer text to show under the message at `index`.
    ///
    /// Settled messages show their committed answer.  Only the last pending
    /// message shows the live answer, and only while its exchange is loading
    /// or just failed; older pending messages show nothing.
    pub fn answer_view(&self, index: usize) -> &str {
        let Some(message) = self.thread.messages().get(index) else {
            return "";
        };
        if !message.is_pending() {
            return &message.answer;
        }
        let is_last = index + 1 == self.thread.len();
        if is_last && (self.loading || self.phase == Phase::Failed) {
            &self.live_answer
        } else {
            ""
        }
    }

    /// True while an exchange is in flight; the send affordance must be disabled.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The phase of the most recent exchange.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The tier used for new questions.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Changes the tier used for new questions.
    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    /// Whether prior turns are sent along with new questions.
    pub fn context(&self) -> ContextMode {
        self.context
    }

    /// Changes whether prior turns are sent along with new questions.
    pub fn set_context(&mut self, context: ContextMode) {
        self.context = context;
    }

    /// Accepts a question and appends its placeholder to the thread.
    ///
    /// Returns `Ok(None)` without touching any state for an empty or
    /// whitespace-only question, and [`Error::Busy`] while another exchange is
    /// loading.
    pub fn begin(&mut self, question: &str) -> Result<Option<Exchange>> {
        if question.trim().is_empty() {
            return Ok(None);
        }
        if self.loading {
            return Err(Error::busy("an answer is still streaming for this thread"));
        }

        let chat_id = match &self.chat_id {
            ChatId::Pending(id) | ChatId::Confirmed(id) => id.clone(),
            ChatId::Unassigned => {
                let id = allocate_chat_id();
                self.chat_id = ChatId::Pending(id.clone());
                id
            }
        };
        let request = AskRequest::build(&self.thread, question, &chat_id, self.tier, self.context);
        let index = self
            .thread
            .push(Message::placeholder(question, chat_id, self.tier));

        self.live_answer.clear();
        self.loading = true;
        self.phase = Phase::Sending;
        Ok(Some(Exchange {
            generation: self.generation,
            index,
            request,
        }))
    }

    /// Appends a delta to the live answer.
    ///
    /// Returns false, changing nothing, if `exchange` was abandoned.
    pub fn apply_delta(&mut self, exchange: &Exchange, delta: &str) -> bool {
        if !self.is_current(exchange) {
            STALE_DELTAS.click();
            tracing::debug!(index = exchange.index, "discarding delta of an abandoned exchange");
            return false;
        }
        self.live_answer.push_str(delta);
        self.phase = Phase::Streaming;
        true
    }

    /// Commits the live answer into the exchange's placeholder message.
    ///
    /// Returns `Ok(false)` if `exchange` was abandoned.
    pub fn settle(&mut self, exchange: &Exchange) -> Result<bool> {
        if !self.is_current(exchange) {
            return Ok(false);
        }
        let answer = std::mem::take(&mut self.live_answer);
        self.loading = false;
        if let Err(err) = self.thread.commit(exchange.index, answer) {
            self.phase = Phase::Failed;
            return Err(err);
        }
        self.phase = Phase::Settled;
        if let ChatId::Pending(id) = &self.chat_id {
            self.chat_id = ChatId::Confirmed(id.clone());
        }
        EXCHANGES_SETTLED.click();
        Ok(true)
    }

    /// Ends the exchange with `notice` in the live answer.
    ///
    /// The placeholder message keeps its empty answer.  Returns false if
    /// `exchange` was abandoned.
    pub fn fail(&mut self, exchange: &Exchange, notice: &str, err: &Error) -> bool {
        if !self.is_current(exchange) {
            return false;
        }
        tracing::warn!(error = %err, chat_id = exchange.chat_id(), "exchange failed");
        self.live_answer = notice.to_string();
        self.loading = false;
        self.phase = Phase::Failed;
        EXCHANGES_FAILED.click();
        true
    }

    /// Runs a whole exchange: send, stream, commit, then refresh history.
    ///
    /// Transport and status failures do not surface as `Err`; they end the
    /// exchange in [`Phase::Failed`].  `Err` is reserved for rejected input
    /// ([`Error::Busy`]) and internal inconsistencies.
    pub async fn ask(
        &mut self,
        question: &str,
        token: Option<&str>,
        history: &mut HistorySyncer,
        renderer: &mut dyn Renderer,
    ) -> Result<AskOutcome> {
        let Some(exchange) = self.begin(question)? else {
            return Ok(AskOutcome::Ignored);
        };
        renderer.connecting(question, self.tier);

        let started = Instant::now();
        let outcome = self.stream_answer(&exchange, token, renderer).await;
        STREAM_DURATION.add(started.elapsed().as_secs_f64());

        match outcome {
            Ok(()) => {
                if self.settle(&exchange)? {
                    if let Some(message) = self.thread.messages().get(exchange.index) {
                        renderer.settled(message);
                    }
                    history.refresh_summaries(token).await;
                }
                Ok(AskOutcome::Settled)
            }
            Err((notice, err)) => {
                self.fail(&exchange, notice, &err);
                renderer.failed(notice, &err.to_string());
                Ok(AskOutcome::Failed)
            }
        }
    }

    async fn stream_answer(
        &mut self,
        exchange: &Exchange,
        token: Option<&str>,
        renderer: &mut dyn Renderer,
    ) -> std::result::Result<(), (&'static str, Error)> {
        let mut deltas = self
            .backend
            .ask(token, exchange.request())
            .await
            .map_err(|err| (ERROR_NOTICE, err))?;

        while let Some(item) = deltas.next().await {
            let delta = item.map_err(|err| (ERROR_NOTICE, err))?;
            if !self.apply_delta(exchange, &delta) {
                break;
            }
            renderer.live_answer(&delta, &self.live_answer);
            if renderer.should_interrupt() {
                return Err((INTERRUPTED_NOTICE, Error::streaming("stopped by user", None)));
            }
        }
        Ok(())
    }

    /// Replaces the active thread with one fetched from history.
    pub fn load_thread(&mut self, chat_id: &str, messages: Vec<Message>) {
        self.abandon();
        self.thread = Thread::from_messages(messages);
        self.chat_id = ChatId::Confirmed(chat_id.to_string());
        self.live_answer.clear();
    }

    /// Fetches `chat_id` through `history` and makes it the active thread.
    ///
    /// On failure the active thread is left as it was.
    pub async fn open_thread(
        &mut self,
        history: &HistorySyncer,
        token: Option<&str>,
        chat_id: &str,
    ) -> Result<()> {
        let messages = history.load_thread(token, chat_id).await?;
        self.load_thread(chat_id, messages);
        Ok(())
    }

    /// Starts an empty conversation with no chat id.
    pub fn new_conversation(&mut self) {
        self.abandon();
        self.thread = Thread::new();
        self.chat_id = ChatId::Unassigned;
        self.live_answer.clear();
    }

    fn abandon(&mut self) {
        if self.loading {
            tracing::debug!("abandoning in-flight exchange");
        }
        self.generation += 1;
        self.loading = false;
        self.phase = Phase::Idle;
    }

    fn is_current(&self, exchange: &Exchange) -> bool {
        exchange.generation == self.generation
    }
}

/// Allocates a `chat_<unix millis>` id, unique within the process.
fn allocate_chat_id() -> String {
    static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);
    let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).max(0) as u64;
    let prev = LAST_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    format!("chat_{}", now.max(prev + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;
    use crate::render::testing::RecordingRenderer;
    use crate::types::{ChatRole, ChatTurn};

    fn setup() -> (Arc<FakeBackend>, ThreadEngine, HistorySyncer) {
        let backend = Arc::new(FakeBackend::new());
        let engine = ThreadEngine::new(backend.clone());
        let history = HistorySyncer::new(backend.clone());
        (backend, engine, history)
    }

    #[tokio::test]
    async fn blank_question_is_a_no_op() {
        let (backend, mut engine, mut history) = setup();
        let mut renderer = RecordingRenderer::new();
        for question in ["", "   ", "\n\t"] {
            let outcome = engine
                .ask(question, Some("tok"), &mut history, &mut renderer)
                .await
                .unwrap();
            assert_eq!(outcome, AskOutcome::Ignored);
        }
        assert!(engine.thread().is_empty());
        assert!(!engine.is_loading());
        assert_eq!(engine.live_answer(), "");
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(backend.calls().is_empty());
        assert!(renderer.events.is_empty());
    }

    #[tokio::test]
    async fn successful_exchange_commits_answer() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_answer(&["Hel", "lo", ", world"]);
        let mut renderer = RecordingRenderer::new();

        let outcome = engine
            .ask("Say hello", Some("tok"), &mut history, &mut renderer)
            .await
            .unwrap();

        assert_eq!(outcome, AskOutcome::Settled);
        assert_eq!(engine.phase(), Phase::Settled);
        assert_eq!(engine.thread().len(), 1);
        let message = engine.thread().last().unwrap();
        assert_eq!(message.question, "Say hello");
        assert_eq!(message.answer, "Hello, world");
        assert_eq!(engine.live_answer(), "");
        assert!(!engine.is_loading());

        let chat_id = engine.chat_id().unwrap().to_string();
        assert!(chat_id.starts_with("chat_"));
        assert_eq!(message.chat_id, chat_id);
        assert_eq!(
            backend.calls(),
            vec!["POST /ask as tok".to_string(), "GET /history as tok".to_string()]
        );
        assert_eq!(
            renderer.events,
            vec![
                "connecting Say hello (free)".to_string(),
                "delta \"Hel\" -> \"Hel\"".to_string(),
                "delta \"lo\" -> \"Hello\"".to_string(),
                "delta \", world\" -> \"Hello, world\"".to_string(),
                "settled \"Hello, world\"".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn guest_exchange_skips_history_refresh() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_answer(&["hi"]);
        engine
            .ask("hello", None, &mut history, &mut RecordingRenderer::new())
            .await
            .unwrap();
        assert_eq!(backend.calls(), vec!["POST /ask as guest".to_string()]);
        assert_eq!(backend.asked()[0].0, None);
    }

    #[tokio::test]
    async fn chat_id_is_stable_across_exchanges() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_answer(&["one"]);
        backend.queue_answer(&["two"]);
        let mut renderer = RecordingRenderer::new();
        engine.ask("first", None, &mut history, &mut renderer).await.unwrap();
        let id = engine.chat_id().unwrap().to_string();
        engine.ask("second", None, &mut history, &mut renderer).await.unwrap();

        assert_eq!(engine.chat_id(), Some(id.as_str()));
        let asked = backend.asked();
        assert_eq!(asked[0].1.chat_id, id);
        assert_eq!(asked[1].1.chat_id, id);
        assert!(engine.thread().messages().iter().all(|m| m.chat_id == id));
    }

    #[tokio::test]
    async fn transport_failure_sets_notice() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_ask_error(Error::service_unavailable("down", None));
        let mut renderer = RecordingRenderer::new();

        let outcome = engine
            .ask("anyone?", Some("tok"), &mut history, &mut renderer)
            .await
            .unwrap();

        assert_eq!(outcome, AskOutcome::Failed);
        assert_eq!(engine.phase(), Phase::Failed);
        assert_eq!(engine.live_answer(), ERROR_NOTICE);
        assert!(!engine.is_loading());
        assert_eq!(engine.thread().len(), 1);
        assert!(engine.thread().last().unwrap().is_pending());
        assert_eq!(engine.chat_id(), None);
        assert_eq!(backend.calls(), vec!["POST /ask as tok".to_string()]);
        assert_eq!(renderer.events.last().unwrap(), "failed Error.");
    }

    #[tokio::test]
    async fn pending_chat_id_is_reused_after_failure() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_ask_error(Error::connection("refused", None));
        backend.queue_answer(&["ok"]);
        let mut renderer = RecordingRenderer::new();

        engine.ask("first", None, &mut history, &mut renderer).await.unwrap();
        engine.ask("second", None, &mut history, &mut renderer).await.unwrap();

        let asked = backend.asked();
        assert_eq!(asked[0].1.chat_id, asked[1].1.chat_id);
        assert_eq!(engine.chat_id(), Some(asked[0].1.chat_id.as_str()));
    }

    #[tokio::test]
    async fn mid_stream_error_keeps_placeholder_empty() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_stream(vec![
            Ok("partial".to_string()),
            Err(Error::streaming("reset", None)),
        ]);
        let outcome = engine
            .ask("q", Some("tok"), &mut history, &mut RecordingRenderer::new())
            .await
            .unwrap();
        assert_eq!(outcome, AskOutcome::Failed);
        assert_eq!(engine.live_answer(), ERROR_NOTICE);
        assert_eq!(engine.thread().last().unwrap().answer, "");
    }

    #[tokio::test]
    async fn zero_delta_settle_is_not_pending() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_answer(&[]);
        backend.queue_ask_error(Error::connection("refused", None));
        let mut renderer = RecordingRenderer::new();

        let outcome = engine.ask("silent", None, &mut history, &mut renderer).await.unwrap();
        assert_eq!(outcome, AskOutcome::Settled);
        let settled = &engine.thread().messages()[0];
        assert_eq!(settled.answer, "");
        assert!(!settled.is_pending());
        assert!(engine.chat_id().is_some());

        let outcome = engine.ask("broken", None, &mut history, &mut renderer).await.unwrap();
        assert_eq!(outcome, AskOutcome::Failed);
        let failed = &engine.thread().messages()[1];
        assert_eq!(failed.answer, "");
        assert!(failed.is_pending());
    }

    #[test]
    fn second_commit_after_empty_settle_is_refused() {
        let (_, mut engine, _) = setup();
        let exchange = engine.begin("q").unwrap().unwrap();
        assert!(engine.settle(&exchange).unwrap());
        assert_eq!(engine.phase(), Phase::Settled);

        assert!(engine.settle(&exchange).is_err());
        assert_eq!(engine.phase(), Phase::Failed);
        assert!(!engine.is_loading());
        assert_eq!(engine.thread().len(), 1);
        assert_eq!(engine.thread().messages()[0].answer, "");
        assert!(!engine.thread().messages()[0].is_pending());
    }

    #[tokio::test]
    async fn only_last_pending_message_shows_live_answer() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_ask_error(Error::connection("refused", None));
        let mut renderer = RecordingRenderer::new();
        engine.ask("first", None, &mut history, &mut renderer).await.unwrap();
        assert_eq!(engine.answer_view(0), ERROR_NOTICE);

        let exchange = engine.begin("second").unwrap().unwrap();
        assert!(engine.apply_delta(&exchange, "stream"));
        assert_eq!(engine.answer_view(0), "");
        assert_eq!(engine.answer_view(1), "stream");

        assert!(engine.settle(&exchange).unwrap());
        assert_eq!(engine.answer_view(0), "");
        assert_eq!(engine.answer_view(1), "stream");
        assert_eq!(engine.answer_view(2), "");
    }

    #[tokio::test]
    async fn interrupt_stops_reading() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_answer(&["a", "b", "c"]);
        let mut renderer = RecordingRenderer::interrupting_after(1);
        let outcome = engine
            .ask("q", None, &mut history, &mut renderer)
            .await
            .unwrap();
        assert_eq!(outcome, AskOutcome::Failed);
        assert_eq!(engine.live_answer(), INTERRUPTED_NOTICE);
        assert!(!engine.is_loading());
    }

    #[test]
    fn second_question_while_loading_is_rejected() {
        let (_, mut engine, _) = setup();
        let exchange = engine.begin("first").unwrap().unwrap();
        assert!(engine.is_loading());
        assert_eq!(engine.phase(), Phase::Sending);

        let err = engine.begin("second").unwrap_err();
        assert!(err.is_busy());
        assert_eq!(engine.thread().len(), 1);

        assert!(engine.apply_delta(&exchange, "x"));
        assert_eq!(engine.phase(), Phase::Streaming);
        assert!(engine.settle(&exchange).unwrap());
        assert!(engine.begin("second").unwrap().is_some());
    }

    #[test]
    fn abandoned_exchange_is_discarded() {
        let (_, mut engine, _) = setup();
        let exchange = engine.begin("old question").unwrap().unwrap();
        assert!(engine.apply_delta(&exchange, "old "));

        engine.new_conversation();
        assert!(!engine.is_loading());
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.thread().is_empty());
        assert_eq!(engine.live_answer(), "");

        assert!(!engine.apply_delta(&exchange, "stale"));
        assert!(!engine.settle(&exchange).unwrap());
        assert!(!engine.fail(&exchange, ERROR_NOTICE, &Error::unknown("late")));
        assert!(engine.thread().is_empty());
        assert_eq!(engine.live_answer(), "");
        assert_eq!(engine.chat_id(), None);
    }

    #[test]
    fn stale_delta_never_reaches_opened_thread() {
        let (_, mut engine, _) = setup();
        let exchange = engine.begin("q").unwrap().unwrap();

        let stored = Message::answered("old", "answer", "chat_7", Tier::Pro);
        engine.load_thread("chat_7", vec![stored.clone()]);
        assert!(!engine.apply_delta(&exchange, "stale"));
        assert!(!engine.settle(&exchange).unwrap());
        assert_eq!(engine.thread().messages(), &[stored]);
        assert_eq!(engine.chat_id(), Some("chat_7"));
    }

    #[tokio::test]
    async fn open_thread_replaces_and_continues_conversation() {
        let stored = vec![Message::answered("What is 2+2?", "4", "chat_42", Tier::Free)];
        let backend = Arc::new(FakeBackend::new().with_thread("chat_42", stored.clone()));
        let mut engine = ThreadEngine::new(backend.clone());
        let mut history = HistorySyncer::new(backend.clone());

        engine
            .open_thread(&history, Some("tok"), "chat_42")
            .await
            .unwrap();
        assert_eq!(engine.thread().messages(), stored.as_slice());
        assert_eq!(engine.chat_id(), Some("chat_42"));

        backend.queue_answer(&["6"]);
        engine
            .ask("And 3+3?", Some("tok"), &mut history, &mut RecordingRenderer::new())
            .await
            .unwrap();
        let (_, request) = backend.asked().pop().unwrap();
        assert_eq!(request.chat_id, "chat_42");
        assert_eq!(
            request.messages.unwrap(),
            vec![
                ChatTurn::new(ChatRole::User, "What is 2+2?"),
                ChatTurn::new(ChatRole::Assistant, "4"),
                ChatTurn::new(ChatRole::User, "And 3+3?"),
            ]
        );
        assert_eq!(engine.thread().len(), 2);
    }

    #[tokio::test]
    async fn failed_open_leaves_thread_alone() {
        let (backend, mut engine, mut history) = setup();
        backend.queue_answer(&["kept"]);
        engine
            .ask("q", Some("tok"), &mut history, &mut RecordingRenderer::new())
            .await
            .unwrap();

        assert!(engine.open_thread(&history, Some("tok"), "missing").await.is_err());
        assert!(engine.open_thread(&history, None, "missing").await.is_err());
        assert_eq!(engine.thread().last().unwrap().answer, "kept");
    }

    #[test]
    fn question_only_context_and_tier() {
        let (_, engine, _) = setup();
        let mut engine = engine
            .with_context(ContextMode::QuestionOnly)
            .with_tier(Tier::Pro);
        let exchange = engine.begin("deep question").unwrap().unwrap();
        assert_eq!(exchange.request().messages, None);
        assert_eq!(exchange.request().tier, Tier::Pro);
        assert_eq!(engine.thread().last().unwrap().tier, Tier::Pro);
        assert_eq!(exchange.index(), 0);
    }

    #[test]
    fn chat_ids_are_unique() {
        let a = allocate_chat_id();
        let b = allocate_chat_id();
        assert_ne!(a, b);
        assert!(a.starts_with("chat_"));
    }
}
