//! The one owned state container behind the dashboard.
//!
//! Search results reach the session through a [`LocationChannel`] rather than a
//! global event, and every fetch carries a [`RequestTicket`] so a slow response
//! for an old location cannot overwrite a newer one.

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    model::{Coordinates, WeatherState},
    source::WeatherDataSource,
};

/// Single-slot publish/subscribe channel for chosen locations. Subscribers
/// only ever see the newest selection.
#[derive(Debug)]
pub struct LocationChannel {
    tx: watch::Sender<Option<Coordinates>>,
}

impl Default for LocationChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn publish(&self, at: Coordinates) {
        self.tx.send_replace(Some(at));
    }

    pub fn subscribe(&self) -> LocationSubscriber {
        LocationSubscriber { rx: self.tx.subscribe() }
    }
}

#[derive(Debug, Clone)]
pub struct LocationSubscriber {
    rx: watch::Receiver<Option<Coordinates>>,
}

impl LocationSubscriber {
    /// Newest selection not yet seen by this subscriber, without waiting.
    pub fn take(&mut self) -> Option<Coordinates> {
        match self.rx.has_changed() {
            Ok(true) => *self.rx.borrow_and_update(),
            _ => None,
        }
    }

    /// Wait for the next selection. `None` once the channel is gone.
    pub async fn next(&mut self) -> Option<Coordinates> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(at) = *self.rx.borrow_and_update() {
                return Some(at);
            }
        }
    }
}

/// Sequence number for one fetch. The CLI awaits each fetch before issuing
/// the next, so only front-ends that keep several fetches in flight (via
/// [`Session::begin_fetch`] / [`Session::complete`]) ever see
/// [`Completion::Stale`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestTicket {
    seq: u64,
    at: Coordinates,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request was issued; the response was dropped.
    Stale,
    Failed,
}

#[derive(Debug, Default)]
pub struct Session {
    /// Where the current state was observed; only moves when a fetch applies.
    coordinates: Option<Coordinates>,
    state: Option<WeatherState>,
    loading: bool,
    last_error: Option<String>,
    updated_at: Option<DateTime<Local>>,
    issued: u64,
    locations: LocationChannel,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&WeatherState> {
        self.state.as_ref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    pub fn locations(&self) -> &LocationChannel {
        &self.locations
    }

    /// Replace the whole state (god mode, presets).
    pub fn replace(&mut self, state: WeatherState) {
        self.state = Some(state);
        self.updated_at = Some(Local::now());
    }

    /// Start a fetch for `at`. Any ticket issued earlier becomes stale.
    pub fn begin_fetch(&mut self, at: Coordinates) -> RequestTicket {
        self.issued += 1;
        self.loading = true;
        self.last_error = None;

        RequestTicket { seq: self.issued, at }
    }

    pub fn complete(&mut self, ticket: RequestTicket, result: Result<WeatherState>) -> Completion {
        if ticket.seq != self.issued {
            debug!(seq = ticket.seq, newest = self.issued, at = %ticket.at, "dropping stale response");
            return Completion::Stale;
        }

        self.loading = false;

        match result {
            Ok(state) => {
                self.coordinates = Some(ticket.at);
                self.replace(state);
                Completion::Applied
            }
            Err(err) => {
                let msg = format!("{err:#}");
                warn!(error = %msg, at = %ticket.at, "weather fetch failed");
                self.last_error = Some(msg);
                Completion::Failed
            }
        }
    }

    /// Fetch and apply the weather at `at`.
    pub async fn refresh(&mut self, source: &dyn WeatherDataSource, at: Coordinates) -> Completion {
        let ticket = self.begin_fetch(at);
        let result = source.current_weather(at).await.map(WeatherState::from);
        self.complete(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurrentWeather, Place, Source};
    use anyhow::anyhow;
    use async_trait::async_trait;

    const PARIS: Coordinates = Coordinates { lat: 48.8566, lon: 2.3522 };
    const OSLO: Coordinates = Coordinates { lat: 59.9139, lon: 10.7522 };

    fn live(temp: f64) -> WeatherState {
        WeatherState::from(CurrentWeather { temperature: Some(temp), ..Default::default() })
    }

    #[derive(Debug)]
    struct FixedSource(Option<f64>);

    #[async_trait]
    impl WeatherDataSource for FixedSource {
        async fn current_weather(&self, _at: Coordinates) -> Result<CurrentWeather> {
            match self.0 {
                Some(t) => Ok(CurrentWeather { temperature: Some(t), ..Default::default() }),
                None => Err(anyhow!("connection refused")),
            }
        }

        async fn geocode(&self, _query: &str) -> Result<Vec<Place>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn newest_ticket_wins_and_stale_is_dropped() {
        let mut session = Session::new();

        let slow = session.begin_fetch(PARIS);
        let fast = session.begin_fetch(OSLO);

        assert_eq!(session.complete(fast, Ok(live(3.0))), Completion::Applied);
        assert_eq!(session.complete(slow, Ok(live(25.0))), Completion::Stale);

        assert_eq!(session.state().and_then(|s| s.temperature_c), Some(3.0));
        assert_eq!(session.coordinates(), Some(OSLO));
        assert!(!session.is_loading());
    }

    #[test]
    fn stale_completion_keeps_loading_for_newer_request() {
        let mut session = Session::new();

        let old = session.begin_fetch(PARIS);
        let _new = session.begin_fetch(OSLO);

        assert_eq!(session.complete(old, Ok(live(10.0))), Completion::Stale);
        assert!(session.is_loading());
        assert!(session.state().is_none());
    }

    #[test]
    fn failure_clears_loading_and_keeps_previous_state() {
        let mut session = Session::new();

        let first = session.begin_fetch(PARIS);
        session.complete(first, Ok(live(12.0)));

        let second = session.begin_fetch(OSLO);
        assert_eq!(session.complete(second, Err(anyhow!("boom"))), Completion::Failed);

        assert!(!session.is_loading());
        assert_eq!(session.last_error(), Some("boom"));
        assert_eq!(session.state().and_then(|s| s.temperature_c), Some(12.0));
    }

    #[test]
    fn failed_fetch_keeps_coordinates_of_shown_state() {
        let mut session = Session::new();

        let paris = session.begin_fetch(PARIS);
        session.complete(paris, Ok(live(25.0)));

        let oslo = session.begin_fetch(OSLO);
        assert_eq!(session.coordinates(), Some(PARIS));
        assert_eq!(session.complete(oslo, Err(anyhow!("timeout"))), Completion::Failed);

        assert_eq!(session.coordinates(), Some(PARIS));
        assert_eq!(session.state().and_then(|s| s.temperature_c), Some(25.0));
    }

    #[tokio::test]
    async fn refresh_failure_on_first_load_has_no_coordinates() {
        let mut session = Session::new();

        session.refresh(&FixedSource(None), OSLO).await;
        assert_eq!(session.coordinates(), None);
    }

    #[test]
    fn replace_swaps_whole_state() {
        let mut session = Session::new();
        session.replace(live(30.0));

        let manual = crate::preset::Preset::by_id("snow").unwrap().to_state();
        session.replace(manual.clone());

        assert_eq!(session.state(), Some(&manual));
        assert_eq!(session.state().map(|s| s.source), Some(Source::Manual));
        assert!(session.updated_at().is_some());
    }

    #[tokio::test]
    async fn refresh_applies_backend_response() {
        let mut session = Session::new();

        assert_eq!(session.refresh(&FixedSource(Some(26.5)), PARIS).await, Completion::Applied);
        let state = session.state().expect("state set");
        assert_eq!(state.source, Source::Live);
        assert_eq!(state.temperature_c, Some(26.5));
    }

    #[tokio::test]
    async fn refresh_failure_on_first_load_leaves_no_state() {
        let mut session = Session::new();

        assert_eq!(session.refresh(&FixedSource(None), PARIS).await, Completion::Failed);
        assert!(session.state().is_none());
        assert!(session.last_error().unwrap().contains("connection refused"));
    }

    #[test]
    fn subscriber_sees_only_newest_selection() {
        let channel = LocationChannel::new();
        let mut sub = channel.subscribe();

        assert_eq!(sub.take(), None);

        channel.publish(PARIS);
        channel.publish(OSLO);
        assert_eq!(sub.take(), Some(OSLO));
        assert_eq!(sub.take(), None);
    }

    #[tokio::test]
    async fn subscriber_waits_for_next_selection() {
        let session = Session::new();
        let mut sub = session.locations().subscribe();

        session.locations().publish(PARIS);
        assert_eq!(sub.next().await, Some(PARIS));
    }

    #[tokio::test]
    async fn subscriber_ends_when_channel_drops() {
        let channel = LocationChannel::new();
        let mut sub = channel.subscribe();
        drop(channel);

        assert_eq!(sub.next().await, None);
    }
}
