//! Wallet bridge
//!
//! The game never talks to a chain itself. It asks a `WalletBackend` to
//! perform an action and later receives the outcome as a `WalletEvent`
//! through a shared queue drained once per frame.
//!
//! Backends:
//! - `FallbackBackend`: no wallet layer on the page; connect is refused
//! - `ReactWalletBackend` (wasm): forwards to `window.reactWalletFunctions`

#[cfg(target_arch = "wasm32")]
pub mod react;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use thiserror::Error;

use crate::contract::ContractCall;

#[cfg(target_arch = "wasm32")]
pub use react::ReactWalletBackend;

/// Why a wallet request was refused up front
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet not connected")]
    NotConnected,
    #[error("invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: String },
    #[error("wallet bridge unavailable")]
    Unavailable,
    #[error("wallet rejected the request: {0}")]
    Rejected(String),
}

/// Connection snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletStatus {
    pub connected: bool,
    /// Account id / address as reported by the wallet
    pub account: Option<String>,
}

/// Handle for matching an outcome to its request
pub type RequestId = u32;

/// Asynchronous outcome of a wallet request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connected { request: RequestId, account: String },
    Disconnected { request: RequestId },
    /// Transaction accepted (or view call answered)
    Completed {
        request: RequestId,
        function: &'static str,
        result: String,
    },
    Failed {
        request: RequestId,
        action: &'static str,
        reason: String,
    },
}

/// Queue shared between the bridge and its backend's callbacks
pub type EventQueue = Rc<RefCell<VecDeque<WalletEvent>>>;

/// Something that can carry wallet requests to a real wallet
pub trait WalletBackend {
    fn name(&self) -> &'static str;

    /// Start pairing; outcome arrives as `Connected` or `Failed`
    fn connect(&mut self, request: RequestId) -> Result<(), WalletError>;

    fn disconnect(&mut self, request: RequestId) -> Result<(), WalletError>;

    /// Current connection as the wallet layer sees it
    fn status(&self) -> WalletStatus;

    /// Send a contract call; outcome arrives as `Completed` or `Failed`
    fn send(&mut self, request: RequestId, call: &ContractCall) -> Result<(), WalletError>;
}

/// Used when the page has no wallet layer
pub struct FallbackBackend {
    events: EventQueue,
}

impl FallbackBackend {
    pub fn new(events: EventQueue) -> Self {
        Self { events }
    }
}

impl WalletBackend for FallbackBackend {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn connect(&mut self, _request: RequestId) -> Result<(), WalletError> {
        Err(WalletError::Unavailable)
    }

    fn disconnect(&mut self, request: RequestId) -> Result<(), WalletError> {
        self.events
            .borrow_mut()
            .push_back(WalletEvent::Disconnected { request });
        Ok(())
    }

    fn status(&self) -> WalletStatus {
        WalletStatus::default()
    }

    fn send(&mut self, _request: RequestId, _call: &ContractCall) -> Result<(), WalletError> {
        Err(WalletError::Unavailable)
    }
}

/// `reactWalletFunctions` entry that carries a call. Views and admin calls
/// share the generic `contractCall`.
pub fn entry_point(call: &ContractCall) -> &'static str {
    match call {
        ContractCall::SubmitGameScore { .. } => "submitScore",
        ContractCall::ClaimQuestReward { .. } => "claimQuest",
        ContractCall::BuyLifeline => "buyLifeline",
        ContractCall::UseLifeline => "useLifeline",
        _ => "contractCall",
    }
}

/// Coerce a number from the game/UI to a non-negative integer.
/// Negative values clamp to zero; NaN and infinities are rejected.
pub fn normalize_count(field: &'static str, raw: f64) -> Result<u64, WalletError> {
    if !raw.is_finite() {
        return Err(WalletError::InvalidInput {
            field,
            value: raw.to_string(),
        });
    }
    if raw >= u64::MAX as f64 {
        return Err(WalletError::InvalidInput {
            field,
            value: raw.to_string(),
        });
    }
    Ok(raw.max(0.0).trunc() as u64)
}

/// Game-facing wallet API
pub struct WalletBridge {
    backend: Box<dyn WalletBackend>,
    events: EventQueue,
    status: WalletStatus,
    next_request: RequestId,
}

impl WalletBridge {
    pub fn new(backend: Box<dyn WalletBackend>, events: EventQueue) -> Self {
        let status = backend.status();
        log::info!("Wallet bridge using {} backend", backend.name());
        Self {
            backend,
            events,
            status,
            next_request: 1,
        }
    }

    /// Bridge with no wallet layer behind it
    pub fn fallback() -> Self {
        let events = EventQueue::default();
        Self::new(Box::new(FallbackBackend::new(events.clone())), events)
    }

    /// React wallet layer when the page provides one, otherwise the fallback
    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Self {
        let events = EventQueue::default();
        match ReactWalletBackend::detect(events.clone()) {
            Some(backend) => Self::new(Box::new(backend), events),
            None => {
                log::warn!("window.reactWalletFunctions missing - wallet features disabled");
                Self::new(Box::new(FallbackBackend::new(events.clone())), events)
            }
        }
    }

    fn allocate_request(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request = self.next_request.wrapping_add(1).max(1);
        id
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn status(&self) -> &WalletStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status.connected
    }

    /// Re-read the connection from the wallet layer, which can pair or drop
    /// the session through its own UI without raising an event here
    pub fn refresh_status(&mut self) -> &WalletStatus {
        let live = self.backend.status();
        if live.connected != self.status.connected {
            log::info!("Wallet layer reports connected={}", live.connected);
        }
        // Keep the account learned from a `Connected` event if the layer omits it
        let account = match (live.connected, live.account) {
            (true, None) => self.status.account.take(),
            (true, account) => account,
            (false, _) => None,
        };
        self.status = WalletStatus {
            connected: live.connected,
            account,
        };
        &self.status
    }

    pub fn connect(&mut self) -> Result<RequestId, WalletError> {
        let request = self.allocate_request();
        self.backend.connect(request).inspect_err(|e| {
            log::warn!("Wallet connect failed: {}", e);
        })?;
        Ok(request)
    }

    pub fn disconnect(&mut self) -> Result<RequestId, WalletError> {
        let request = self.allocate_request();
        self.backend.disconnect(request)?;
        self.status = WalletStatus::default();
        Ok(request)
    }

    /// Submit a finished run's score
    pub fn submit_score(&mut self, score: f64) -> Result<RequestId, WalletError> {
        self.require_connected("submit score")?;
        let score = normalize_count("score", score).inspect_err(|e| log::error!("{}", e))?;
        self.send(ContractCall::SubmitGameScore { score })
    }

    /// Claim the reward of a completed quest
    pub fn claim_quest(&mut self, quest_id: f64) -> Result<RequestId, WalletError> {
        self.require_connected("claim quest")?;
        let quest_id =
            normalize_count("quest id", quest_id).inspect_err(|e| log::error!("{}", e))?;
        self.send(ContractCall::ClaimQuestReward { quest_id })
    }

    pub fn buy_lifeline(&mut self) -> Result<RequestId, WalletError> {
        self.require_connected("buy lifeline")?;
        self.send(ContractCall::BuyLifeline)
    }

    /// Record on-chain that a lifeline was spent
    pub fn use_lifeline(&mut self) -> Result<RequestId, WalletError> {
        self.require_connected("use lifeline")?;
        self.send(ContractCall::UseLifeline)
    }

    /// Any other contract call (views, admin)
    pub fn call(&mut self, call: ContractCall) -> Result<RequestId, WalletError> {
        self.require_connected(call.function_name())?;
        self.send(call)
    }

    fn require_connected(&mut self, action: &str) -> Result<(), WalletError> {
        if self.refresh_status().connected {
            Ok(())
        } else {
            log::warn!("Cannot {}: wallet not connected", action);
            Err(WalletError::NotConnected)
        }
    }

    fn send(&mut self, call: ContractCall) -> Result<RequestId, WalletError> {
        let request = self.allocate_request();
        log::info!(
            "Wallet request {}: {} {}",
            request,
            call.signature(),
            call.calldata_hex()
        );
        self.backend.send(request, &call)?;
        Ok(request)
    }

    /// Drain outcomes delivered since the last poll, updating the cached status
    pub fn poll_events(&mut self) -> Vec<WalletEvent> {
        self.refresh_status();
        let events: Vec<WalletEvent> = self.events.borrow_mut().drain(..).collect();
        for event in &events {
            match event {
                WalletEvent::Connected { account, .. } => {
                    log::info!("Wallet connected: {}", account);
                    self.status = WalletStatus {
                        connected: true,
                        account: Some(account.clone()),
                    };
                }
                WalletEvent::Disconnected { .. } => {
                    self.status = WalletStatus::default();
                }
                WalletEvent::Completed {
                    request, function, ..
                } => {
                    log::info!("Wallet request {} ({}) completed", request, function);
                }
                WalletEvent::Failed {
                    request,
                    action,
                    reason,
                } => {
                    log::warn!("Wallet request {} ({}) failed: {}", request, action, reason);
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Records every call and answers connects immediately
    struct RecordingBackend {
        events: EventQueue,
        sent: Rc<RefCell<Vec<ContractCall>>>,
        /// Shared so a test can flip it the way the page's own UI would
        connected: Rc<Cell<bool>>,
    }

    impl WalletBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn connect(&mut self, request: RequestId) -> Result<(), WalletError> {
            self.connected.set(true);
            self.events.borrow_mut().push_back(WalletEvent::Connected {
                request,
                account: "0.0.1234".to_string(),
            });
            Ok(())
        }

        fn disconnect(&mut self, request: RequestId) -> Result<(), WalletError> {
            self.connected.set(false);
            self.events
                .borrow_mut()
                .push_back(WalletEvent::Disconnected { request });
            Ok(())
        }

        fn status(&self) -> WalletStatus {
            WalletStatus {
                connected: self.connected.get(),
                account: None,
            }
        }

        fn send(&mut self, request: RequestId, call: &ContractCall) -> Result<(), WalletError> {
            self.sent.borrow_mut().push(call.clone());
            self.events.borrow_mut().push_back(WalletEvent::Completed {
                request,
                function: call.function_name(),
                result: "0xabc".to_string(),
            });
            Ok(())
        }
    }

    type Sent = Rc<RefCell<Vec<ContractCall>>>;

    fn recording_bridge_with_link() -> (WalletBridge, Sent, Rc<Cell<bool>>) {
        let events = EventQueue::default();
        let sent = Rc::new(RefCell::new(Vec::new()));
        let connected = Rc::new(Cell::new(false));
        let backend = RecordingBackend {
            events: events.clone(),
            sent: sent.clone(),
            connected: connected.clone(),
        };
        (WalletBridge::new(Box::new(backend), events), sent, connected)
    }

    fn recording_bridge() -> (WalletBridge, Sent) {
        let (bridge, sent, _) = recording_bridge_with_link();
        (bridge, sent)
    }

    #[test]
    fn test_disconnected_calls_never_reach_backend() {
        let (mut bridge, sent) = recording_bridge();
        assert_eq!(bridge.submit_score(100.0), Err(WalletError::NotConnected));
        assert_eq!(bridge.claim_quest(1.0), Err(WalletError::NotConnected));
        assert_eq!(bridge.buy_lifeline(), Err(WalletError::NotConnected));
        assert_eq!(bridge.use_lifeline(), Err(WalletError::NotConnected));
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_connect_then_submit() {
        let (mut bridge, sent) = recording_bridge();
        bridge.connect().unwrap();
        // Not connected until the outcome is polled
        assert!(!bridge.is_connected());
        let events = bridge.poll_events();
        assert!(matches!(events[0], WalletEvent::Connected { .. }));
        assert!(bridge.is_connected());
        assert_eq!(bridge.status().account.as_deref(), Some("0.0.1234"));

        let request = bridge.submit_score(4321.9).unwrap();
        assert_eq!(
            sent.borrow().as_slice(),
            &[ContractCall::SubmitGameScore { score: 4321 }]
        );
        let events = bridge.poll_events();
        assert_eq!(
            events,
            vec![WalletEvent::Completed {
                request,
                function: "submitGameScore",
                result: "0xabc".to_string(),
            }]
        );
    }

    #[test]
    fn test_input_normalization() {
        assert_eq!(normalize_count("score", 12.7), Ok(12));
        assert_eq!(normalize_count("score", -3.0), Ok(0));
        assert!(matches!(
            normalize_count("score", f64::NAN),
            Err(WalletError::InvalidInput { field: "score", .. })
        ));
        assert!(normalize_count("quest id", f64::INFINITY).is_err());
        assert!(normalize_count("quest id", 1.0e30).is_err());
    }

    #[test]
    fn test_invalid_input_not_sent() {
        let (mut bridge, sent) = recording_bridge();
        bridge.connect().unwrap();
        bridge.poll_events();
        assert!(bridge.claim_quest(f64::NAN).is_err());
        assert!(sent.borrow().is_empty());
        bridge.claim_quest(3.0).unwrap();
        assert_eq!(
            sent.borrow().as_slice(),
            &[ContractCall::ClaimQuestReward { quest_id: 3 }]
        );
    }

    #[test]
    fn test_disconnect_clears_status() {
        let (mut bridge, _sent) = recording_bridge();
        bridge.connect().unwrap();
        bridge.poll_events();
        bridge.disconnect().unwrap();
        assert!(!bridge.is_connected());
        assert_eq!(bridge.buy_lifeline(), Err(WalletError::NotConnected));
    }

    #[test]
    fn test_fallback_bridge() {
        let mut bridge = WalletBridge::fallback();
        assert_eq!(bridge.backend_name(), "fallback");
        assert_eq!(bridge.connect(), Err(WalletError::Unavailable));
        assert!(!bridge.is_connected());
        // Disconnect is a harmless no-op
        assert!(bridge.disconnect().is_ok());
        assert!(matches!(
            bridge.poll_events().as_slice(),
            [WalletEvent::Disconnected { .. }]
        ));
        assert_eq!(bridge.submit_score(10.0), Err(WalletError::NotConnected));
    }

    #[test]
    fn test_status_follows_wallet_layer() {
        let (mut bridge, sent, live) = recording_bridge_with_link();
        assert!(!bridge.is_connected());

        // Paired through the page's own UI, no event raised
        live.set(true);
        bridge.submit_score(500.0).unwrap();
        assert_eq!(
            sent.borrow().as_slice(),
            &[ContractCall::SubmitGameScore { score: 500 }]
        );
        assert!(bridge.is_connected());

        // Session dropped on the page side
        live.set(false);
        assert_eq!(bridge.buy_lifeline(), Err(WalletError::NotConnected));
        assert_eq!(sent.borrow().len(), 1);

        live.set(true);
        bridge.poll_events();
        assert!(bridge.is_connected());
    }

    #[test]
    fn test_entry_points() {
        assert_eq!(entry_point(&ContractCall::SubmitGameScore { score: 1 }), "submitScore");
        assert_eq!(entry_point(&ContractCall::ClaimQuestReward { quest_id: 2 }), "claimQuest");
        assert_eq!(entry_point(&ContractCall::BuyLifeline), "buyLifeline");
        // Spent on every revive, so it needs its own entry
        assert_eq!(entry_point(&ContractCall::UseLifeline), "useLifeline");
        assert_eq!(entry_point(&ContractCall::GetTotalQuests), "contractCall");
        assert_eq!(
            entry_point(&ContractCall::SetLifelineCost { cost: 5 }),
            "contractCall"
        );
    }

    #[test]
    fn test_request_ids_are_unique() {
        let (mut bridge, _sent) = recording_bridge();
        let a = bridge.connect().unwrap();
        bridge.poll_events();
        let b = bridge.buy_lifeline().unwrap();
        let c = bridge.use_lifeline().unwrap();
        assert!(a != b && b != c && a != c);
    }
}
