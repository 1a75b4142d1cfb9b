//! Host-side glue between a run and everything around it
//!
//! Drains `GameEvent`s after each frame's ticks and turns them into sounds,
//! saved progress, leaderboard entries, quest completions and wallet calls.
//! Wallet outcomes are folded back in from `poll_wallet`.

use std::collections::{HashMap, HashSet};

use crate::audio::{SoundEffect, powerup_pitch};
use crate::contract::{Address, ContractCall, UserStats};
use crate::highscores::HighScores;
use crate::persistence::{KeyValueStore, PlayerProgress};
use crate::platform;
use crate::quests::{QuestBoard, RunRecord};
use crate::settings::Settings;
use crate::shop::{self, PurchaseError, Upgrade};
use crate::sim::{GameEvent, GameState};
use crate::wallet::{RequestId, WalletBridge, WalletError, WalletEvent};

/// A sound to play, with its pitch factor
pub type Cue = (SoundEffect, f32);

pub struct Session {
    store: Box<dyn KeyValueStore>,
    pub progress: PlayerProgress,
    pub settings: Settings,
    pub high_scores: HighScores,
    pub quests: QuestBoard,
    pub wallet: WalletBridge,
    /// Leaderboard rank of the last finished run
    pub last_rank: Option<usize>,
    /// Totals the reward contract holds for the connected account
    pub chain_stats: Option<UserStats>,
    pending_claims: HashMap<RequestId, u64>,
    pending_lifelines: HashSet<RequestId>,
    pending_stats: Option<RequestId>,
}

impl Session {
    pub fn new(store: Box<dyn KeyValueStore>, wallet: WalletBridge) -> Self {
        let progress = PlayerProgress::load(store.as_ref());
        let settings = Settings::load(store.as_ref());
        let high_scores = HighScores::load(store.as_ref());
        let quests = QuestBoard::load(store.as_ref());
        Self {
            store,
            progress,
            settings,
            high_scores,
            quests,
            wallet,
            last_rank: None,
            chain_stats: None,
            pending_claims: HashMap::new(),
            pending_lifelines: HashSet::new(),
            pending_stats: None,
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Apply loadout and effect settings, then reset the run
    pub fn new_run(&self, state: &mut GameState, seed: u64) {
        state.loadout = self.progress.loadout();
        state.shake_enabled = self.settings.effective_screen_shake();
        state.particles.set_max_particles(self.settings.max_particles());
        state.restart(seed);
        log::info!("New run with seed {}", seed);
    }

    /// Handle everything the simulation raised since the last call
    pub fn handle_game_events(&mut self, state: &mut GameState) -> Vec<Cue> {
        let mut cues = Vec::new();
        for event in state.drain_events() {
            if let Some(effect) = SoundEffect::for_event(&event) {
                let pitch = match &event {
                    GameEvent::PowerUpCollected(kind) => powerup_pitch(*kind),
                    _ => 1.0,
                };
                cues.push((effect, pitch));
            }

            match event {
                GameEvent::Revived { .. } => {
                    if self.wallet.is_connected() {
                        if let Err(e) = self.wallet.use_lifeline() {
                            log::warn!("Could not record lifeline use: {}", e);
                        }
                    }
                }
                GameEvent::GameOver {
                    score,
                    distance,
                    coins,
                } => {
                    if self.finish_run(state, score, distance, coins) {
                        cues.push((SoundEffect::HighScore, 1.0));
                    }
                }
                _ => {}
            }
        }
        cues
    }

    /// Fold a finished run into progress, leaderboard and quests. True on a new high score.
    fn finish_run(&mut self, state: &GameState, score: u64, distance: f32, coins: u32) -> bool {
        let new_high = self.progress.record_run(score, &state.stats);
        self.last_rank = self
            .high_scores
            .add_score(score, distance, coins, platform::now_ms());
        let completed = self
            .quests
            .evaluate(&self.progress, &RunRecord { distance, coins });
        if !completed.is_empty() {
            log::info!("Quests ready to claim: {:?}", self.quests.claimable());
        }

        self.progress.save(self.store.as_ref());
        self.high_scores.save(self.store.as_ref());
        self.quests.save(self.store.as_ref());

        if self.wallet.is_connected() {
            if let Err(e) = self.wallet.submit_score(score as f64) {
                log::warn!("Score submission failed: {}", e);
            }
        }
        new_high
    }

    /// Fold wallet outcomes back into the session and run
    pub fn poll_wallet(&mut self, state: &mut GameState) -> Vec<WalletEvent> {
        let events = self.wallet.poll_events();
        for event in &events {
            match event {
                WalletEvent::Completed {
                    request, result, ..
                } => {
                    if self.pending_stats == Some(*request) {
                        self.pending_stats = None;
                        self.apply_chain_stats(state, result);
                    }
                    if let Some(quest_id) = self.pending_claims.remove(request) {
                        if self.quests.mark_claimed(quest_id) {
                            self.quests.save(self.store.as_ref());
                        }
                    }
                    if self.pending_lifelines.remove(request) {
                        state.lifelines += 1;
                        log::info!("Lifeline bought ({} available)", state.lifelines);
                    }
                }
                WalletEvent::Failed { request, .. } => {
                    self.pending_claims.remove(request);
                    self.pending_lifelines.remove(request);
                    if self.pending_stats == Some(*request) {
                        self.pending_stats = None;
                    }
                }
                WalletEvent::Connected { account, .. } => self.request_chain_stats(account),
                WalletEvent::Disconnected { .. } => {
                    self.chain_stats = None;
                    self.pending_stats = None;
                }
            }
        }
        events
    }

    /// Ask the contract for the account's totals. Only EVM-style accounts can be queried.
    fn request_chain_stats(&mut self, account: &str) {
        let Ok(user) = Address::parse(account) else {
            log::info!("Account {} has no EVM address, skipping on-chain stats", account);
            return;
        };
        match self.wallet.call(ContractCall::GetUserStats { user }) {
            Ok(request) => self.pending_stats = Some(request),
            Err(e) => log::warn!("Could not fetch on-chain stats: {}", e),
        }
    }

    fn apply_chain_stats(&mut self, state: &mut GameState, result: &str) {
        match UserStats::from_return_hex(result) {
            Ok(stats) => {
                state.lifelines = u32::try_from(stats.lifelines).unwrap_or(u32::MAX);
                log::info!(
                    "On-chain stats: high score {}, {} lifelines",
                    stats.high_score,
                    stats.lifelines
                );
                self.chain_stats = Some(stats);
            }
            Err(e) => log::warn!("Malformed getUserStats reply: {}", e),
        }
    }

    /// Claim every completed, unclaimed quest. Returns the number of claims sent.
    pub fn claim_quests(&mut self) -> Result<usize, WalletError> {
        let mut sent = 0;
        for quest_id in self.quests.claimable() {
            if self.pending_claims.values().any(|id| *id == quest_id) {
                continue;
            }
            let request = self.wallet.claim_quest(quest_id as f64)?;
            self.pending_claims.insert(request, quest_id);
            sent += 1;
        }
        Ok(sent)
    }

    pub fn buy_lifeline(&mut self) -> Result<RequestId, WalletError> {
        let request = self.wallet.buy_lifeline()?;
        self.pending_lifelines.insert(request);
        Ok(request)
    }

    /// Disconnect and forget the SDK's cached pairing
    pub fn disconnect_wallet(&mut self) {
        if let Err(e) = self.wallet.disconnect() {
            log::warn!("Wallet disconnect failed: {}", e);
        }
        PlayerProgress::clear_wallet_pairing(self.store.as_ref());
    }

    pub fn purchase(&mut self, upgrade: Upgrade) -> Result<u8, PurchaseError> {
        let level = shop::purchase(&mut self.progress, upgrade)?;
        self.progress.save(self.store.as_ref());
        Ok(level)
    }

    /// Flip `pageMuted` and persist it. Returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        self.progress.muted = !self.progress.muted;
        self.progress.save(self.store.as_ref());
        self.progress.muted
    }

    pub fn save_settings(&self) {
        self.settings.save(self.store.as_ref());
    }
}
