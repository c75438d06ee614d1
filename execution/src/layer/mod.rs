//! Spin transaction orchestration.
//!
//! Every caller-facing operation runs against a [`Layer`]: an overlay that
//! buffers writes in memory while reads fall through to the backing store.
//! On success the buffered change set is committed to the store in one
//! batch; any error simply drops the overlay, leaving the player untouched.
//! The RTP controllers are fed after the commit, outside the transaction.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;

use reelhouse_types::api::{
    CascadeBonusResponse, CascadeSpinResponse, LineSpinResponse, PlayerData,
};
use reelhouse_types::slots::{CascadeGameState, LineGameState, Player};
use reelhouse_types::store::{Key, Value};
use reelhouse_types::{Amount, UserId};

use crate::rtp::{RtpConfig, RtpController};
use crate::slots::cascade_config::CascadeConfig;
use crate::slots::line_config::LineConfig;
use crate::slots::SpinError;
use crate::state::{State, Status, StoreError};

mod handlers;

/// Transactional overlay over a [`State`]. Reads see the overlay's pending
/// writes first; nothing reaches the store until [`Layer::commit`].
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
        }
    }

    fn stage(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    /// Consume the overlay and return its change set for [`State::apply`].
    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }

    /// Wallet row, defaulting to an empty wallet for first contact.
    pub(crate) async fn player(&self, user: UserId) -> Result<Player, StoreError> {
        Ok(match self.get(&Key::Player(user)).await? {
            Some(Value::Player(player)) => player,
            _ => Player::default(),
        })
    }

    pub(crate) async fn line_state(&self, user: UserId) -> Result<LineGameState, StoreError> {
        Ok(match self.get(&Key::LineState(user)).await? {
            Some(Value::LineState(state)) => state,
            _ => LineGameState::default(),
        })
    }

    pub(crate) async fn cascade_state(&self, user: UserId) -> Result<CascadeGameState, StoreError> {
        Ok(match self.get(&Key::CascadeState(user)).await? {
            Some(Value::CascadeState(state)) => state,
            _ => CascadeGameState::default(),
        })
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Ok(Some(value.clone())),
            Some(Status::Delete) => Ok(None),
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<(), StoreError> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<(), StoreError> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}

/// The Line slot behind the caller-facing `Spin`/`BuyBonus` capability.
pub struct LineService {
    config: LineConfig,
    rtp: Arc<RtpController>,
}

impl LineService {
    pub fn new(config: LineConfig, rtp: Arc<RtpController>) -> Self {
        Self { config, rtp }
    }

    /// Production configuration with its own controller.
    pub fn standard() -> Self {
        let config = LineConfig::standard();
        let rtp = Arc::new(RtpController::new(RtpConfig::standard(
            config.preset_names(),
        )));
        Self::new(config, rtp)
    }

    pub fn controller(&self) -> &Arc<RtpController> {
        &self.rtp
    }

    pub async fn spin<S: State, R: Rng>(
        &self,
        state: &mut S,
        user: UserId,
        bet: Amount,
        rng: &mut R,
    ) -> Result<LineSpinResponse, SpinError> {
        let preset_index = self.rtp.snapshot().preset_index;
        let mut layer = Layer::new(&*state);
        let response = layer
            .handle_line_spin(user, bet, &self.config, preset_index, rng)
            .await?;
        let changes = layer.commit();
        state.apply(changes).await?;

        // Ingest happens outside the transaction; controller trouble never
        // fails a spin.
        self.rtp.record_spin(bet as f64, response.total_payout as f64);
        self.rtp.auto_adjust();
        Ok(response)
    }

    pub async fn buy_bonus<S: State, R: Rng>(
        &self,
        state: &mut S,
        user: UserId,
        bet: Amount,
        rng: &mut R,
    ) -> Result<LineSpinResponse, SpinError> {
        let preset_index = self.rtp.snapshot().preset_index;
        let mut layer = Layer::new(&*state);
        let response = layer
            .handle_line_buy_bonus(user, bet, &self.config, preset_index, rng)
            .await?;
        let changes = layer.commit();
        state.apply(changes).await?;
        Ok(response)
    }

    pub async fn check_data<S: State>(
        &self,
        state: &S,
        user: UserId,
    ) -> Result<PlayerData, SpinError> {
        let layer = Layer::new(state);
        let player = layer.player(user).await?;
        let line_state = layer.line_state(user).await?;
        Ok(PlayerData {
            balance: player.balance,
            free_spin_count: line_state.free_spins,
        })
    }
}

/// The Cascade slot behind the caller-facing `Spin`/`BuyBonus` capability.
pub struct CascadeService {
    config: CascadeConfig,
    rtp: Arc<RtpController>,
}

impl CascadeService {
    pub fn new(config: CascadeConfig, rtp: Arc<RtpController>) -> Self {
        Self { config, rtp }
    }

    /// Production configuration with its own controller.
    pub fn standard() -> Self {
        let config = CascadeConfig::standard();
        let rtp = Arc::new(RtpController::new(RtpConfig::standard(
            config.preset_names(),
        )));
        Self::new(config, rtp)
    }

    pub fn controller(&self) -> &Arc<RtpController> {
        &self.rtp
    }

    pub async fn spin<S: State, R: Rng>(
        &self,
        state: &mut S,
        user: UserId,
        bet: Amount,
        rng: &mut R,
    ) -> Result<CascadeSpinResponse, SpinError> {
        let preset_index = self.rtp.snapshot().preset_index;
        let mut layer = Layer::new(&*state);
        let response = layer
            .handle_cascade_spin(user, bet, &self.config, preset_index, rng)
            .await?;
        let changes = layer.commit();
        state.apply(changes).await?;

        self.rtp.record_spin(bet as f64, response.total_payout as f64);
        self.rtp.auto_adjust();
        Ok(response)
    }

    /// Bonus buy: the request amount is the total cost; no board is spun.
    pub async fn buy_bonus<S: State>(
        &self,
        state: &mut S,
        user: UserId,
        amount: Amount,
    ) -> Result<CascadeBonusResponse, SpinError> {
        let mut layer = Layer::new(&*state);
        let response = layer.handle_cascade_buy_bonus(user, amount).await?;
        let changes = layer.commit();
        state.apply(changes).await?;
        Ok(response)
    }

    pub async fn check_data<S: State>(
        &self,
        state: &S,
        user: UserId,
    ) -> Result<PlayerData, SpinError> {
        let layer = Layer::new(state);
        let player = layer.player(user).await?;
        let cascade_state = layer.cascade_state(user).await?;
        Ok(PlayerData {
            balance: player.balance,
            free_spin_count: cascade_state.free_spins,
        })
    }
}

/// Credit the wallet. Shared by both game surfaces.
pub async fn deposit<S: State>(
    state: &mut S,
    user: UserId,
    amount: Amount,
) -> Result<Amount, SpinError> {
    if amount <= 0 {
        return Err(SpinError::InvalidAmount);
    }
    let mut layer = Layer::new(&*state);
    let mut player = layer.player(user).await?;
    player.credit(amount);
    let balance = player.balance;
    layer.stage(Key::Player(user), Value::Player(player));
    let changes = layer.commit();
    state.apply(changes).await?;
    Ok(balance)
}
