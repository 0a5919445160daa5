//! Vault controller - the user actions
//!
//! Each action checks its preconditions locally, submits at most one write
//! through the gateway and folds the result into the state model. Success
//! means the wallet accepted the transaction; inclusion is not awaited and
//! state changes are applied optimistically.
//!
//! One instance of each action may be in flight. A second call while the
//! first is pending returns [`ActionOutcome::Skipped`] without touching the
//! gateway; without a session it fails with `WalletNotConnected` first.
//! Failures are never retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::deposit::DepositForm;
use super::notify::Notification;
use super::state::{VaultStateModel, VaultStatus, VaultView};
use crate::cipher::FheCipher;
use crate::error::{Error, Result};
use crate::gateway::{ContractGateway, VaultCall};
use crate::types::{ActionKind, ActionOutcome, Address, Currency, DepositRequest, Session, TxReceipt};
use crate::wallet::{ConnectorInfo, WalletProvider};

/// In-flight flags, one per guarded action
#[derive(Debug, Default)]
pub struct PendingActions {
    create: AtomicBool,
    deposit: AtomicBool,
    toggle: AtomicBool,
}

impl PendingActions {
    fn flag(&self, action: ActionKind) -> Option<&AtomicBool> {
        match action {
            ActionKind::Create => Some(&self.create),
            ActionKind::Deposit => Some(&self.deposit),
            ActionKind::Toggle => Some(&self.toggle),
            // Reads are never guarded
            ActionKind::Refresh => None,
        }
    }

    /// Claim `action`; `None` if it is already in flight
    pub fn try_begin(&self, action: ActionKind) -> Option<PendingGuard<'_>> {
        match self.flag(action) {
            Some(flag) => flag
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .ok()
                .map(|_| PendingGuard { flag: Some(flag) }),
            None => Some(PendingGuard { flag: None }),
        }
    }

    pub fn is_pending(&self, action: ActionKind) -> bool {
        self.flag(action)
            .map(|flag| flag.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

/// Clears its flag on every exit path
pub struct PendingGuard<'a> {
    flag: Option<&'a AtomicBool>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(flag) = self.flag {
            flag.store(false, Ordering::Release);
        }
    }
}

/// Drives the vault for one wallet session
pub struct VaultController<G: ContractGateway, C: FheCipher> {
    gateway: Arc<G>,
    cipher: Arc<C>,
    wallet: Arc<dyn WalletProvider>,
    session: RwLock<Session>,
    state: RwLock<VaultStateModel>,
    form: RwLock<DepositForm>,
    pending: PendingActions,
    notifier: Option<UnboundedSender<Notification>>,
    apy_pct: f64,
}

impl<G: ContractGateway, C: FheCipher> VaultController<G, C> {
    pub fn new(gateway: Arc<G>, cipher: Arc<C>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            gateway,
            cipher,
            wallet,
            session: RwLock::new(Session::default()),
            state: RwLock::new(VaultStateModel::new()),
            form: RwLock::new(DepositForm::default()),
            pending: PendingActions::default(),
            notifier: None,
            apy_pct: 0.0,
        }
    }

    /// Deliver one notification per finished action to `notifier`
    pub fn with_notifier(mut self, notifier: UnboundedSender<Notification>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Advertised APY carried into the view
    pub fn with_apy(mut self, apy_pct: f64) -> Self {
        self.apy_pct = apy_pct;
        self
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn status(&self) -> VaultStatus {
        self.state.read().await.status()
    }

    pub fn is_pending(&self, action: ActionKind) -> bool {
        self.pending.is_pending(action)
    }

    /// Current view for rendering
    pub async fn view(&self, reveal: bool) -> VaultView {
        let session = self.session.read().await;
        let state = self.state.read().await;
        state.view(&session, &*self.cipher, reveal, self.apy_pct)
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    pub fn connectors(&self) -> Vec<ConnectorInfo> {
        self.wallet.connectors()
    }

    /// Connect through `connector_id` and load the vault for the new address
    pub async fn connect(&self, connector_id: &str) -> Result<Session> {
        let session = match self.wallet.connect(connector_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Wallet connection via {} failed: {}", connector_id, e);
                return Err(e);
            }
        };

        *self.session.write().await = session.clone();
        // Stale data for a previous address must be gone before anything renders
        self.state.write().await.rebind(session.active_address());

        if let Err(e) = self.refresh().await {
            warn!("Vault not loaded after connect: {}", e);
        }

        Ok(session)
    }

    /// Fresh read for the connected address
    pub async fn refresh(&self) -> Result<VaultStatus> {
        let session = self.session().await;
        if session.active_address().is_none() {
            return Err(Error::WalletNotConnected);
        }

        // The model is only locked around the read, never across it
        let address = self
            .state
            .write()
            .await
            .begin_refresh(&*self.gateway, &session)?;

        let record = self
            .gateway
            .get_vault_info(address)
            .await
            .map_err(|e| action_error(ActionKind::Refresh, e))?;

        let status = self
            .state
            .write()
            .await
            .apply_record(address, record)
            .ok_or_else(|| {
                Error::action_failed(ActionKind::Refresh, "session changed during the read")
            })?;
        debug!("Vault status for {:?}: {}", session.address.map(|a| a.short()), status);
        Ok(status)
    }

    /// Clear the session. Always succeeds locally once connected.
    pub async fn disconnect(&self) -> Result<()> {
        let mut session = self.session.write().await;
        if !session.connected {
            return Err(Error::WalletNotConnected);
        }

        if let Err(e) = self.wallet.disconnect().await {
            warn!("Wallet provider disconnect failed: {}", e);
        }

        *session = Session::default();
        self.state.write().await.reset();
        self.form.write().await.close();
        info!("Disconnected");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Deposit form
    // ---------------------------------------------------------------------

    pub async fn deposit_form(&self) -> DepositForm {
        self.form.read().await.clone()
    }

    pub async fn open_deposit(&self) {
        self.form.write().await.open();
    }

    pub async fn close_deposit(&self) {
        self.form.write().await.close();
    }

    pub async fn set_deposit_amount(&self, amount: impl Into<String>) {
        self.form.write().await.set_amount(amount);
    }

    pub async fn set_deposit_currency(&self, currency: Currency) {
        self.form.write().await.set_currency(currency);
    }

    /// Submit the deposit form
    pub async fn submit_deposit(&self) -> Result<ActionOutcome> {
        let (amount, currency) = {
            let form = self.form.read().await;
            if !form.is_open() {
                return Err(Error::InvalidInput("deposit form is not open".to_string()));
            }
            (form.amount().to_string(), form.currency())
        };

        let outcome = self.deposit(&amount, currency).await?;
        if outcome.receipt().is_some() {
            self.form.write().await.complete();
        }
        Ok(outcome)
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    /// Create a vault with an encrypted zero initial deposit
    pub async fn create_vault(&self) -> Result<ActionOutcome> {
        let result = self.run_create().await;
        self.report(ActionKind::Create, &result, Notification::vault_created);
        result
    }

    /// Deposit `amount_text` of `currency`
    pub async fn deposit(&self, amount_text: &str, currency: Currency) -> Result<ActionOutcome> {
        let mut request = None;
        let result = self.run_deposit(amount_text, currency, &mut request).await;
        self.report(ActionKind::Deposit, &result, || match &request {
            Some(request) => Notification::deposited(request),
            None => Notification::success(ActionKind::Deposit, "Deposit Successful", ""),
        });
        result
    }

    /// Lock or unlock the vault
    pub async fn toggle_lock(&self) -> Result<ActionOutcome> {
        let mut locked = None;
        let result = self.run_toggle(&mut locked).await;
        self.report(ActionKind::Toggle, &result, || {
            Notification::lock_changed(locked.unwrap_or(true))
        });
        result
    }

    async fn run_create(&self) -> Result<ActionOutcome> {
        let from = self.require_address().await?;
        let Some(_guard) = self.pending.try_begin(ActionKind::Create) else {
            debug!("createVault already pending, ignoring");
            return Ok(ActionOutcome::Skipped);
        };

        self.require_gateway()?;

        let input = self
            .cipher
            .encrypt(0.0, Currency::default())
            .await
            .map_err(|e| action_error(ActionKind::Create, e))?;

        let receipt = self
            .submit(ActionKind::Create, from, VaultCall::CreateVault(input))
            .await?;

        if self.state.write().await.mark_created(from) {
            info!("Vault created for {} (optimistic)", from.short());
        }
        Ok(ActionOutcome::Submitted(receipt))
    }

    async fn run_deposit(
        &self,
        amount_text: &str,
        currency: Currency,
        request_out: &mut Option<DepositRequest>,
    ) -> Result<ActionOutcome> {
        let from = self.require_address().await?;
        let Some(_guard) = self.pending.try_begin(ActionKind::Deposit) else {
            debug!("deposit already pending, ignoring");
            return Ok(ActionOutcome::Skipped);
        };

        let request = DepositRequest::parse(amount_text, currency)?;
        self.require_gateway()?;

        debug!("Encrypting deposit with {} cipher", self.cipher.name());
        let input = self
            .cipher
            .encrypt(request.amount, request.currency)
            .await
            .map_err(|e| action_error(ActionKind::Deposit, e))?;

        let receipt = self
            .submit(ActionKind::Deposit, from, VaultCall::Deposit(input))
            .await?;

        info!("Deposited {} {} from {}", request.amount, request.currency, from.short());
        *request_out = Some(request);
        Ok(ActionOutcome::Submitted(receipt))
    }

    async fn run_toggle(&self, locked_out: &mut Option<bool>) -> Result<ActionOutcome> {
        let from = self.require_address().await?;
        let Some(_guard) = self.pending.try_begin(ActionKind::Toggle) else {
            debug!("toggleVaultLock already pending, ignoring");
            return Ok(ActionOutcome::Skipped);
        };

        self.require_gateway()?;

        {
            let state = self.state.read().await;
            if state.bound_address() != Some(from) || !state.has_vault() {
                return Err(Error::VaultNotFound);
            }
        }

        let receipt = self
            .submit(ActionKind::Toggle, from, VaultCall::ToggleVaultLock)
            .await?;

        // Flipped locally, not re-read from chain
        *locked_out = self.state.write().await.toggle_locked(from);
        if let Some(locked) = *locked_out {
            info!("Vault {} (optimistic)", if locked { "locked" } else { "unlocked" });
        }
        Ok(ActionOutcome::Submitted(receipt))
    }

    async fn submit(&self, action: ActionKind, from: Address, call: VaultCall) -> Result<TxReceipt> {
        let tx_hash = self
            .gateway
            .write(from, &call)
            .await
            .map_err(|e| action_error(action, e))?;

        Ok(TxReceipt {
            tx_hash,
            action,
            submitted_at: Utc::now(),
        })
    }

    async fn require_address(&self) -> Result<Address> {
        self.session
            .read()
            .await
            .active_address()
            .ok_or(Error::WalletNotConnected)
    }

    fn require_gateway(&self) -> Result<()> {
        if self.gateway.is_configured() {
            Ok(())
        } else {
            Err(Error::GatewayUnavailable(
                "no contract address configured".to_string(),
            ))
        }
    }

    fn report(
        &self,
        action: ActionKind,
        result: &Result<ActionOutcome>,
        on_success: impl FnOnce() -> Notification,
    ) {
        let notification = match result {
            Ok(ActionOutcome::Submitted(_)) => on_success(),
            Ok(ActionOutcome::Skipped) => return,
            Err(e) => {
                if e.is_user_error() {
                    info!("{} refused: {}", action, e);
                } else {
                    warn!("{} failed: {}", action, e);
                }
                Notification::from_error(action, e)
            }
        };

        if let Some(notifier) = &self.notifier {
            if notifier.send(notification).is_err() {
                debug!("Notification receiver dropped");
            }
        }
    }
}

/// Keep precondition errors as they are; everything else is an action failure
fn action_error(action: ActionKind, error: Error) -> Error {
    match error {
        Error::GatewayUnavailable(_) | Error::ActionFailed { .. } => error,
        other => Error::action_failed(action, other),
    }
}
