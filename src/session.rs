//! Application context wiring the ledger services to injected collaborators.

use std::sync::Arc;

use saldo_config::Config;
use saldo_core::{
    AuthProvider, BalanceCache, Clock, Collections, DocumentStore, LedgerStore, MoneyFormat,
    ProfileService, RecentSummary, ReportService,
};

use crate::SaldoError;

/// Services for one signed-in device, built from a [`Config`] and the remote
/// collaborators. Consumers receive the session explicitly.
pub struct Session {
    config: Config,
    money: MoneyFormat,
    ledger: LedgerStore,
    profiles: ProfileService,
}

impl Session {
    pub fn new(
        config: Config,
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SaldoError> {
        config.validate()?;
        let collections = Collections {
            transactions: config.transactions_collection.clone(),
            users: config.users_collection.clone(),
        };
        let profiles = ProfileService::new(
            documents.clone(),
            auth.clone(),
            clock.clone(),
            collections.users.clone(),
        );
        let ledger = LedgerStore::new(documents, auth, clock, collections);
        let money = MoneyFormat::new(config.currency_symbol.clone(), config.decimal_separator);
        tracing::debug!(locale = %config.locale, currency = %config.currency, "session created");
        Ok(Self {
            config,
            money,
            ledger,
            profiles,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn balance_cache(&self) -> &BalanceCache {
        self.ledger.balance_cache()
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn money_format(&self) -> &MoneyFormat {
        &self.money
    }

    /// Formatted net balance of the local view.
    pub fn balance_label(&self) -> String {
        self.money.format(self.ledger.projection().net)
    }

    pub fn recent_summary(&self) -> RecentSummary {
        ReportService::recent_summary(&self.ledger.transactions(), self.config.recent_window)
    }

    pub fn share_text(&self) -> String {
        self.recent_summary().share_text(&self.money)
    }

    /// Net balance phrased for sharing outside the app.
    pub fn balance_share_text(&self) -> String {
        ReportService::balance_share_text(self.ledger.projection().net, &self.money)
    }
}
