//! Capability bundle handed to the engine
//!
//! Holds the generation client, the deployer, outbound email wiring, the
//! optional durable store and the credit policy. [`Environment::from_config`]
//! assembles it from [`SiteforgeConfig`]; tests build one by hand.

use crate::config::{SiteforgeConfig, StoreConfig};
use crate::credits::{CreditLedger, CreditPolicy};
use crate::delivery::{Notifier, ResendConfig, ResendMailer};
use crate::deploy::{DeployCredentials, SiteDeployer, WranglerConfig, WranglerDeployer};
use crate::error::{Result, SiteforgeError};
use crate::store::StateStore;
use llm::remote::ClaudeClient;
use llm::{ProviderConfig, TextGenerator};
use state_store::{RestKvConfig, RestKvStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Environment {
    pub generator: Arc<dyn TextGenerator>,
    pub deployer: Arc<dyn SiteDeployer>,
    pub notifier: Notifier,
    pub store: Option<StateStore>,
    pub credit_policy: CreditPolicy,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("deploy_credentials", &self.deployer.has_credentials())
            .field("notifier", &self.notifier)
            .field("store", &self.store.is_some())
            .field("credit_policy", &self.credit_policy)
            .finish()
    }
}

impl Environment {
    /// Minimal bundle: no email, no persistence, default credit policy
    pub fn new(generator: Arc<dyn TextGenerator>, deployer: Arc<dyn SiteDeployer>) -> Self {
        Self {
            generator,
            deployer,
            notifier: Notifier::disabled(),
            store: None,
            credit_policy: CreditPolicy::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_credit_policy(mut self, policy: CreditPolicy) -> Self {
        self.credit_policy = policy;
        self
    }

    /// Credit ledger over the configured store, if any
    pub fn ledger(&self) -> Option<CreditLedger> {
        self.store
            .clone()
            .map(|store| CreditLedger::new(store, self.credit_policy.clone()))
    }

    /// Build the bundle from configuration
    ///
    /// A missing generation key is an error. Missing deploy or email
    /// credentials only narrow what a run can do, and a missing store
    /// means runs are not persisted.
    pub fn from_config(config: &SiteforgeConfig) -> Result<Self> {
        let generation = &config.generation;
        let api_key = generation
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SiteforgeError::Config("generation.api_key (ANTHROPIC_API_KEY) is not set".to_string()))?;

        let provider = ProviderConfig::new(api_key, generation.base_url.clone())
            .with_timeout(Duration::from_secs(generation.timeout_secs))
            .with_models(generation.models.clone());
        let provider = match generation.temperature {
            Some(t) => provider.with_temperature(t),
            None => provider,
        };
        let generator = ClaudeClient::new(provider).map_err(|e| SiteforgeError::Config(e.to_string()))?;

        let deploy = &config.deploy;
        let credentials = match (&deploy.api_token, &deploy.account_id) {
            (Some(api_token), Some(account_id)) => Some(DeployCredentials {
                api_token: api_token.clone(),
                account_id: account_id.clone(),
            }),
            _ => {
                warn!("Deploy credentials not configured; sites will not be published");
                None
            }
        };
        let deployer = WranglerDeployer::new(WranglerConfig {
            command: deploy.command.clone(),
            branch: deploy.branch.clone(),
            timeout: Duration::from_secs(deploy.timeout_secs),
            credentials,
        });

        let email = &config.email;
        let notifier = match &email.api_key {
            Some(key) => {
                let mailer = ResendMailer::new(ResendConfig::new(key.clone()).with_base_url(email.base_url.clone()))
                    .map_err(|e| SiteforgeError::Config(e.to_string()))?;
                if email.lead_inbox.is_none() {
                    warn!("email.lead_inbox (LEAD_NOTIFICATION_EMAIL) is not set; lead notices will be skipped");
                }
                Notifier::new(Arc::new(mailer), email.from.clone(), email.lead_inbox.clone())
            }
            None => {
                warn!("Email not configured; notifications will be skipped");
                Notifier::disabled()
            }
        };

        let store = store_from_config(&config.store)?;

        Ok(Self {
            generator: Arc::new(generator),
            deployer: Arc::new(deployer),
            notifier,
            store,
            credit_policy: CreditPolicy {
                initial_credits: config.credits.initial_credits,
                plan: config.credits.plan.clone(),
            },
        })
    }
}

/// Open the durable store when both its URL and token are configured
pub fn store_from_config(config: &StoreConfig) -> Result<Option<StateStore>> {
    match (&config.url, &config.token) {
        (Some(url), Some(token)) => {
            let backend = RestKvStore::new(RestKvConfig {
                url: url.clone(),
                token: token.clone(),
                timeout: Duration::from_secs(config.timeout_secs),
            })?;
            Ok(Some(StateStore::new(Arc::new(backend))))
        }
        _ => {
            info!("No durable store configured; runs will not be persisted");
            Ok(None)
        }
    }
}
