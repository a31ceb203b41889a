//! Governance proposal page: proposal details, the approve/reject modal and
//! vote submission.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::error::{NetworkError, ValidationError, WalletError};
use crate::ledger_sign::SigningMethod;
use crate::network::{GovernanceQueries, Refetch, TransactionSubmitter};
use crate::state::StateContainer;
use crate::tracker::TransactionTracker;

pub const VOTE_PENDING_MESSAGE: &str = "Voting...";
pub const VOTE_SUMMARY_MESSAGE: &str = "Voted.";

/// Which confirmation modal is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalStatus {
    #[default]
    None,
    Approve,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInfo {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub status: String,
    /// Share of the voting weight that approved, in percent
    #[serde(rename = "for")]
    pub for_percent: Decimal,
    /// Share of the voting weight that rejected, in percent
    #[serde(rename = "against")]
    pub against_percent: Decimal,
    pub unique_approve_voters: u64,
    pub unique_reject_voters: u64,
    pub snapshot_day: u64,
    pub start_day: u64,
    pub end_day: u64,
}

impl ProposalInfo {
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }

    pub fn voted_percentage(&self) -> Decimal {
        self.for_percent.saturating_add(self.against_percent)
    }

    pub fn voter_count(&self) -> u64 {
        self.unique_approve_voters
            .saturating_add(self.unique_reject_voters)
    }
}

#[derive(Clone)]
pub struct ProposalVote {
    proposal_id: u64,
    proposal: StateContainer<Option<ProposalInfo>>,
    modal: StateContainer<ModalStatus>,
}

impl ProposalVote {
    pub fn new(proposal_id: u64) -> Self {
        Self {
            proposal_id,
            proposal: StateContainer::default(),
            modal: StateContainer::default(),
        }
    }

    pub fn proposal_id(&self) -> u64 {
        self.proposal_id
    }

    pub fn proposal(&self) -> Option<ProposalInfo> {
        self.proposal.get()
    }

    pub fn subscribe_proposal(&self) -> watch::Receiver<Option<ProposalInfo>> {
        self.proposal.subscribe()
    }

    pub fn modal_status(&self) -> ModalStatus {
        self.modal.get()
    }

    pub fn approve(&self) {
        self.modal.set(ModalStatus::Approve);
    }

    pub fn reject(&self) {
        self.modal.set(ModalStatus::Reject);
    }

    pub fn cancel(&self) {
        self.modal.set(ModalStatus::None);
    }

    pub fn is_active(&self) -> bool {
        self.proposal
            .with(|p| p.as_ref().map(ProposalInfo::is_active).unwrap_or(false))
    }

    pub async fn fetch(
        &self,
        queries: &dyn GovernanceQueries,
    ) -> Result<ProposalInfo, NetworkError> {
        let proposal = queries.get_proposal(self.proposal_id).await?;
        info!(
            "Proposal {} ({}): {}% voted by {} voters",
            proposal.id,
            proposal.status,
            proposal.voted_percentage(),
            proposal.voter_count()
        );
        self.proposal.set(Some(proposal.clone()));
        Ok(proposal)
    }

    /// Cast the vote picked in the modal and start tracking it. The modal is
    /// closed once the network accepted the transaction.
    pub async fn submit_vote(
        &self,
        account: &str,
        submitter: &dyn TransactionSubmitter,
        tracker: &TransactionTracker,
        signing: SigningMethod,
    ) -> Result<String, WalletError> {
        let approve = match self.modal_status() {
            ModalStatus::Approve => true,
            ModalStatus::Reject => false,
            ModalStatus::None => return Err(ValidationError::NoVoteSelected.into()),
        };
        let name = self
            .proposal
            .with(|p| p.as_ref().map(|p| p.name.clone()))
            .ok_or(ValidationError::ProposalUnavailable(self.proposal_id))?;

        let hash = tracker
            .submit(
                signing,
                VOTE_PENDING_MESSAGE,
                VOTE_SUMMARY_MESSAGE,
                submitter.cast_vote(account, &name, approve),
            )
            .await?;

        self.cancel();
        Ok(hash)
    }
}

/// Refetch hook reloading the proposal after the vote was confirmed.
pub struct ProposalRefetch {
    vote: ProposalVote,
    queries: Arc<dyn GovernanceQueries>,
}

impl ProposalRefetch {
    pub fn new(vote: ProposalVote, queries: Arc<dyn GovernanceQueries>) -> Self {
        Self { vote, queries }
    }
}

#[async_trait]
impl Refetch for ProposalRefetch {
    fn name(&self) -> &str {
        "proposal"
    }

    async fn refetch(&self) -> anyhow::Result<()> {
        self.vote.fetch(self.queries.as_ref()).await?;
        Ok(())
    }
}
