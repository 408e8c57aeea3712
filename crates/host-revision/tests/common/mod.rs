//! Shared fixtures: a host with one obligation, and a scripted renter that
//! speaks the protocol over an in-memory pipe.

#![allow(dead_code)]

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use host_revision::application::{
    read_object, read_response, write_accept, write_object, write_rejection, write_stop,
};
use host_revision::{
    process_modifications, verify_settings, BatchOutcome, HostRevisionService, HostSettings,
    InMemoryObligationStore, MockSectorStore, Modification, NegotiationConn, NegotiationResponse,
    ProcessingContext, RecentRevision, RevisionAction, RevisionConfig, SessionError,
    SessionOutcome, SharedHostState, SignedSettings, StorageObligation, StreamConn,
    TESTING_SECTOR_SIZE,
};
use shared_types::{
    contract_root, decode, public_key, sign_hash, ContractId, CoveredFields, Currency,
    FileContractRevision, Hash, PublicKey, Transaction, TransactionSignature, UnlockConditions,
    RENTER_KEY_INDEX,
};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

/// Chain height the host runs at.
pub const HEIGHT: u64 = 10;

/// Contract every harness serves.
pub const CONTRACT_ID: ContractId = [0x42; 32];

/// Proof deadline of the contract.
pub const WINDOW_START: u64 = 100;

/// Distinct full sector for a fill byte.
pub fn sector(fill: u8) -> Vec<u8> {
    vec![fill; TESTING_SECTOR_SIZE as usize]
}

/// Renter's signature entry over revision 0 of a one-revision transaction.
pub fn renter_signature(revision: &FileContractRevision, key: &SigningKey) -> TransactionSignature {
    let mut entry = TransactionSignature {
        parent_id: revision.parent_id,
        public_key_index: RENTER_KEY_INDEX,
        timelock: 0,
        covered_fields: CoveredFields::revision_only(0),
        signature: Vec::new(),
    };
    let txn = Transaction {
        file_contract_revisions: vec![revision.clone()],
        transaction_signatures: vec![entry.clone()],
    };
    let hash = txn.sig_hash(0).expect("sig hash");
    entry.signature = sign_hash(&hash, key).0.to_vec();
    entry
}

/// A host serving one obligation, and the renter's keys for it.
pub struct Harness {
    pub service: Arc<HostRevisionService>,
    pub store: Arc<InMemoryObligationStore>,
    pub renter_key: SigningKey,
    pub host_key: PublicKey,
    pub initial: Vec<Vec<u8>>,
}

impl Harness {
    /// Host holding a contract with `sectors` sectors.
    pub fn new(sectors: usize, config: RevisionConfig) -> Self {
        Self::with_settings(sectors, config, HostSettings::for_testing())
    }

    /// Same, with custom host settings.
    pub fn with_settings(sectors: usize, config: RevisionConfig, settings: HostSettings) -> Self {
        let mut rng = rand::thread_rng();
        let renter_key = SigningKey::generate(&mut rng);
        let host_secret = SigningKey::generate(&mut rng);

        let store = Arc::new(InMemoryObligationStore::new());
        let initial: Vec<Vec<u8>> = (0..sectors).map(|i| sector(i as u8 + 1)).collect();
        let roots: Vec<Hash> = initial.iter().map(|d| store.add_sector(d.clone())).collect();

        let revision = FileContractRevision {
            parent_id: CONTRACT_ID,
            unlock_conditions: UnlockConditions::two_party(
                public_key(&renter_key),
                public_key(&host_secret),
            ),
            revision_number: 1,
            file_size: roots.len() as u64 * TESTING_SECTOR_SIZE,
            file_merkle_root: contract_root(&roots),
            window_start: WINDOW_START,
            window_end: WINDOW_START + settings.window_size,
            renter_payout: Currency::from(1_000_000_000u64),
            host_payout: Currency::zero(),
            host_collateral: Currency::zero(),
            renter_address: [1u8; 32],
            host_address: [2u8; 32],
        };
        let txn = host_revision::sign_revision(
            revision.clone(),
            renter_signature(&revision, &renter_key),
            &host_secret,
            HEIGHT,
        )
        .expect("initial revision signs");
        store.insert_obligation(StorageObligation::new(
            revision,
            txn.transaction_signatures,
            roots,
        ));

        let host_key = public_key(&host_secret);
        let host = SharedHostState::new(settings, host_secret, HEIGHT);
        let service = Arc::new(HostRevisionService::new(
            config,
            host,
            store.clone(),
            store.clone(),
        ));

        Self {
            service,
            store,
            renter_key,
            host_key,
            initial,
        }
    }

    /// Start a host session on a fresh pipe.
    pub fn connect(&self) -> (Renter, JoinHandle<Result<SessionOutcome, SessionError>>) {
        let (host_io, renter_io) = tokio::io::duplex(1 << 20);
        let service = Arc::clone(&self.service);
        let handle = tokio::spawn(async move {
            let mut conn = StreamConn::new(host_io);
            service.serve(&mut conn).await
        });

        (self.renter(renter_io), handle)
    }

    /// Renter side of a pipe whose host end is served elsewhere.
    pub fn renter(&self, io: DuplexStream) -> Renter {
        let mut local = MockSectorStore::new();
        for data in &self.initial {
            local.add_sector(data.clone());
        }
        Renter {
            conn: StreamConn::new(io),
            key: self.renter_key.clone(),
            host_key: self.host_key,
            local,
            revision: None,
            roots: self
                .store
                .obligation(&CONTRACT_ID)
                .map(|so| so.sector_roots)
                .unwrap_or_default(),
        }
    }

    /// Host's stored obligation.
    pub fn obligation(&self) -> StorageObligation {
        self.store.obligation(&CONTRACT_ID).expect("obligation exists")
    }
}

/// Renter side of a session, scripted step by step.
pub struct Renter {
    pub conn: StreamConn<DuplexStream>,
    key: SigningKey,
    host_key: PublicKey,
    local: MockSectorStore,
    pub revision: Option<FileContractRevision>,
    pub roots: Vec<Hash>,
}

impl Renter {
    /// Name the contract.
    pub async fn send_contract_id(&mut self) -> Result<(), SessionError> {
        write_object(&mut self.conn, &CONTRACT_ID).await
    }

    /// Receive the latest revision.
    /// A lock or lookup failure arrives as a rejection instead.
    pub async fn read_recent(&mut self) -> Result<RecentRevision, SessionError> {
        let frame = self.conn.read_frame(16_000).await?;
        if let Ok(NegotiationResponse::Reject(reason)) = decode(&frame, 1_000) {
            return Err(SessionError::PeerRejected(reason));
        }
        let recent: RecentRevision = decode(&frame, 16_000)?;
        self.revision = Some(recent.revision.clone());
        Ok(recent)
    }

    /// Name the contract and receive the latest revision.
    pub async fn open(&mut self) -> Result<RecentRevision, SessionError> {
        self.send_contract_id().await?;
        self.read_recent().await
    }

    /// Receive and check the round's settings.
    pub async fn read_settings(&mut self) -> Result<HostSettings, SessionError> {
        let signed: SignedSettings = read_object(&mut self.conn, 16_000).await?;
        assert!(verify_settings(&signed, &self.host_key), "settings signature");
        Ok(signed.settings)
    }

    /// End the session after reading settings.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        self.read_settings().await?;
        write_stop(&mut self.conn).await
    }

    /// End the session when the settings were already read.
    pub async fn stop_after_settings(&mut self) -> Result<(), SessionError> {
        write_stop(&mut self.conn).await
    }

    /// Refuse the settings.
    pub async fn refuse(&mut self, reason: &str) -> Result<(), SessionError> {
        self.read_settings().await?;
        write_rejection(&mut self.conn, reason, 1_000).await
    }

    /// Run one honest round.
    pub async fn run_round(
        &mut self,
        modifications: Vec<Modification>,
    ) -> Result<TransactionSignature, SessionError> {
        self.run_round_with(modifications, |_| {}, |_| {}).await
    }

    /// Run one round, letting the caller alter the proposal and the renter
    /// signature before they are sent.
    pub async fn run_round_with(
        &mut self,
        modifications: Vec<Modification>,
        tamper_revision: impl FnOnce(&mut FileContractRevision),
        tamper_signature: impl FnOnce(&mut TransactionSignature),
    ) -> Result<TransactionSignature, SessionError> {
        let settings = self.read_settings().await?;
        write_accept(&mut self.conn).await?;

        let actions: Vec<RevisionAction> =
            modifications.iter().cloned().map(RevisionAction::from).collect();
        write_object(&mut self.conn, &actions).await?;

        let prior = self.revision.clone().expect("session opened");
        let ctx = ProcessingContext {
            settings: &settings,
            block_height: HEIGHT,
            proof_deadline: prior.window_start,
        };
        let outcome = process_modifications(&self.roots, &modifications, &ctx, &self.local)
            .await
            .expect("renter-side processing");

        let mut proposal = propose(&prior, &outcome, settings.sector_size);
        tamper_revision(&mut proposal);
        write_object(&mut self.conn, &proposal).await?;
        expect_accept(read_response(&mut self.conn, 1_000).await?);

        let mut signature = renter_signature(&proposal, &self.key);
        tamper_signature(&mut signature);
        write_object(&mut self.conn, &signature).await?;
        expect_accept(read_response(&mut self.conn, 1_000).await?);

        let host_signature: TransactionSignature = read_object(&mut self.conn, 16_000).await?;
        let txn = Transaction {
            file_contract_revisions: vec![proposal.clone()],
            transaction_signatures: vec![signature, host_signature.clone()],
        };
        txn.standalone_valid(HEIGHT).expect("countersigned revision is valid");

        for data in outcome.gained_sector_data {
            self.local.add_sector(data);
        }
        self.roots = outcome.new_roots;
        self.revision = Some(proposal);
        Ok(host_signature)
    }
}

fn expect_accept(response: NegotiationResponse) {
    assert_eq!(response, NegotiationResponse::Accept);
}

/// The revision an honest renter proposes after `outcome`.
pub fn propose(
    prior: &FileContractRevision,
    outcome: &BatchOutcome,
    sector_size: u64,
) -> FileContractRevision {
    let revenue = outcome.delta.storage_revenue + outcome.delta.bandwidth_revenue;
    FileContractRevision {
        revision_number: prior.revision_number + 1,
        file_size: outcome.new_roots.len() as u64 * sector_size,
        file_merkle_root: contract_root(&outcome.new_roots),
        renter_payout: prior.renter_payout - revenue,
        host_payout: prior.host_payout + revenue,
        host_collateral: prior.host_collateral + outcome.delta.collateral_risked,
        ..prior.clone()
    }
}
