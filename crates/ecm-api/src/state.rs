//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! The API crate carries the in-memory reference implementations of the
//! engine's collaborator seams:
//!
//! - [`ComplianceDataStore`] — the [`ReadinessData`] snapshot source plus
//!   the governance records (adoption configs, relaxations, approvals,
//!   opt-ins) and the classification/dashboard data.
//! - [`InMemoryPackStore`] — the [`PackStore`] persistence seam.
//! - [`QueueDispatcher`] — the [`RenderDispatcher`] seam; enqueued jobs
//!   are inspectable so an external runner (or a test acting as one) can
//!   drive the render callback.
//!
//! Locks are `parking_lot`, never held across `.await` points.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use ecm_classification::{BandTable, CategoryTable, ClassificationAssessment, NonComplianceRecord};
use ecm_core::{CompanyId, ComplianceYear, DocumentId, SiteId, TracingAuditSink};
use ecm_pack::{
    DispatchError, JobHandle, PackLifecycleManager, PackStore, RegulatoryPack, RenderDispatcher,
    RenderInputs, StoreError,
};
use ecm_readiness::{
    AssessmentStatus, DataError, DocumentStatus, ManifestError, ObligationStatus, PermitStatus,
    ReadinessData, ReadinessEngine, ReadinessRule, RemediationStatus, RuleSetManifest,
};
use ecm_safeguards::{
    BoardPackDetailRequest, CompanyAdoptionConfig, IncidentStatistics, IncidentSummary,
    RelaxedRule, TenderPackIncidentOptIn,
};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (`parking_lot::RwLock`, non-poisoning)
/// and the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Pack store ---------------------------------------------------------------

/// In-memory [`PackStore`] backed by the generic [`Store`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryPackStore {
    packs: Store<RegulatoryPack>,
}

impl PackStore for InMemoryPackStore {
    fn insert(&self, pack: &RegulatoryPack) -> Result<(), StoreError> {
        self.packs.insert(*pack.id.as_uuid(), pack.clone());
        Ok(())
    }

    fn get(&self, id: ecm_core::PackId) -> Result<Option<RegulatoryPack>, StoreError> {
        Ok(self.packs.get(id.as_uuid()))
    }

    fn replace(&self, pack: &RegulatoryPack) -> Result<(), StoreError> {
        self.packs.insert(*pack.id.as_uuid(), pack.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<RegulatoryPack>, StoreError> {
        Ok(self.packs.list())
    }
}

// -- Render dispatcher --------------------------------------------------------

/// In-memory [`RenderDispatcher`]: enqueued jobs accumulate in a queue
/// the external runner drains. Tests act as the runner and complete
/// packs through the render callback endpoint.
#[derive(Debug, Default)]
pub struct QueueDispatcher {
    queue: RwLock<Vec<(JobHandle, RenderInputs)>>,
}

impl QueueDispatcher {
    /// Jobs enqueued so far.
    pub fn pending(&self) -> Vec<(JobHandle, RenderInputs)> {
        self.queue.read().clone()
    }

    /// Number of enqueued jobs.
    pub fn len(&self) -> usize {
        self.queue.read().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RenderDispatcher for QueueDispatcher {
    fn enqueue_render(&self, inputs: RenderInputs) -> Result<JobHandle, DispatchError> {
        let handle = JobHandle {
            id: format!("render-{}", Uuid::new_v4()),
        };
        self.queue.write().push((handle.clone(), inputs));
        Ok(handle)
    }
}

// -- Compliance data ----------------------------------------------------------

/// In-memory snapshot data: the [`ReadinessData`] source plus the
/// governance and classification records the handlers read.
#[derive(Debug, Default)]
pub struct ComplianceDataStore {
    obligations: RwLock<Vec<ObligationStatus>>,
    remediations: RwLock<Vec<RemediationStatus>>,
    assessments: RwLock<Vec<ClassificationAssessment>>,
    documents: RwLock<Vec<DocumentStatus>>,
    permits: RwLock<Vec<PermitStatus>>,
    non_compliances: RwLock<Vec<NonComplianceRecord>>,
    adoption_configs: RwLock<HashMap<CompanyId, CompanyAdoptionConfig>>,
    relaxed_rules: RwLock<Vec<RelaxedRule>>,
    board_approvals: RwLock<HashMap<CompanyId, BoardPackDetailRequest>>,
    incident_opt_ins: RwLock<HashMap<CompanyId, TenderPackIncidentOptIn>>,
    incidents: RwLock<Vec<IncidentSummary>>,
}

impl ComplianceDataStore {
    /// Create an empty data store.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding (admin/ingestion surface) ───────────────────────────

    pub fn seed_obligation(&self, obligation: ObligationStatus) {
        self.obligations.write().push(obligation);
    }

    pub fn seed_remediation(&self, remediation: RemediationStatus) {
        self.remediations.write().push(remediation);
    }

    /// Record a scoring run. The newest run per site/year wins reads.
    pub fn seed_assessment(&self, assessment: ClassificationAssessment) {
        self.assessments.write().push(assessment);
    }

    pub fn seed_document(&self, document: DocumentStatus) {
        self.documents.write().push(document);
    }

    pub fn seed_permit(&self, permit: PermitStatus) {
        self.permits.write().push(permit);
    }

    pub fn seed_non_compliance(&self, record: NonComplianceRecord) {
        self.non_compliances.write().push(record);
    }

    pub fn set_adoption_config(&self, config: CompanyAdoptionConfig) {
        self.adoption_configs.write().insert(config.company_id, config);
    }

    pub fn seed_relaxed_rule(&self, relaxation: RelaxedRule) {
        self.relaxed_rules.write().push(relaxation);
    }

    pub fn set_board_approval(&self, approval: BoardPackDetailRequest) {
        self.board_approvals.write().insert(approval.company_id, approval);
    }

    pub fn set_incident_opt_in(&self, opt_in: TenderPackIncidentOptIn) {
        self.incident_opt_ins.write().insert(opt_in.company_id, opt_in);
    }

    pub fn seed_incident(&self, incident: IncidentSummary) {
        self.incidents.write().push(incident);
    }

    // ── Reads for handlers ──────────────────────────────────────────

    /// The company's adoption configuration, if any.
    pub fn adoption_for(&self, company_id: CompanyId) -> Option<CompanyAdoptionConfig> {
        self.adoption_configs.read().get(&company_id).cloned()
    }

    /// First-year relaxation overrides for a company.
    pub fn relaxations_for(&self, company_id: CompanyId) -> Vec<RelaxedRule> {
        self.relaxed_rules
            .read()
            .iter()
            .filter(|row| row.company_id == company_id)
            .cloned()
            .collect()
    }

    /// Standing board detail approval for a company.
    pub fn board_approval_for(&self, company_id: CompanyId) -> Option<BoardPackDetailRequest> {
        self.board_approvals.read().get(&company_id).cloned()
    }

    /// Standing tender incident opt-in for a company.
    pub fn incident_opt_in_for(&self, company_id: CompanyId) -> Option<TenderPackIncidentOptIn> {
        self.incident_opt_ins.read().get(&company_id).cloned()
    }

    /// Incident statistics over all seeded incidents.
    pub fn incident_statistics(&self) -> IncidentStatistics {
        IncidentStatistics::from_incidents(self.incidents.read().clone())
    }

    /// Latest assessment per selected site for a compliance year.
    pub fn assessments_for(
        &self,
        sites: &[SiteId],
        year: ComplianceYear,
    ) -> Vec<ClassificationAssessment> {
        let assessments = self.assessments.read();
        sites
            .iter()
            .filter_map(|site| {
                assessments
                    .iter()
                    .filter(|a| a.site_id == *site && a.compliance_year == year)
                    .max_by_key(|a| a.assessed_at)
                    .cloned()
            })
            .collect()
    }

    /// Non-compliance records for the selected sites and year.
    pub fn non_compliances_for(
        &self,
        sites: &[SiteId],
        year: ComplianceYear,
    ) -> Vec<NonComplianceRecord> {
        self.non_compliances
            .read()
            .iter()
            .filter(|r| r.compliance_year == year && sites.contains(&r.site_id))
            .cloned()
            .collect()
    }

    /// `(open, overdue)` corrective-action counts for the selected sites.
    pub fn remediation_counts(&self, sites: &[SiteId], as_of: DateTime<Utc>) -> (u32, u32) {
        let remediations = self.remediations.read();
        let open: Vec<_> = remediations
            .iter()
            .filter(|r| sites.contains(&r.site_id))
            .collect();
        let overdue = open
            .iter()
            .filter(|r| r.due_at.map(|due| due < as_of).unwrap_or(false))
            .count() as u32;
        (open.len() as u32, overdue)
    }
}

impl ReadinessData for ComplianceDataStore {
    fn active_obligations(&self, sites: &[SiteId]) -> Result<Vec<ObligationStatus>, DataError> {
        Ok(self
            .obligations
            .read()
            .iter()
            .filter(|o| sites.contains(&o.site_id))
            .cloned()
            .collect())
    }

    fn open_remediations(&self, sites: &[SiteId]) -> Result<Vec<RemediationStatus>, DataError> {
        Ok(self
            .remediations
            .read()
            .iter()
            .filter(|r| sites.contains(&r.site_id))
            .cloned()
            .collect())
    }

    fn latest_assessment(&self, site: SiteId) -> Result<Option<AssessmentStatus>, DataError> {
        Ok(self
            .assessments
            .read()
            .iter()
            .filter(|a| a.site_id == site)
            .max_by_key(|a| a.assessed_at)
            .map(|a| AssessmentStatus {
                site_id: a.site_id,
                assessed_at: a.assessed_at,
                band: a.band,
            }))
    }

    fn document_statuses(&self, documents: &[DocumentId]) -> Result<Vec<DocumentStatus>, DataError> {
        Ok(self
            .documents
            .read()
            .iter()
            .filter(|d| documents.contains(&d.id))
            .cloned()
            .collect())
    }

    fn site_permits(&self, sites: &[SiteId]) -> Result<Vec<PermitStatus>, DataError> {
        Ok(self
            .permits
            .read()
            .iter()
            .filter(|p| sites.contains(&p.site_id))
            .cloned()
            .collect())
    }
}

// -- App configuration and state ----------------------------------------------

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the server binds to.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: AppConfig,
    /// Snapshot + governance data.
    pub data: Arc<ComplianceDataStore>,
    /// The pack lifecycle manager (owns the readiness engine).
    pub lifecycle: Arc<PackLifecycleManager>,
    /// The render job queue, for runner/test inspection.
    pub dispatcher: Arc<QueueDispatcher>,
    /// Active readiness rules.
    pub rules: Arc<Vec<ReadinessRule>>,
    /// Risk-category points table.
    pub categories: Arc<CategoryTable>,
    /// Compliance band table.
    pub bands: Arc<BandTable>,
}

impl AppState {
    /// State over the compiled-in standard rule set.
    pub fn new() -> Self {
        Self::from_manifest(AppConfig::default(), RuleSetManifest::default_manifest())
            .expect("compiled-in standard manifest is valid")
    }

    /// State over a loaded rule-set manifest.
    pub fn from_manifest(
        config: AppConfig,
        manifest: RuleSetManifest,
    ) -> Result<Self, ManifestError> {
        let (rules, categories, bands) = manifest.into_parts()?;

        let data = Arc::new(ComplianceDataStore::new());
        let dispatcher = Arc::new(QueueDispatcher::default());
        let pack_store = Arc::new(InMemoryPackStore::default());
        let lifecycle = Arc::new(PackLifecycleManager::new(
            ReadinessEngine::new(),
            pack_store,
            dispatcher.clone(),
            Arc::new(TracingAuditSink),
        ));

        Ok(Self {
            config,
            data,
            lifecycle,
            dispatcher,
            rules: Arc::new(rules),
            categories: Arc::new(categories),
            bands: Arc::new(bands),
        })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
